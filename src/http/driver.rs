//! Chain driver.
//!
//! # Responsibilities
//! - Buffer the request and start a dispatch cursor for it
//! - Invoke each step's handler with a fresh context
//! - Serve the fallback once the cursor is exhausted
//! - Apply pass-through-on-exception at the top of the chain
//!
//! # Design Decisions
//! - All per-request state lives in one `Chain` shared by every context of
//!   that request; locks are never held across an await
//! - Handlers call `next()` to go deeper, so post-processing in middleware
//!   runs in reverse order as the responses return
//! - Contract and data-type violations always escape; pass-through only
//!   covers ordinary handler and fallback failures

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use crate::http::context::RequestContext;
use crate::http::error::DispatchError;
use crate::http::fallback::Fallback;
use crate::http::handler::{Reply, SharedHandler};
use crate::http::request::{request_id, BufferedRequest, RequestInit};
use crate::http::response::normalize_bodiless;
use crate::lifecycle::BackgroundTasks;
use crate::observability::metrics;
use crate::routing::{Dispatch, RouteTable};

/// Default request body limit.
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Route table type used by the driver.
pub type HandlerTable<E> = RouteTable<SharedHandler<E>>;

/// Entry point that turns a request into a response through the route table.
pub struct Dispatcher<E> {
    table: Arc<HandlerTable<E>>,
    env: Arc<E>,
    fallback: Arc<dyn Fallback>,
    tasks: Arc<BackgroundTasks>,
    max_body_size: usize,
}

impl<E> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            env: Arc::clone(&self.env),
            fallback: Arc::clone(&self.fallback),
            tasks: Arc::clone(&self.tasks),
            max_body_size: self.max_body_size,
        }
    }
}

impl<E: Send + Sync + 'static> Dispatcher<E> {
    pub fn new(table: Arc<HandlerTable<E>>, env: Arc<E>, fallback: Arc<dyn Fallback>) -> Self {
        Self {
            table,
            env,
            fallback,
            tasks: Arc::new(BackgroundTasks::new()),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn with_max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    /// Share a task tracker, typically the one drained at shutdown.
    pub fn with_tasks(mut self, tasks: Arc<BackgroundTasks>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn env(&self) -> &Arc<E> {
        &self.env
    }

    pub fn tasks(&self) -> &Arc<BackgroundTasks> {
        &self.tasks
    }

    /// Run the chain for `request`.
    pub async fn fetch(&self, request: Request<Body>) -> Result<Response, DispatchError> {
        let start = Instant::now();
        let request_id = request_id(request.headers()).to_string();
        let request = BufferedRequest::read(request, self.max_body_size).await?;
        let method = request.method.clone();
        let path = request.url.path().to_string();

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            "Dispatching request"
        );

        let chain = Arc::new(Chain {
            steps: Mutex::new(self.table.dispatch(&method, &path)),
            request: Mutex::new(request),
            data: Mutex::new(Map::new()),
            fail_open: AtomicBool::new(false),
            env: Arc::clone(&self.env),
            fallback: Arc::clone(&self.fallback),
            tasks: Arc::clone(&self.tasks),
        });

        let result = match Arc::clone(&chain).advance().await {
            Err(err) if !err.is_fatal() && chain.fail_open.load(Ordering::SeqCst) => {
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    error = %err,
                    "Handler failed, passing through to fallback"
                );
                metrics::record_pass_through();
                chain.serve_fallback().await
            }
            other => other,
        };

        match &result {
            Ok(response) => {
                metrics::record_request(method.as_str(), response.status().as_u16(), start)
            }
            Err(err) => {
                tracing::error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    error = %err,
                    "Request failed"
                );
                metrics::record_request(method.as_str(), err.status().as_u16(), start);
            }
        }
        result
    }
}

/// State shared by every step of one request.
pub(crate) struct Chain<E> {
    steps: Mutex<Dispatch<SharedHandler<E>>>,
    request: Mutex<BufferedRequest>,
    pub(crate) data: Mutex<Map<String, Value>>,
    pub(crate) fail_open: AtomicBool,
    pub(crate) env: Arc<E>,
    fallback: Arc<dyn Fallback>,
    pub(crate) tasks: Arc<BackgroundTasks>,
}

impl<E: Send + Sync + 'static> Chain<E> {
    /// Run the next step, or the fallback when the cursor is exhausted.
    pub(crate) fn advance(self: Arc<Self>) -> BoxFuture<'static, Result<Response, DispatchError>> {
        Box::pin(async move {
            let step = self.steps.lock().expect("dispatch cursor mutex poisoned").next();
            let Some(step) = step else {
                return self.serve_fallback().await;
            };

            let request = self.current_request().to_request()?;
            let ctx = RequestContext::new(Arc::clone(&self), request, step.path, step.params);

            match step.handler.call(ctx).await {
                Ok(Reply::Response(response)) => Ok(normalize_bodiless(response)),
                Ok(Reply::NotAResponse(found)) => Err(DispatchError::ContractViolation { found }),
                Err(err) => Err(DispatchError::from_handler(err)),
            }
        })
    }

    pub(crate) fn replace_request(
        &self,
        url: &str,
        init: RequestInit,
    ) -> Result<(), DispatchError> {
        let mut request = self.request.lock().expect("request mutex poisoned");
        let resolved = request.resolve(url)?;
        *request = BufferedRequest::from_init(resolved, init);
        Ok(())
    }

    fn current_request(&self) -> BufferedRequest {
        self.request.lock().expect("request mutex poisoned").clone()
    }

    async fn serve_fallback(&self) -> Result<Response, DispatchError> {
        let request = self.current_request().to_request()?;
        let response = self.fallback.fetch(request).await?;
        Ok(normalize_bodiless(response))
    }
}
