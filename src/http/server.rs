//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router whose single fallback feeds the chain driver
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener and shut down gracefully
//! - Map errors escaping the chain to JSON responses

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::http::driver::Dispatcher;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::lifecycle::Shutdown;

/// Transport-level settings.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub request_timeout: Duration,
    pub max_body_size: usize,
    pub shutdown_grace: Duration,
}

impl ServerOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
            max_body_size: config.security.max_body_size,
            shutdown_grace: Duration::from_secs(config.timeouts.shutdown_grace_secs),
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// HTTP server for the admin API.
pub struct HttpServer<E> {
    router: Router,
    dispatcher: Dispatcher<E>,
    options: ServerOptions,
}

impl<E: Send + Sync + 'static> HttpServer<E> {
    pub fn new(dispatcher: Dispatcher<E>, options: ServerOptions) -> Self {
        let dispatcher = dispatcher.with_max_body_size(options.max_body_size);
        let router = Self::build_router(&options, dispatcher.clone());
        Self {
            router,
            dispatcher,
            options,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(options: &ServerOptions, dispatcher: Dispatcher<E>) -> Router {
        Router::new()
            .fallback(dispatch_handler::<E>)
            .with_state(dispatcher)
            .layer(RequestBodyLimitLayer::new(options.max_body_size))
            .layer(TimeoutLayer::new(options.request_timeout))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain background tasks.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Arc<Shutdown>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut stop = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await?;

        let abandoned = self
            .dispatcher
            .tasks()
            .drain(self.options.shutdown_grace)
            .await;
        tracing::info!(abandoned_tasks = abandoned, "HTTP server stopped");
        Ok(())
    }
}

/// Every request goes through the route table.
async fn dispatch_handler<E: Send + Sync + 'static>(
    State(dispatcher): State<Dispatcher<E>>,
    request: Request<Body>,
) -> Response {
    match dispatcher.fetch(request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}
