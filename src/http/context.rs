//! Per-invocation handler context.

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use serde_json::{Map, Value};

use crate::http::driver::Chain;
use crate::http::error::DispatchError;
use crate::http::request::RequestInit;
use crate::routing::Params;

/// Everything a handler sees for one step of a request's chain.
///
/// `request` is a private copy; changing it does not affect later steps. Use
/// [`RequestContext::next_with`] to replace the request for the rest of the
/// chain.
pub struct RequestContext<E> {
    pub request: Request<Body>,
    /// Portion of the path matched by the step's mount (middleware) or route
    /// (terminal handler).
    pub function_path: String,
    pub params: Params,
    pub env: Arc<E>,
    chain: Arc<Chain<E>>,
}

impl<E: Send + Sync + 'static> RequestContext<E> {
    pub(crate) fn new(
        chain: Arc<Chain<E>>,
        request: Request<Body>,
        function_path: String,
        params: Params,
    ) -> Self {
        Self {
            request,
            function_path,
            params,
            env: Arc::clone(&chain.env),
            chain,
        }
    }

    /// Snapshot of the request-scoped data bag.
    pub fn data(&self) -> Map<String, Value> {
        self.chain.data.lock().expect("data mutex poisoned").clone()
    }

    /// Mutate the data bag in place. Visible to every later step.
    pub fn update_data<F>(&self, f: F)
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let mut data = self.chain.data.lock().expect("data mutex poisoned");
        f(&mut data);
    }

    /// Replace the data bag. Only JSON objects are accepted.
    pub fn set_data(&self, value: Value) -> Result<(), DispatchError> {
        let found = match value {
            Value::Object(map) => {
                *self.chain.data.lock().expect("data mutex poisoned") = map;
                return Ok(());
            }
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
        };
        Err(DispatchError::DataType { found })
    }

    /// Run the next step of the chain, or the fallback once none remain.
    ///
    /// The returned future owns the chain, so it can be awaited while the
    /// context is borrowed or moved.
    pub fn next(&self) -> impl Future<Output = Result<Response, DispatchError>> + Send + 'static {
        Arc::clone(&self.chain).advance()
    }

    /// Replace the in-flight request, then run the next step. `url` is
    /// resolved against the current request URL.
    pub fn next_with(
        &self,
        url: &str,
        init: RequestInit,
    ) -> impl Future<Output = Result<Response, DispatchError>> + Send + 'static {
        let replaced = self.chain.replace_request(url, init);
        let next = self.next();
        async move {
            replaced?;
            next.await
        }
    }

    /// Keep `task` running after the response is sent. Shutdown waits for it.
    pub fn wait_until<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.chain.tasks.spawn(task);
    }

    /// If a later error escapes the chain, serve the fallback instead.
    pub fn pass_through_on_exception(&self) {
        self.chain.fail_open.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{handler, Dispatcher, NotFound, SharedHandler};
    use crate::routing::{RouteEntry, RouteTable};
    use axum::http::{header, StatusCode};

    fn assert_send_static<T: Send + 'static>(_: &T) {}

    async fn wrap(ctx: RequestContext<()>) -> Result<Response, DispatchError> {
        let mut response = ctx.next().await?;
        response
            .headers_mut()
            .insert("x-wrapped", "yes".parse().unwrap());
        Ok(response)
    }

    async fn detach(ctx: RequestContext<()>) -> Result<Response, DispatchError> {
        let next = ctx.next_with("/elsewhere", RequestInit::default());
        assert_send_static(&next);
        drop(ctx);
        next.await
    }

    fn dispatcher(entries: Vec<RouteEntry<SharedHandler<()>>>) -> Dispatcher<()> {
        let table = Arc::new(RouteTable::new(entries).unwrap());
        Dispatcher::new(table, Arc::new(()), Arc::new(NotFound))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::HOST, "localhost")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_middleware_awaiting_next_is_a_handler() {
        let dispatcher = dispatcher(vec![RouteEntry::new("/", "/").middleware(handler(wrap))]);
        let response = dispatcher.fetch(get("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-wrapped"], "yes");
    }

    #[tokio::test]
    async fn test_next_future_outlives_the_context() {
        let dispatcher = dispatcher(vec![
            RouteEntry::new("/", "/").middleware(handler(detach)),
            RouteEntry::new("/", "/").middleware(handler(wrap)),
        ]);
        let response = dispatcher.fetch(get("/start")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-wrapped"], "yes");
    }

    #[tokio::test]
    async fn test_bad_next_with_url_fails_without_advancing() {
        async fn bad(ctx: RequestContext<()>) -> Result<Response, DispatchError> {
            ctx.next_with("http://[::1", RequestInit::default()).await
        }

        let dispatcher = dispatcher(vec![RouteEntry::new("/", "/").middleware(handler(bad))]);
        let err = dispatcher.fetch(get("/start")).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidUrl { .. }));
    }
}
