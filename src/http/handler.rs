//! Handler contract.
//!
//! Any `async fn(RequestContext<E>) -> Result<R, Err>` is a handler when `R`
//! converts into a [`Reply`] and `Err` into a boxed error. Returning anything
//! but a response is accepted by the type system and rejected at dispatch
//! time as a contract violation.

use std::future::Future;
use std::sync::Arc;

use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::http::context::RequestContext;
use crate::http::error::BoxError;

/// What a handler resolved to.
#[derive(Debug)]
pub enum Reply {
    Response(Response),
    /// A non-response value; names what was returned.
    NotAResponse(&'static str),
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::NotAResponse("nothing")
    }
}

impl From<serde_json::Value> for Reply {
    fn from(_: serde_json::Value) -> Self {
        Reply::NotAResponse("a JSON value")
    }
}

impl From<String> for Reply {
    fn from(_: String) -> Self {
        Reply::NotAResponse("a string")
    }
}

impl From<Option<Response>> for Reply {
    fn from(response: Option<Response>) -> Self {
        match response {
            Some(response) => Reply::Response(response),
            None => Reply::NotAResponse("nothing"),
        }
    }
}

pub trait Handler<E>: Send + Sync + 'static {
    fn call(&self, ctx: RequestContext<E>) -> BoxFuture<'static, Result<Reply, BoxError>>;
}

impl<E, F, Fut, R, Er> Handler<E> for F
where
    E: Send + Sync + 'static,
    F: Fn(RequestContext<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Er>> + Send + 'static,
    R: Into<Reply>,
    Er: Into<BoxError>,
{
    fn call(&self, ctx: RequestContext<E>) -> BoxFuture<'static, Result<Reply, BoxError>> {
        let fut = (self)(ctx);
        Box::pin(async move { fut.await.map(Into::into).map_err(Into::into) })
    }
}

/// Shared handler as stored in the route table.
pub type SharedHandler<E> = Arc<dyn Handler<E>>;

/// Wrap a handler for the route table.
pub fn handler<E, H>(h: H) -> SharedHandler<E>
where
    H: Handler<E>,
{
    Arc::new(h)
}
