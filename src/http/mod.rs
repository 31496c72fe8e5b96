//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout, body limit)
//!     → driver.rs (buffer request, start dispatch cursor)
//!     → handler.rs / context.rs (run each step; next() goes deeper)
//!     → fallback.rs (once no steps remain)
//!     → response.rs (strip null-body payloads)
//!     → Send to client
//! ```

pub mod context;
pub mod driver;
pub mod error;
pub mod fallback;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use context::RequestContext;
pub use driver::{Dispatcher, HandlerTable};
pub use error::{BoxError, DispatchError};
pub use fallback::{Fallback, FallbackError, FallbackFuture, NetworkFetch, NotFound, StaticAssets};
pub use handler::{handler, Handler, Reply, SharedHandler};
pub use request::{BufferedRequest, RequestInit, X_REQUEST_ID};
pub use server::{HttpServer, ServerOptions};
