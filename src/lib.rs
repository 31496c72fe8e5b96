//! Customers admin service library.
//!
//! A file-routed request dispatcher (pattern matching, middleware chains,
//! pass-through fallbacks) and the customer administration API built on it.

pub mod config;
pub mod db;
pub mod functions;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::AppConfig;
pub use functions::AppEnv;
pub use http::{Dispatcher, HttpServer, RequestContext};
pub use lifecycle::Shutdown;
