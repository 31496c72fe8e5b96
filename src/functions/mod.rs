//! Application route table and handlers.
//!
//! # Routes (declaration order)
//! ```text
//! POST /api/auth/login          → auth::login
//! GET  /api/public/content      → content::public_content
//! *    /api/customers           → customers::collection
//! *    /api/customers/:id*      → customers::item
//! GET  /api/debug               → debug::debug
//! *    /api/:path*              → catch_all::api_router
//! *    /   (middleware)         → middleware::cors
//! ```
//!
//! # Design Decisions
//! - `/api/customers` is declared before `/api/customers/:id*` so the
//!   collection is not swallowed by the optional id
//! - Handlers never let an application error escape: they answer with a
//!   JSON error body instead

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::schema::RoutingConfig;
use crate::db::{Database, DbError};
use crate::http::response::json_error;
use crate::http::{handler, DispatchError, HandlerTable, RequestContext, SharedHandler};
use crate::routing::{
    ParamValue, Params, PatternCache, PatternError, PatternOptions, RouteEntry, RouteTable,
};
use crate::security::LegacyPolicy;

pub mod auth;
pub mod catch_all;
pub mod content;
pub mod customers;
pub mod debug;
pub mod middleware;

/// Bindings every handler receives as `ctx.env`.
#[derive(Debug, Clone)]
pub struct AppEnv {
    pub db: Database,
    /// Deployment name reported by the debug endpoint.
    pub environment: String,
    pub password_policy: LegacyPolicy,
}

/// Errors a handler answers with instead of propagating.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Método no permitido")]
    MethodNotAllowed,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Db(_) | ApiError::Json(_) | ApiError::Body(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Handler failed");
            json_error(status, "Error interno del servidor", Some(self.to_string()))
        } else {
            json_error(status, &self.to_string(), None)
        }
    }
}

/// Turn an application result into the handler contract.
pub(crate) fn respond(result: Result<Response, ApiError>) -> Result<Response, DispatchError> {
    Ok(result.unwrap_or_else(IntoResponse::into_response))
}

/// Take the request body out of the context.
pub(crate) async fn read_body(ctx: &mut RequestContext<AppEnv>) -> Result<Bytes, ApiError> {
    let body = std::mem::take(ctx.request.body_mut());
    Ok(axum::body::to_bytes(body, usize::MAX).await?)
}

/// Decode a JSON body. An empty body decodes as an empty object.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_str("{}")?);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Segments captured by a repeated parameter. Absent parameters yield none.
pub(crate) fn segments(params: &Params, name: &str) -> Vec<String> {
    match params.get(name) {
        Some(ParamValue::Repeated(values)) => values.clone(),
        Some(ParamValue::Single(value)) => vec![value.clone()],
        None => Vec::new(),
    }
}

/// The application's routes, in declaration order.
pub fn routes() -> Vec<RouteEntry<SharedHandler<AppEnv>>> {
    vec![
        RouteEntry::new("/api/auth/login", "/api/auth")
            .method(Method::POST)
            .module(handler(auth::login)),
        RouteEntry::new("/api/public/content", "/api/public")
            .method(Method::GET)
            .module(handler(content::public_content)),
        RouteEntry::new("/api/customers", "/api/customers").module(handler(customers::collection)),
        RouteEntry::new("/api/customers/:id*", "/api/customers").module(handler(customers::item)),
        RouteEntry::new("/api/debug", "/api")
            .method(Method::GET)
            .module(handler(debug::debug)),
        RouteEntry::new("/api/:path*", "/api").module(handler(catch_all::api_router)),
        RouteEntry::new("/", "/").middleware(handler(middleware::cors)),
    ]
}

/// Compile the route table with the configured matching options.
pub fn build_table(config: &RoutingConfig) -> Result<Arc<HandlerTable<AppEnv>>, PatternError> {
    let options = PatternOptions::default()
        .sensitive(config.sensitive)
        .strict(config.strict);
    let table = RouteTable::compile(routes(), &options, &PatternCache::new())?;
    tracing::info!(routes = table.len(), "Route table compiled");
    Ok(Arc::new(table))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_compile() {
        let table = build_table(&RoutingConfig::default()).unwrap();
        assert_eq!(table.len(), 7);
    }

    #[test]
    fn test_parse_json_empty_body() {
        let value: serde_json::Value = parse_json(b"  ").unwrap();
        assert_eq!(value, serde_json::json!({}));
        assert!(parse_json::<serde_json::Value>(b"{oops").is_err());
    }

    #[test]
    fn test_api_error_statuses() {
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ApiError::BadRequest("x").into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
