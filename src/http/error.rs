//! Dispatch errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::fallback::FallbackError;
use crate::http::response::json_error;

/// Boxed error returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler resolved to something other than a response.
    #[error("handler returned {found} instead of a response")]
    ContractViolation { found: &'static str },

    /// `data` was assigned something other than a JSON object.
    #[error("context data must be a JSON object, got {found}")]
    DataType { found: &'static str },

    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    #[error("fallback failed: {0}")]
    Fallback(#[from] FallbackError),

    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("invalid request url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build request: {0}")]
    Request(#[from] axum::http::Error),
}

impl DispatchError {
    /// Errors that signal a broken handler rather than a failed request.
    /// These are never converted into a fallback response.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DispatchError::ContractViolation { .. } | DispatchError::DataType { .. }
        )
    }

    /// Recover a `DispatchError` passed through a handler's `?`, or wrap a
    /// handler's own error.
    pub(crate) fn from_handler(err: BoxError) -> Self {
        match err.downcast::<DispatchError>() {
            Ok(err) => *err,
            Err(err) => DispatchError::Handler(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Body(_) | DispatchError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
            DispatchError::Fallback(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match status {
            StatusCode::BAD_REQUEST => "Solicitud inválida",
            StatusCode::BAD_GATEWAY => "Error al contactar el origen",
            _ => "Error interno del servidor",
        };
        json_error(status, message, Some(self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_from_handler_preserves_dispatch_errors() {
        let err: BoxError = Box::new(DispatchError::DataType { found: "array" });
        assert!(matches!(
            DispatchError::from_handler(err),
            DispatchError::DataType { found: "array" }
        ));

        let err: BoxError = Box::new(Boom);
        let wrapped = DispatchError::from_handler(err);
        assert!(matches!(wrapped, DispatchError::Handler(_)));
        assert!(!wrapped.is_fatal());
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(DispatchError::ContractViolation { found: "unit" }.is_fatal());
        assert!(DispatchError::DataType { found: "null" }.is_fatal());
    }
}
