//! Response helpers.
//!
//! # Responsibilities
//! - Strip bodies from null-body statuses before responses travel up the chain
//! - Build the JSON error bodies used across the API
//!
//! # Design Decisions
//! - 101, 204, 205 and 304 never carry a body, whatever the handler set

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// True for statuses that must not carry a body.
pub fn is_null_body_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 101 | 204 | 205 | 304)
}

/// Replace the body of a null-body-status response with an empty one.
pub fn normalize_bodiless(response: Response) -> Response {
    if !is_null_body_status(response.status()) {
        return response;
    }
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::empty())
}

/// `{"error": message}` or `{"error": message, "details": details}`.
pub fn json_error(status: StatusCode, message: &str, details: Option<String>) -> Response {
    let body = match details {
        Some(details) => json!({ "error": message, "details": details }),
        None => json!({ "error": message }),
    };
    (status, Json(body)).into_response()
}
