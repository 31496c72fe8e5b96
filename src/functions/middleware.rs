//! Site-wide CORS middleware.
//!
//! Preflight requests are answered directly; every other response gets the
//! CORS headers on its way back up the chain.

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::functions::AppEnv;
use crate::http::{DispatchError, RequestContext};

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

pub async fn cors(ctx: RequestContext<AppEnv>) -> Result<Response, DispatchError> {
    if ctx.request.method() == Method::OPTIONS {
        let mut response = StatusCode::OK.into_response();
        apply_cors(response.headers_mut());
        return Ok(response);
    }

    let mut response = ctx.next().await?;
    apply_cors(response.headers_mut());
    Ok(response)
}

#[cfg(test)]
mod tests {
    use crate::functions::testing::{dispatcher, request};
    use axum::http::{header, Method, StatusCode};

    #[tokio::test]
    async fn test_preflight_short_circuits() {
        let dispatcher = dispatcher().await;
        let response = dispatcher
            .fetch(request(Method::OPTIONS, "/api/customers", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type"
        );
    }

    #[tokio::test]
    async fn test_headers_added_to_handler_and_fallback_responses() {
        let dispatcher = dispatcher().await;
        for uri in ["/api/customers", "/index.html"] {
            let response = dispatcher
                .fetch(request(Method::GET, uri, None))
                .await
                .unwrap();
            assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        }
    }
}
