//! Catch-all `/api/*` router.
//!
//! Dispatches on the captured path segments for paths no dedicated route
//! took, e.g. methods the dedicated routes are not declared for.

use axum::response::Response;

use crate::functions::customers::{handle_collection, handle_item};
use crate::functions::{read_body, respond, segments, ApiError, AppEnv};
use crate::http::{DispatchError, RequestContext};

/// `/api/:path*`
pub async fn api_router(mut ctx: RequestContext<AppEnv>) -> Result<Response, DispatchError> {
    let method = ctx.request.method().clone();
    let path = segments(&ctx.params, "path");
    let body = match read_body(&mut ctx).await {
        Ok(body) => body,
        Err(e) => return respond(Err(e)),
    };

    let result = match path.as_slice() {
        [resource] if resource == "customers" => handle_collection(&ctx.env, &method, &body).await,
        [resource, rest @ ..] if resource == "customers" => {
            handle_item(&ctx.env, &method, rest, &body).await
        }
        _ => Err(ApiError::NotFound("Ruta no encontrada")),
    };
    respond(result)
}

#[cfg(test)]
mod tests {
    use crate::functions::testing::{dispatcher, json, request};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_api_path() {
        let dispatcher = dispatcher().await;
        let response = dispatcher
            .fetch(request(Method::GET, "/api/productos", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await, json!({ "error": "Ruta no encontrada" }));
    }

    #[tokio::test]
    async fn test_bare_api_root() {
        let dispatcher = dispatcher().await;
        let response = dispatcher
            .fetch(request(Method::GET, "/api", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
