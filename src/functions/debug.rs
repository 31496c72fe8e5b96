//! Diagnostic endpoint.

use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::functions::AppEnv;
use crate::http::{DispatchError, RequestContext};

/// `GET /api/debug`
pub async fn debug(ctx: RequestContext<AppEnv>) -> Result<Response, DispatchError> {
    let data = ctx.data();
    let body = json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "environment": ctx.env.environment,
        "request": {
            "url": ctx.request.uri().to_string(),
            "method": ctx.request.method().as_str(),
        },
        "context": {
            "hasEnv": true,
            "hasParams": !ctx.params.is_empty(),
            "hasData": !data.is_empty(),
            "functionPath": ctx.function_path,
            "data": Value::Object(data),
        },
        "message": "✅ API funcionando correctamente",
    });
    Ok(Json(body).into_response())
}

#[cfg(test)]
mod tests {
    use crate::functions::testing::{dispatcher, json, request};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_debug_reports_request() {
        let dispatcher = dispatcher().await;
        let response = dispatcher
            .fetch(request(Method::GET, "/api/debug?x=1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["environment"], "test");
        assert_eq!(body["request"]["url"], "http://localhost/api/debug?x=1");
        assert_eq!(body["request"]["method"], "GET");
        assert_eq!(body["context"]["functionPath"], "/api/debug");
        assert_eq!(body["message"], "✅ API funcionando correctamente");
    }
}
