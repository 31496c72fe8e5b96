//! Login.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::functions::{parse_json, read_body, respond, ApiError, AppEnv};
use crate::http::{DispatchError, RequestContext};
use crate::security::verify_password;

const INVALID_CREDENTIALS: &str = "Credenciales inválidas";

#[derive(Debug, Default, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// `POST /api/auth/login`
pub async fn login(mut ctx: RequestContext<AppEnv>) -> Result<Response, DispatchError> {
    let result = async {
        let body = read_body(&mut ctx).await?;
        check_credentials(&ctx.env, parse_json(&body)?).await
    }
    .await;
    respond(result)
}

async fn check_credentials(env: &AppEnv, input: LoginRequest) -> Result<Response, ApiError> {
    let (email, password) = match (input.email, input.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => return Err(ApiError::BadRequest("Correo y contraseña son requeridos")),
    };

    let user = env
        .db
        .prepare("SELECT * FROM Usuarios WHERE email = ?")
        .bind(email.as_str())
        .first()
        .await?;

    let stored = user
        .as_ref()
        .and_then(|u| u.get("password_hash"))
        .and_then(|v| v.as_str());
    let valid =
        stored.is_some_and(|stored| verify_password(&password, stored, env.password_policy));

    if !valid {
        tracing::info!(email = %email, "Login rejected");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    tracing::info!(email = %email, "Login succeeded");
    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "message": "Inicio de sesión exitoso" })),
    )
        .into_response())
}
