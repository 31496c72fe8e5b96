//! Customer records.
//!
//! # Responsibilities
//! - List and create customers on the collection route
//! - Read, update and delete a single customer by id
//!
//! # Design Decisions
//! - The same operations back the catch-all `/api/*` router
//! - Timestamps are stored as RFC 3339 strings with millisecond precision
//! - An update that touches no row answers 404; a delete always answers 204

use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::functions::{parse_json, read_body, respond, segments, ApiError, AppEnv};
use crate::http::{DispatchError, RequestContext};

const FIELDS_REQUIRED: &str = "El nombre y el email son requeridos";
const NOT_FOUND: &str = "Cliente no encontrado";
const ID_MISSING: &str = "ID de cliente no proporcionado";

#[derive(Debug, Default, Deserialize)]
struct CustomerInput {
    #[serde(default)]
    nombre: Option<String>,
    #[serde(default)]
    email_contacto: Option<String>,
}

impl CustomerInput {
    /// Both fields, non-empty.
    fn required(self) -> Result<(String, String), ApiError> {
        match (self.nombre, self.email_contacto) {
            (Some(nombre), Some(email)) if !nombre.is_empty() && !email.is_empty() => {
                Ok((nombre, email))
            }
            _ => Err(ApiError::BadRequest(FIELDS_REQUIRED)),
        }
    }
}

/// `/api/customers`
pub async fn collection(mut ctx: RequestContext<AppEnv>) -> Result<Response, DispatchError> {
    let method = ctx.request.method().clone();
    let body = match read_body(&mut ctx).await {
        Ok(body) => body,
        Err(e) => return respond(Err(e)),
    };
    respond(handle_collection(&ctx.env, &method, &body).await)
}

/// `/api/customers/:id*`
pub async fn item(mut ctx: RequestContext<AppEnv>) -> Result<Response, DispatchError> {
    let method = ctx.request.method().clone();
    let ids = segments(&ctx.params, "id");
    let body = match read_body(&mut ctx).await {
        Ok(body) => body,
        Err(e) => return respond(Err(e)),
    };
    respond(handle_item(&ctx.env, &method, &ids, &body).await)
}

pub(crate) async fn handle_collection(
    env: &AppEnv,
    method: &Method,
    body: &Bytes,
) -> Result<Response, ApiError> {
    match *method {
        Method::GET => list(env).await,
        Method::POST => create(env, parse_json(body)?).await,
        _ => Err(ApiError::MethodNotAllowed),
    }
}

/// `ids` holds the path segments after the collection; only a single
/// segment names a customer.
pub(crate) async fn handle_item(
    env: &AppEnv,
    method: &Method,
    ids: &[String],
    body: &Bytes,
) -> Result<Response, ApiError> {
    let id = match ids {
        [] => return Err(ApiError::BadRequest(ID_MISSING)),
        [id] if !id.is_empty() => id.as_str(),
        [_] => return Err(ApiError::BadRequest(ID_MISSING)),
        _ => return Err(ApiError::NotFound("Ruta no encontrada")),
    };

    match *method {
        Method::GET => fetch(env, id).await,
        Method::PUT => update(env, id, parse_json(body)?).await,
        Method::DELETE => remove(env, id).await,
        _ => Err(ApiError::MethodNotAllowed),
    }
}

async fn list(env: &AppEnv) -> Result<Response, ApiError> {
    let rows = env
        .db
        .prepare("SELECT * FROM Clientes ORDER BY fecha_creacion DESC, id DESC")
        .all()
        .await?;
    let rows: Vec<Value> = rows.into_iter().map(Value::Object).collect();
    Ok(Json(rows).into_response())
}

async fn create(env: &AppEnv, input: CustomerInput) -> Result<Response, ApiError> {
    let (nombre, email) = input.required()?;
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let result = env
        .db
        .prepare("INSERT INTO Clientes (nombre, email_contacto, fecha_creacion) VALUES (?, ?, ?)")
        .bind(nombre.as_str())
        .bind(email.as_str())
        .bind(created_at.as_str())
        .run()
        .await?;

    tracing::info!(id = result.meta.last_row_id, "Customer created");
    let body = json!({
        "id": result.meta.last_row_id,
        "nombre": nombre,
        "email_contacto": email,
        "fecha_creacion": created_at,
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn fetch(env: &AppEnv, id: &str) -> Result<Response, ApiError> {
    let row = env
        .db
        .prepare("SELECT * FROM Clientes WHERE id = ?")
        .bind(id)
        .first()
        .await?;
    match row {
        Some(row) => Ok(Json(Value::Object(row)).into_response()),
        None => Err(ApiError::NotFound(NOT_FOUND)),
    }
}

async fn update(env: &AppEnv, id: &str, input: CustomerInput) -> Result<Response, ApiError> {
    let (nombre, email) = input.required()?;
    let result = env
        .db
        .prepare("UPDATE Clientes SET nombre = ?, email_contacto = ? WHERE id = ?")
        .bind(nombre.as_str())
        .bind(email.as_str())
        .bind(id)
        .run()
        .await?;
    if result.meta.changes == 0 {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    tracing::info!(id, "Customer updated");
    Ok(Json(json!({ "id": id, "nombre": nombre, "email_contacto": email })).into_response())
}

async fn remove(env: &AppEnv, id: &str) -> Result<Response, ApiError> {
    let result = env
        .db
        .prepare("DELETE FROM Clientes WHERE id = ?")
        .bind(id)
        .run()
        .await?;
    tracing::info!(id, removed = result.meta.changes, "Customer deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
