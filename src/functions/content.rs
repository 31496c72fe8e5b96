//! Public site content, looked up by domain.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Map, Value};

use crate::functions::{respond, ApiError, AppEnv};
use crate::http::{DispatchError, RequestContext};

/// `GET /api/public/content?domain=<host>`
///
/// Answers `{clave: valor, ...}` for every content entry of the site.
pub async fn public_content(ctx: RequestContext<AppEnv>) -> Result<Response, DispatchError> {
    let domain = ctx.request.uri().query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "domain")
            .map(|(_, value)| value.into_owned())
    });
    respond(lookup(&ctx.env, domain.as_deref()).await)
}

async fn lookup(env: &AppEnv, domain: Option<&str>) -> Result<Response, ApiError> {
    let domain = match domain {
        Some(domain) if !domain.is_empty() => domain,
        _ => return Err(ApiError::BadRequest("Dominio no especificado")),
    };

    let site = env
        .db
        .prepare("SELECT id FROM SitiosWeb WHERE dominio = ?")
        .bind(domain)
        .first()
        .await?;
    let Some(site_id) = site.as_ref().and_then(|s| s.get("id")).and_then(Value::as_i64) else {
        return Err(ApiError::NotFound("Sitio no encontrado"));
    };

    let entries = env
        .db
        .prepare("SELECT clave, valor FROM ContenidoWeb WHERE sitio_id = ?")
        .bind(site_id)
        .all()
        .await?;

    let content: Map<String, Value> = entries
        .into_iter()
        .filter_map(|mut row| {
            let key = row.get("clave")?.as_str()?.to_string();
            Some((key, row.remove("valor").unwrap_or(Value::Null)))
        })
        .collect();

    tracing::debug!(domain, entries = content.len(), "Public content served");
    Ok((
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(Value::Object(content)),
    )
        .into_response())
}
