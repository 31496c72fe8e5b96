//! Fallback collaborators.
//!
//! # Responsibilities
//! - Serve requests that no route handles (or that pass through on error)
//! - Static assets from disk, forwarding to an upstream origin, or plain 404
//!
//! # Design Decisions
//! - One trait object chosen at startup from configuration
//! - The network fallback forwards a single attempt; no retries

use std::path::Path;
use std::str::FromStr;

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{header, HeaderValue, Request, StatusCode, Uri};
use axum::response::Response;
use futures_util::future::BoxFuture;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::config::schema::{FallbackConfig, FallbackKind};
use crate::http::response::json_error;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("invalid upstream uri: {0}")]
    Uri(String),
}

/// Serves a request the route table did not.
pub trait Fallback: Send + Sync + 'static {
    fn fetch(&self, request: Request<Body>) -> FallbackFuture;
}

pub type FallbackFuture = BoxFuture<'static, Result<Response, FallbackError>>;

/// Build the configured fallback.
pub fn from_config(config: &FallbackConfig) -> Result<Box<dyn Fallback>, FallbackError> {
    Ok(match config.kind {
        FallbackKind::Assets => Box::new(StaticAssets::new(&config.assets_dir)),
        FallbackKind::Network => {
            let upstream = config
                .upstream
                .as_deref()
                .ok_or_else(|| FallbackError::Uri("network fallback requires an upstream".into()))?;
            Box::new(NetworkFetch::new(upstream)?)
        }
        FallbackKind::NotFound => Box::new(NotFound),
    })
}

/// Files under a directory, with `index.html` for directories.
#[derive(Clone)]
pub struct StaticAssets {
    service: ServeDir,
}

impl StaticAssets {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            service: ServeDir::new(dir).append_index_html_on_directories(true),
        }
    }
}

impl Fallback for StaticAssets {
    fn fetch(&self, request: Request<Body>) -> FallbackFuture {
        let service = self.service.clone();
        Box::pin(async move {
            metrics::record_fallback("assets");
            let response = match service.oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            };
            Ok(response.map(Body::new))
        })
    }
}

/// Forwards to an upstream origin. The origin must not be this server, or
/// every unrouted request loops back through it.
#[derive(Clone)]
pub struct NetworkFetch {
    client: Client<HttpConnector, Body>,
    scheme: Scheme,
    authority: Authority,
}

impl NetworkFetch {
    pub fn new(upstream: &str) -> Result<Self, FallbackError> {
        let uri = Uri::from_str(upstream).map_err(|e| FallbackError::Uri(e.to_string()))?;
        let parts = uri.into_parts();
        let (Some(scheme), Some(authority)) = (parts.scheme, parts.authority) else {
            return Err(FallbackError::Uri(format!("{upstream:?} is not an origin")));
        };

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self {
            client,
            scheme,
            authority,
        })
    }

    fn rewrite(&self, request: &mut Request<Body>) -> Result<(), FallbackError> {
        let mut parts = request.uri().clone().into_parts();
        parts.scheme = Some(self.scheme.clone());
        parts.authority = Some(self.authority.clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        *request.uri_mut() =
            Uri::from_parts(parts).map_err(|e| FallbackError::Uri(e.to_string()))?;

        if let Ok(host) = HeaderValue::from_str(self.authority.as_str()) {
            request.headers_mut().insert(header::HOST, host);
        }
        Ok(())
    }
}

impl Fallback for NetworkFetch {
    fn fetch(&self, mut request: Request<Body>) -> FallbackFuture {
        let client = self.client.clone();
        let rewritten = self.rewrite(&mut request);
        Box::pin(async move {
            rewritten?;
            metrics::record_fallback("network");
            tracing::debug!(uri = %request.uri(), "Forwarding to upstream");

            let response = client.request(request).await?;
            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, Body::new(body)))
        })
    }
}

/// Always `404 {"error": "Ruta no encontrada"}`.
#[derive(Debug, Clone, Copy)]
pub struct NotFound;

impl Fallback for NotFound {
    fn fetch(&self, _request: Request<Body>) -> FallbackFuture {
        Box::pin(async {
            metrics::record_fallback("not_found");
            Ok(json_error(StatusCode::NOT_FOUND, "Ruta no encontrada", None))
        })
    }
}
