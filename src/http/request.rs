//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate and propagate a unique request ID (UUID v4)
//! - Buffer the incoming request so every handler can get its own copy
//! - Build replacement requests for `next_with`
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is read once, bounded by the configured limit
//! - URLs are absolute so relative `next_with` targets resolve like a browser

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, Method, Request, Version};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use url::Url;

use crate::http::error::DispatchError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer that assigns an `x-request-id` when the client sent none.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeRequestUuid)
}

/// Layer that copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// The request ID header value, or "unknown".
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Options for a replacement request, mirroring a fetch `RequestInit`.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    /// Defaults to GET.
    pub method: Option<Method>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RequestInit {
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header(mut self, name: HeaderName, value: axum::http::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A fully buffered request that can be copied for each handler.
#[derive(Debug, Clone)]
pub struct BufferedRequest {
    pub method: Method,
    pub url: Url,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl BufferedRequest {
    /// Read `request` into memory. Bodies larger than `limit` are rejected.
    pub async fn read(request: Request<Body>, limit: usize) -> Result<Self, DispatchError> {
        let (parts, body) = request.into_parts();
        let url = absolute_url(&parts.uri, &parts.headers)?;
        let body = axum::body::to_bytes(body, limit)
            .await
            .map_err(DispatchError::Body)?;

        Ok(Self {
            method: parts.method,
            url,
            version: parts.version,
            headers: parts.headers,
            body,
        })
    }

    /// A new request for `url` built from `init`.
    pub fn from_init(url: Url, init: RequestInit) -> Self {
        Self {
            method: init.method.unwrap_or(Method::GET),
            url,
            version: Version::HTTP_11,
            headers: init.headers,
            body: init.body.unwrap_or_default(),
        }
    }

    /// Resolve `target` against this request's URL.
    pub fn resolve(&self, target: &str) -> Result<Url, DispatchError> {
        self.url.join(target).map_err(|source| DispatchError::InvalidUrl {
            url: target.to_string(),
            source,
        })
    }

    /// A fresh `Request` carrying a copy of this request.
    pub fn to_request(&self) -> Result<Request<Body>, DispatchError> {
        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(self.url.as_str())
            .version(self.version);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers.clone());
        }
        Ok(builder.body(Body::from(self.body.clone()))?)
    }
}

fn absolute_url(uri: &axum::http::Uri, headers: &HeaderMap) -> Result<Url, DispatchError> {
    let raw = if uri.scheme().is_some() {
        uri.to_string()
    } else {
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
        format!("http://{}{}", host, path)
    };

    Url::parse(&raw).map_err(|source| DispatchError::InvalidUrl { url: raw, source })
}
