//! Axum request handlers.

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{HealthResponse, ProxyErrorResponse, PROXY_ERROR_HEADER};
use tracing::{info, warn};

use super::state::AppState;
use crate::upstream::ForwardError;

/// `GET|POST {prefix}/*path`: forward the request to the gateway untouched.
///
/// Upstream status, content type, and body come back verbatim. Failures that
/// originate here carry the `x-proxy-error` header so they can never be
/// mistaken for a gateway response. That includes a body over the size
/// limit, which comes back as 413 with `x-proxy-error: too_large`.
pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            return proxy_failure(ForwardError::BodyRejected {
                status: rejection.status(),
                reason: rejection.body_text(),
            })
        }
    };
    let path = uri
        .path()
        .strip_prefix(state.route_prefix.as_str())
        .unwrap_or_default();
    let content_type = headers.get(CONTENT_TYPE).cloned();
    let request_bytes = body.len();

    match state
        .upstream
        .forward(method, path, uri.query(), content_type, body)
        .await
    {
        Ok(up) => {
            info!(
                status = up.status.as_u16(),
                request_bytes,
                response_bytes = up.body.len(),
                "forwarded"
            );
            let mut resp = Response::new(Body::from(up.body));
            *resp.status_mut() = up.status;
            resp.headers_mut().insert(CONTENT_TYPE, up.content_type);
            resp
        }
        Err(e) => proxy_failure(e),
    }
}

fn proxy_failure(e: ForwardError) -> Response {
    warn!(marker = e.marker(), error = %e, "forwarding failed");
    let mut resp = (
        e.status(),
        Json(ProxyErrorResponse::new("proxy request failed")),
    )
        .into_response();
    resp.headers_mut()
        .insert(PROXY_ERROR_HEADER, HeaderValue::from_static(e.marker()));
    resp
}

/// `GET /health`: liveness check.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ProxyErrorResponse::new("not found")),
    )
}
