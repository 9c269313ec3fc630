//! Request span construction for the trace layer.

use axum::{body::Body, http::Request};
use tracing::{info_span, Span};
use uuid::Uuid;

/// Root span for one request, tagged with a fresh `request_id`.
///
/// Only the path is recorded; query strings are left out.
pub fn make_request_span(req: &Request<Body>) -> Span {
    info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %req.method(),
        path = %req.uri().path(),
    )
}
