//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::upstream::Upstream;

/// Application state shared across all request handlers.
///
/// Cheap to clone: the upstream client is pooled internally and the prefix is
/// behind an `Arc`.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Forwarder bound to the gateway base URL.
    pub upstream: Upstream,
    /// Path prefix the forwarding route is mounted under, e.g. `/api/gateway`.
    pub route_prefix: Arc<String>,
    /// Largest request body accepted for forwarding.
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create a new [`AppState`].
    pub fn new(upstream: Upstream, route_prefix: String, max_body_bytes: usize) -> Self {
        Self {
            upstream,
            route_prefix: Arc::new(route_prefix),
            max_body_bytes,
        }
    }
}
