//! Transport contract between the envelope client and the proxy.
//!
//! The transport moves bytes only. It never parses envelopes; the caller
//! decides what a body means.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use common::EnvelopeError;

/// HTTP methods the proxy accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`, optionally with a body.
    Get,
    /// `POST`.
    Post,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// What came back from the gateway, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// Upstream HTTP status code.
    pub status: u16,
    /// Upstream `Content-Type`, if any.
    pub content_type: Option<String>,
    /// Raw response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues one request against the gateway, through whatever sits in between.
///
/// Implementations return [`EnvelopeError::Transport`] when no gateway response
/// was obtained. Any gateway response, whatever its status, is `Ok`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    /// Send `body` (if any) to `path`, relative to the configured base URL.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<TransportResponse, EnvelopeError>;
}
