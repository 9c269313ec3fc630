//! Opaque request forwarding to the gateway.
//!
//! Bodies pass through as bytes. The proxy never parses, re-encodes, or
//! inspects them; an envelope in is the same envelope out.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode, Uri};
use bytes::Bytes;
use common::http::{build_client, HttpClient};
use http_body_util::{BodyExt, Full};
use hyper::Request;
use thiserror::Error;
use tracing::debug;

/// Content type assumed when a request or upstream response carries none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Proxy-originated forwarding failures.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The target URI could not be built from the incoming path.
    #[error("invalid upstream uri: {0}")]
    InvalidUri(String),

    /// Connecting to, or reading from, the gateway failed.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// The gateway did not answer within the configured timeout.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    /// The incoming body was over the size limit or could not be read.
    #[error("request body rejected: {reason}")]
    BodyRejected { status: StatusCode, reason: String },
}

impl ForwardError {
    /// Status returned to the caller.
    ///
    /// 502 and 504 are also statuses a gateway behind its own load balancer
    /// can return. Only the marker header tells them apart.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::InvalidUri(_) => StatusCode::BAD_REQUEST,
            ForwardError::Unreachable(_) => StatusCode::BAD_GATEWAY,
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::BodyRejected { status, .. } => *status,
        }
    }

    /// Value of the proxy-error marker header.
    pub fn marker(&self) -> &'static str {
        match self {
            ForwardError::InvalidUri(_) => "bad_request",
            ForwardError::Unreachable(_) => "unreachable",
            ForwardError::Timeout(_) => "timeout",
            ForwardError::BodyRejected { status, .. }
                if *status == StatusCode::PAYLOAD_TOO_LARGE =>
            {
                "too_large"
            }
            ForwardError::BodyRejected { .. } => "bad_request",
        }
    }
}

/// What the gateway returned, ready to hand back verbatim.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    pub body: Bytes,
}

/// Pooled client bound to one gateway base URL.
#[derive(Clone)]
pub struct Upstream {
    client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl Upstream {
    /// Create a forwarder for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = build_client().context("failed to build upstream HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout,
        })
    }

    /// `{base_url}/{path}?{query}`.
    pub fn target(&self, path: &str, query: Option<&str>) -> String {
        let path = path.trim_start_matches('/');
        match query {
            Some(q) if !q.is_empty() => format!("{}/{path}?{q}", self.base_url),
            _ => format!("{}/{path}", self.base_url),
        }
    }

    /// Forward one request and collect the full upstream response.
    ///
    /// The timeout covers connecting, sending, and reading the whole body.
    ///
    /// # Errors
    ///
    /// See [`ForwardError`].
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        content_type: Option<HeaderValue>,
        body: Bytes,
    ) -> Result<UpstreamResponse, ForwardError> {
        let uri: Uri = self
            .target(path, query)
            .parse()
            .map_err(|e| ForwardError::InvalidUri(format!("{e}")))?;

        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                CONTENT_TYPE,
                content_type.unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
            )
            .body(Full::new(body))
            .map_err(|e| ForwardError::InvalidUri(e.to_string()))?;

        match tokio::time::timeout(self.timeout, self.round_trip(req)).await {
            Ok(result) => result,
            Err(_) => Err(ForwardError::Timeout(self.timeout)),
        }
    }

    async fn round_trip(&self, req: Request<Full<Bytes>>) -> Result<UpstreamResponse, ForwardError> {
        let resp = self
            .client
            .request(req)
            .await
            .map_err(|e| ForwardError::Unreachable(e.to_string()))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| ForwardError::Unreachable(e.to_string()))?
            .to_bytes();

        debug!(status = status.as_u16(), bytes = body.len(), "upstream responded");
        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream() -> Upstream {
        Upstream::new("http://127.0.0.1:8000/", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn target_joins_path_and_query() {
        let u = upstream();
        assert_eq!(u.target("api/query", None), "http://127.0.0.1:8000/api/query");
        assert_eq!(u.target("/api/query", Some("")), "http://127.0.0.1:8000/api/query");
        assert_eq!(
            u.target("api/stock-history/AAPL", Some("range=1y")),
            "http://127.0.0.1:8000/api/stock-history/AAPL?range=1y"
        );
    }

    #[test]
    fn error_statuses_and_markers() {
        let unreachable = ForwardError::Unreachable("refused".into());
        assert_eq!(unreachable.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(unreachable.marker(), "unreachable");

        let timeout = ForwardError::Timeout(Duration::from_secs(30));
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.marker(), "timeout");

        let too_large = ForwardError::BodyRejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            reason: "length limit exceeded".into(),
        };
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(too_large.marker(), "too_large");

        let truncated = ForwardError::BodyRejected {
            status: StatusCode::BAD_REQUEST,
            reason: "connection reset".into(),
        };
        assert_eq!(truncated.marker(), "bad_request");
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let u = Upstream::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        let err = u
            .forward(Method::POST, "api/query", None, None, Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::Unreachable(_)));
    }
}
