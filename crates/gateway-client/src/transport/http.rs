//! [`HttpTransport`]: the production [`GatewayTransport`] over hyper.

use async_trait::async_trait;
use bytes::Bytes;
use common::{
    http::{build_client, HttpClient},
    protocol::PROXY_ERROR_HEADER,
    EnvelopeError,
};
use http_body_util::{BodyExt, Full};
use hyper::{header::CONTENT_TYPE, Request, Uri};
use tracing::{debug, warn};

use super::{GatewayTransport, Method, TransportResponse};

/// Sends requests to `{base_url}/{path}` and returns the raw response.
///
/// No timeout is applied here; callers wrap calls in their own.
#[derive(Clone)]
pub struct HttpTransport {
    client: HttpClient,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url` (e.g. `http://localhost:3000/api/gateway`).
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Transport`] if the TLS client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, EnvelopeError> {
        let client = build_client()
            .map_err(|e| EnvelopeError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    /// Full request URL for a path suffix.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GatewayTransport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<TransportResponse, EnvelopeError> {
        let uri: Uri = self
            .url_for(path)
            .parse()
            .map_err(|_| EnvelopeError::Transport(format!("invalid request path: {path}")))?;

        let req = Request::builder()
            .method(method.as_str())
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(body.unwrap_or_default()))
            .map_err(|e| EnvelopeError::Transport(format!("failed to build request: {e}")))?;

        let resp = self.client.request(req).await.map_err(|e| {
            warn!(method = method.as_str(), path, error = %e, "gateway request failed");
            EnvelopeError::Transport(format!("request to {path} failed: {e}"))
        })?;

        let status = resp.status().as_u16();
        if let Some(kind) = resp.headers().get(PROXY_ERROR_HEADER) {
            let kind = kind.to_str().unwrap_or("unknown").to_owned();
            warn!(method = method.as_str(), path, status, kind = %kind, "proxy failed the request");
            return Err(EnvelopeError::Transport(format!(
                "proxy request failed ({kind}, status {status})"
            )));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| EnvelopeError::Transport(format!("failed to read response body: {e}")))?
            .to_bytes();

        debug!(method = method.as_str(), path, status, bytes = body.len(), "gateway round trip");
        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}
