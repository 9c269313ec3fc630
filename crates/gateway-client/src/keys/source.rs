//! Where PEM key material comes from.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use common::{protocol::PublicKeyResponse, EnvelopeError};
use tracing::debug;

use crate::transport::{GatewayTransport, Method};

/// Produces PEM text for one key slot.
///
/// Implementations return [`EnvelopeError::KeyUnavailable`] when the material
/// cannot be obtained and [`EnvelopeError::KeyFormat`] when it was obtained but
/// is not shaped as expected.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Fetch the PEM text.
    async fn fetch_pem(&self) -> Result<String, EnvelopeError>;
}

// ---------------------------------------------------------------------------
// Remote public key
// ---------------------------------------------------------------------------

/// Fetches the gateway public key: `GET <path>` returning `{"public_key": "<pem>"}`.
pub struct RemotePublicKeySource {
    transport: Arc<dyn GatewayTransport>,
    path: String,
}

impl RemotePublicKeySource {
    /// Create a source reading `path` through `transport`.
    pub fn new(transport: Arc<dyn GatewayTransport>, path: impl Into<String>) -> Self {
        Self {
            transport,
            path: path.into(),
        }
    }
}

#[async_trait]
impl KeySource for RemotePublicKeySource {
    async fn fetch_pem(&self) -> Result<String, EnvelopeError> {
        let resp = self
            .transport
            .send(Method::Get, &self.path, None)
            .await
            .map_err(|e| EnvelopeError::KeyUnavailable(format!("public key fetch failed: {e}")))?;

        if !resp.is_success() {
            return Err(EnvelopeError::KeyUnavailable(format!(
                "public key endpoint returned status {}",
                resp.status
            )));
        }

        let parsed: PublicKeyResponse = serde_json::from_slice(&resp.body).map_err(|_| {
            EnvelopeError::KeyFormat("public key response is not {\"public_key\": <pem>}".into())
        })?;
        debug!(path = %self.path, "fetched remote public key");
        Ok(parsed.public_key)
    }
}

// ---------------------------------------------------------------------------
// Local private key
// ---------------------------------------------------------------------------

/// Reads a PEM file from the local filesystem.
#[derive(Debug, Clone)]
pub struct FilePrivateKeySource {
    path: PathBuf,
}

impl FilePrivateKeySource {
    /// Create a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl KeySource for FilePrivateKeySource {
    async fn fetch_pem(&self) -> Result<String, EnvelopeError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            EnvelopeError::KeyUnavailable(format!(
                "cannot read private key {}: {e}",
                self.path.display()
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Hands out a fixed PEM string. Used for embedded and deterministic keys.
#[derive(Clone)]
pub struct StaticKeySource {
    pem: String,
}

impl StaticKeySource {
    /// Create a source that always returns `pem`.
    pub fn new(pem: impl Into<String>) -> Self {
        Self { pem: pem.into() }
    }
}

impl std::fmt::Debug for StaticKeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticKeySource([REDACTED])")
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn fetch_pem(&self) -> Result<String, EnvelopeError> {
        Ok(self.pem.clone())
    }
}
