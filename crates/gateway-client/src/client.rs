//! [`GatewayClient`]: encrypted request/response calls against the gateway.

use std::sync::Arc;

use bytes::Bytes;
use common::{Envelope, EnvelopeError};
use serde::Serialize;
use serde_json::Value;
use tracing::{info_span, warn, Instrument};

use crate::config::ClientConfig;
use crate::crypto::{CryptoProvider, RsaAesProvider};
use crate::envelope::{Decryptor, Encryptor};
use crate::keys::{FilePrivateKeySource, KeyManager, KeySource, RemotePublicKeySource};
use crate::transport::{GatewayTransport, HttpTransport, Method};

/// Sends sealed requests and opens sealed responses.
///
/// Cheap to clone; clones share the transport and the key cache.
pub struct GatewayClient<P: CryptoProvider = RsaAesProvider> {
    transport: Arc<dyn GatewayTransport>,
    keys: Arc<KeyManager<P>>,
    encryptor: Encryptor<P>,
    decryptor: Decryptor<P>,
    public_key_path: Arc<String>,
}

impl<P: CryptoProvider> Clone for GatewayClient<P> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            keys: Arc::clone(&self.keys),
            encryptor: self.encryptor.clone(),
            decryptor: self.decryptor.clone(),
            public_key_path: Arc::clone(&self.public_key_path),
        }
    }
}

impl GatewayClient<RsaAesProvider> {
    /// Build the production client: HTTP transport to the proxy, gateway public
    /// key fetched through it, client private key read from disk.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(cfg: &ClientConfig) -> Result<Self, EnvelopeError> {
        let transport: Arc<dyn GatewayTransport> =
            Arc::new(HttpTransport::new(cfg.gateway_base_url.as_str())?);
        let public: Arc<dyn KeySource> = Arc::new(RemotePublicKeySource::new(
            Arc::clone(&transport),
            cfg.public_key_path.as_str(),
        ));
        let private: Arc<dyn KeySource> =
            Arc::new(FilePrivateKeySource::new(&cfg.client_private_key_path));
        let keys = Arc::new(KeyManager::new(RsaAesProvider, public, private));
        Ok(Self::new(transport, keys, cfg.public_key_path.clone()))
    }
}

impl<P: CryptoProvider> GatewayClient<P> {
    /// Assemble a client from its parts.
    pub fn new(
        transport: Arc<dyn GatewayTransport>,
        keys: Arc<KeyManager<P>>,
        public_key_path: impl Into<String>,
    ) -> Self {
        Self {
            encryptor: Encryptor::new(Arc::clone(&keys)),
            decryptor: Decryptor::new(Arc::clone(&keys)),
            transport,
            keys,
            public_key_path: Arc::new(public_key_path.into()),
        }
    }

    /// The shared key cache.
    pub fn keys(&self) -> &Arc<KeyManager<P>> {
        &self.keys
    }

    /// Load the gateway public key and the local private key together.
    ///
    /// # Errors
    ///
    /// The first [`EnvelopeError`] from either key; see [`KeyManager::preload`].
    pub async fn preload(&self) -> Result<(), EnvelopeError> {
        self.keys.preload().await
    }

    /// Seal `body`, `POST` it to `path`, and open the sealed response.
    ///
    /// # Errors
    ///
    /// Any [`EnvelopeError`]: key, cipher, transport, non-2xx gateway status,
    /// or a response that is not a valid envelope.
    pub async fn post_encrypted<T>(&self, path: &str, body: &T) -> Result<Value, EnvelopeError>
    where
        T: Serialize + ?Sized,
    {
        let sealed = self.seal(body).await?;
        self.exchange(Method::Post, path, Some(sealed))
            .instrument(info_span!("post_encrypted", path))
            .await
    }

    /// `GET` `path`, sealing `body` if there is one, and open the sealed response.
    ///
    /// # Errors
    ///
    /// As for [`GatewayClient::post_encrypted`].
    pub async fn get_encrypted<T>(&self, path: &str, body: Option<&T>) -> Result<Value, EnvelopeError>
    where
        T: Serialize + ?Sized,
    {
        let sealed = match body {
            Some(b) => Some(self.seal(b).await?),
            None => None,
        };
        self.exchange(Method::Get, path, sealed)
            .instrument(info_span!("get_encrypted", path))
            .await
    }

    /// Fetch the gateway's public key PEM without touching the key cache.
    ///
    /// # Errors
    ///
    /// [`EnvelopeError::KeyUnavailable`] or [`EnvelopeError::KeyFormat`].
    pub async fn public_key_pem(&self) -> Result<String, EnvelopeError> {
        RemotePublicKeySource::new(Arc::clone(&self.transport), self.public_key_path.as_str())
            .fetch_pem()
            .await
    }

    async fn seal<T: Serialize + ?Sized>(&self, body: &T) -> Result<Bytes, EnvelopeError> {
        let envelope = self.encryptor.encrypt(body).await?;
        let json = serde_json::to_vec(&envelope)
            .map_err(|e| EnvelopeError::EncryptionFailure(format!("cannot encode envelope: {e}")))?;
        Ok(Bytes::from(json))
    }

    async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<Value, EnvelopeError> {
        let resp = self.transport.send(method, path, body).await?;
        if !resp.is_success() {
            warn!(status = resp.status, "gateway returned non-success status");
            return Err(EnvelopeError::GatewayStatus(resp.status));
        }

        let envelope: Envelope = serde_json::from_slice(&resp.body).map_err(|_| {
            EnvelopeError::InvalidEnvelope("response body is not an envelope".into())
        })?;
        self.decryptor.decrypt(&envelope).await
    }
}
