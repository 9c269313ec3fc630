//! Inbound hybrid decryption.

use std::sync::Arc;

use common::{Envelope, EnvelopeError};
use serde::de::DeserializeOwned;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{padding, CryptoProvider, RsaAesProvider, BLOCK_SIZE};
use crate::keys::KeyManager;

/// Opens envelopes addressed to the local private key.
pub struct Decryptor<P: CryptoProvider = RsaAesProvider> {
    keys: Arc<KeyManager<P>>,
}

impl<P: CryptoProvider> Clone for Decryptor<P> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
        }
    }
}

impl<P: CryptoProvider> Decryptor<P> {
    /// Create a decryptor that unwraps session keys with the manager's local private key.
    pub fn new(keys: Arc<KeyManager<P>>) -> Self {
        Self { keys }
    }

    /// Open `envelope` and return the JSON value inside.
    ///
    /// # Errors
    ///
    /// See [`Decryptor::decrypt_as`].
    pub async fn decrypt(&self, envelope: &Envelope) -> Result<serde_json::Value, EnvelopeError> {
        self.decrypt_as(envelope).await
    }

    /// Open `envelope` and deserialise the plaintext into `T`.
    ///
    /// # Errors
    ///
    /// - [`EnvelopeError::InvalidEnvelope`] if a field does not decode
    /// - [`EnvelopeError::KeyUnavailable`] / [`EnvelopeError::KeyFormat`] from the key manager
    /// - [`EnvelopeError::UnwrapFailure`] if the session key cannot be recovered
    /// - [`EnvelopeError::Padding`] if the decrypted payload is badly padded
    /// - [`EnvelopeError::MalformedPayload`] if the plaintext is not valid JSON for `T`
    pub async fn decrypt_as<T: DeserializeOwned>(
        &self,
        envelope: &Envelope,
    ) -> Result<T, EnvelopeError> {
        let raw = envelope.decode()?;
        let private = self.keys.local_private_key().await?;
        let provider = self.keys.provider();

        let session = provider.unwrap_key(&private, &raw.wrapped_key)?;
        let padded = Zeroizing::new(provider.decrypt_blocks(&session, &raw.iv, &raw.data)?);
        drop(session);

        let plaintext = padding::unpad(&padded, BLOCK_SIZE).map_err(|fault| {
            debug!(%fault, "padding check failed");
            EnvelopeError::from(fault)
        })?;

        serde_json::from_slice(plaintext).map_err(|e| {
            EnvelopeError::MalformedPayload(format!("plaintext is not the expected JSON: {e}"))
        })
    }
}
