//! Outbound hybrid encryption.

use std::sync::Arc;

use common::{protocol::IV_LEN, Envelope, EnvelopeError};
use serde::Serialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{padding, CryptoProvider, RsaAesProvider, SessionKey, BLOCK_SIZE};
use crate::keys::KeyManager;

/// Seals JSON payloads for the gateway.
pub struct Encryptor<P: CryptoProvider = RsaAesProvider> {
    keys: Arc<KeyManager<P>>,
}

impl<P: CryptoProvider> Clone for Encryptor<P> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
        }
    }
}

impl<P: CryptoProvider> Encryptor<P> {
    /// Create an encryptor that wraps session keys for the manager's remote public key.
    pub fn new(keys: Arc<KeyManager<P>>) -> Self {
        Self { keys }
    }

    /// Serialise `plaintext` and seal it in a fresh [`Envelope`].
    ///
    /// Every call draws a new session key and IV. The session key is dropped,
    /// and zeroed, before this function returns.
    ///
    /// # Errors
    ///
    /// - [`EnvelopeError::KeyUnavailable`] / [`EnvelopeError::KeyFormat`] from the key manager
    /// - [`EnvelopeError::MalformedPayload`] if `plaintext` cannot be serialised
    /// - [`EnvelopeError::EncryptionFailure`] if a cipher rejects its inputs
    pub async fn encrypt<T>(&self, plaintext: &T) -> Result<Envelope, EnvelopeError>
    where
        T: Serialize + ?Sized,
    {
        let recipient = self.keys.remote_public_key().await?;
        let provider = self.keys.provider();

        let serialised = Zeroizing::new(serde_json::to_vec(plaintext).map_err(|e| {
            EnvelopeError::MalformedPayload(format!("cannot serialise payload: {e}"))
        })?);

        let session = SessionKey::generate(provider);
        let mut iv = [0u8; IV_LEN];
        provider.random_bytes(&mut iv);

        let padded = Zeroizing::new(padding::pad(&serialised, BLOCK_SIZE));
        let ciphertext = provider.encrypt_blocks(session.as_bytes(), &iv, &padded)?;
        let wrapped_key = provider.wrap_key(&recipient, session.as_bytes())?;
        drop(session);

        debug!(
            plaintext_len = serialised.len(),
            ciphertext_len = ciphertext.len(),
            "payload sealed"
        );
        Ok(Envelope::from_raw(&ciphertext, &wrapped_key, &iv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::test_support::loopback_keys;
    use crate::fixtures;
    use crate::keys::source::{MockKeySource, StaticKeySource};
    use serde_json::json;

    #[tokio::test]
    async fn envelope_shape_invariants() {
        let enc = Encryptor::new(loopback_keys());
        let env = enc
            .encrypt(&json!({"user_id": "uid1", "query": "hello"}))
            .await
            .unwrap();
        let raw = env.decode().unwrap();

        assert_eq!(raw.iv.len(), IV_LEN);
        assert_eq!(raw.wrapped_key.len(), 256);
        // 34 bytes of JSON pads to 48.
        assert_eq!(raw.data.len(), 48);
    }

    #[tokio::test]
    async fn identical_plaintexts_produce_unrelated_envelopes() {
        let enc = Encryptor::new(loopback_keys());
        let body = json!({"user_id": "uid1", "query": "hello"});
        let a = enc.encrypt(&body).await.unwrap();
        let b = enc.encrypt(&body).await.unwrap();
        assert_ne!(a.encrypted_data, b.encrypted_data);
        assert_ne!(a.encrypted_key, b.encrypted_key);
        assert_ne!(a.iv, b.iv);
    }

    #[tokio::test]
    async fn aligned_payload_gains_full_padding_block() {
        let enc = Encryptor::new(loopback_keys());
        // `"abcdefghijklmn"` serialises to exactly 16 bytes.
        let env = enc.encrypt("abcdefghijklmn").await.unwrap();
        assert_eq!(env.decode().unwrap().data.len(), 32);
    }

    #[tokio::test]
    async fn does_not_touch_private_key() {
        let keys = loopback_keys();
        let enc = Encryptor::new(keys.clone());
        enc.encrypt(&json!({})).await.unwrap();
        assert!(keys.remote_public_loaded());
        assert!(!keys.local_private_loaded());
    }

    #[tokio::test]
    async fn key_unavailable_propagates() {
        let mut source = MockKeySource::new();
        source
            .expect_fetch_pem()
            .returning(|| Err(EnvelopeError::KeyUnavailable("status 404".into())));
        let keys = Arc::new(KeyManager::new(
            RsaAesProvider,
            Arc::new(source),
            Arc::new(StaticKeySource::new(fixtures::CLIENT_PRIVATE_KEY)),
        ));
        let err = Encryptor::new(keys)
            .encrypt(&json!({"a": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, EnvelopeError::KeyUnavailable(_)));
    }
}
