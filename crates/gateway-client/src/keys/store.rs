//! [`KeySlot`] and [`KeyManager`]: lazily loaded, process-lifetime key cache.

use std::{future::Future, sync::Arc};

use common::EnvelopeError;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::source::KeySource;
use crate::crypto::{pem, CryptoProvider, RsaAesProvider};

/// One cached key with single-flight initialisation.
///
/// Concurrent callers that find the slot empty queue behind a single load.
/// A failed load leaves the slot empty so the next caller retries; a
/// successful one is final for the life of the slot.
pub struct KeySlot<K> {
    name: &'static str,
    cell: OnceCell<Arc<K>>,
}

impl<K> KeySlot<K> {
    /// Create an empty slot. `name` only appears in logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
        }
    }

    /// Returns `true` once a key has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Return the cached key, running `load` first if the slot is empty.
    ///
    /// Callers queued behind a failing load do not share its error: each one
    /// runs its own `load` in turn, still one at a time.
    ///
    /// # Errors
    ///
    /// Propagates the error from `load`. Nothing is cached on failure.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<K>, EnvelopeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<K, EnvelopeError>>,
    {
        self.cell
            .get_or_try_init(|| async {
                match load().await {
                    Ok(key) => {
                        info!(slot = self.name, "key loaded");
                        Ok(Arc::new(key))
                    }
                    Err(e) => {
                        warn!(slot = self.name, code = e.code(), error = %e, "key load failed");
                        Err(e)
                    }
                }
            })
            .await
            .cloned()
    }
}

impl<K> std::fmt::Debug for KeySlot<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySlot")
            .field("name", &self.name)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Owns the two asymmetric keys the envelope layer needs: the gateway's public
/// key (to wrap outbound session keys) and the local private key (to unwrap
/// inbound ones).
///
/// Construct one per process and share it behind an `Arc`; tests build their
/// own with deterministic sources.
pub struct KeyManager<P: CryptoProvider = RsaAesProvider> {
    provider: Arc<P>,
    remote_public_source: Arc<dyn KeySource>,
    local_private_source: Arc<dyn KeySource>,
    remote_public: KeySlot<P::PublicKey>,
    local_private: KeySlot<P::PrivateKey>,
}

impl<P: CryptoProvider> KeyManager<P> {
    /// Create a manager with empty slots.
    pub fn new(
        provider: P,
        remote_public_source: Arc<dyn KeySource>,
        local_private_source: Arc<dyn KeySource>,
    ) -> Self {
        Self {
            provider: Arc::new(provider),
            remote_public_source,
            local_private_source,
            remote_public: KeySlot::new("remote_public"),
            local_private: KeySlot::new("local_private"),
        }
    }

    /// The crypto provider the keys were imported with.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The gateway public key, fetched and imported on first use.
    ///
    /// # Errors
    ///
    /// [`EnvelopeError::KeyUnavailable`] if the fetch fails,
    /// [`EnvelopeError::KeyFormat`] if decoding or import fails.
    pub async fn remote_public_key(&self) -> Result<Arc<P::PublicKey>, EnvelopeError> {
        self.remote_public
            .get_or_load(|| async {
                let pem_text = self.remote_public_source.fetch_pem().await?;
                let der = pem::decode(&pem_text)
                    .map_err(|e| EnvelopeError::KeyFormat(format!("remote public key: {e}")))?;
                self.provider.import_public_key(&der)
            })
            .await
    }

    /// The local private key, read and imported on first use.
    ///
    /// # Errors
    ///
    /// [`EnvelopeError::KeyUnavailable`] if the read fails,
    /// [`EnvelopeError::KeyFormat`] if decoding or import fails.
    pub async fn local_private_key(&self) -> Result<Arc<P::PrivateKey>, EnvelopeError> {
        self.local_private
            .get_or_load(|| async {
                let pem_text = Zeroizing::new(self.local_private_source.fetch_pem().await?);
                let der = Zeroizing::new(
                    pem::decode(&pem_text)
                        .map_err(|e| EnvelopeError::KeyFormat(format!("local private key: {e}")))?,
                );
                self.provider.import_private_key(&der)
            })
            .await
    }

    /// Load both keys up front so a bad key surfaces before the first request.
    ///
    /// # Errors
    ///
    /// The first error from either load. The other slot may or may not be
    /// filled; a later call retries whatever is still empty.
    pub async fn preload(&self) -> Result<(), EnvelopeError> {
        tokio::try_join!(self.remote_public_key(), self.local_private_key())?;
        Ok(())
    }

    /// Whether the gateway public key is cached.
    pub fn remote_public_loaded(&self) -> bool {
        self.remote_public.is_loaded()
    }

    /// Whether the local private key is cached.
    pub fn local_private_loaded(&self) -> bool {
        self.local_private.is_loaded()
    }
}

impl<P: CryptoProvider> std::fmt::Debug for KeyManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("remote_public", &self.remote_public)
            .field("local_private", &self.local_private)
            .finish_non_exhaustive()
    }
}
