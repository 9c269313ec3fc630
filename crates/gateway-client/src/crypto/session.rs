//! [`SessionKey`]: the per-request ephemeral AES-256 key.

use zeroize::Zeroize;

use super::{CryptoProvider, KEY_LEN};

/// Fixed-size buffer holding one ephemeral symmetric key.
///
/// Owned by exactly one encrypt call. The bytes are zeroed on drop and never
/// printed, not even in debug builds. Deliberately not `Clone`.
pub struct SessionKey(Box<[u8; KEY_LEN]>);

impl SessionKey {
    /// Draw a fresh key from the provider's secure random source.
    ///
    /// The key is written straight into its heap buffer so no stack copy
    /// outlives this call.
    pub fn generate<P: CryptoProvider + ?Sized>(provider: &P) -> Self {
        let mut buf = Box::new([0u8; KEY_LEN]);
        provider.random_bytes(&mut buf[..]);
        Self(buf)
    }

    /// Borrow the raw key bytes.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.0.as_mut_slice().zeroize();
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}
