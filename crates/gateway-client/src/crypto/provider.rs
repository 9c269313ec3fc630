//! Cryptographic capability interface and its RustCrypto implementation.
//!
//! Everything above this module talks to [`CryptoProvider`] only. Key handles
//! are opaque associated types; callers can use them but never read key
//! material back out of them.

use aes::Aes256;
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use common::{protocol::IV_LEN, EnvelopeError, PaddingFault};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::rand_core::{OsRng, RngCore};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{BLOCK_SIZE, KEY_LEN};

/// Smallest accepted RSA modulus, in bytes (2048 bits).
pub const MIN_MODULUS_LEN: usize = 256;

/// The primitives the envelope layer needs: key import, key wrap/unwrap,
/// raw block-chained encryption, and secure randomness.
pub trait CryptoProvider: Send + Sync + 'static {
    /// Opaque handle for a recipient public key.
    type PublicKey: Send + Sync + 'static;
    /// Opaque handle for a local private key.
    type PrivateKey: Send + Sync + 'static;

    /// Import a public key from DER.
    fn import_public_key(&self, der: &[u8]) -> Result<Self::PublicKey, EnvelopeError>;

    /// Import a private key from DER.
    fn import_private_key(&self, der: &[u8]) -> Result<Self::PrivateKey, EnvelopeError>;

    /// Wrap a session key for `recipient`.
    fn wrap_key(&self, recipient: &Self::PublicKey, key: &[u8]) -> Result<Vec<u8>, EnvelopeError>;

    /// Recover a session key. Every failure is [`EnvelopeError::UnwrapFailure`].
    fn unwrap_key(
        &self,
        key: &Self::PrivateKey,
        wrapped: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError>;

    /// Encrypt block-aligned input. Does not pad.
    fn encrypt_blocks(
        &self,
        key: &[u8],
        iv: &[u8; IV_LEN],
        padded: &[u8],
    ) -> Result<Vec<u8>, EnvelopeError>;

    /// Decrypt block-aligned ciphertext. Does not unpad.
    fn decrypt_blocks(
        &self,
        key: &[u8],
        iv: &[u8; IV_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, EnvelopeError>;

    /// Fill `out` from a cryptographically secure source.
    fn random_bytes(&self, out: &mut [u8]);
}

// ---------------------------------------------------------------------------
// RSA-OAEP(SHA-256) + AES-256-CBC
// ---------------------------------------------------------------------------

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Public key handle for [`RsaAesProvider`].
pub struct RsaPublicHandle(RsaPublicKey);

impl RsaPublicHandle {
    /// Modulus size in bytes; also the length of every wrapped key.
    pub fn modulus_len(&self) -> usize {
        self.0.size()
    }
}

impl std::fmt::Debug for RsaPublicHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RsaPublicHandle({} bits)", self.0.size() * 8)
    }
}

/// Private key handle for [`RsaAesProvider`].
pub struct RsaPrivateHandle(RsaPrivateKey);

impl RsaPrivateHandle {
    /// Modulus size in bytes.
    pub fn modulus_len(&self) -> usize {
        self.0.size()
    }
}

impl std::fmt::Debug for RsaPrivateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RsaPrivateHandle([REDACTED])")
    }
}

/// Default provider: RSA-OAEP with SHA-256 (MGF1-SHA-256, empty label) for key
/// wrapping, AES-256-CBC for bulk data, OS CSPRNG for keys and IVs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaAesProvider;

impl CryptoProvider for RsaAesProvider {
    type PublicKey = RsaPublicHandle;
    type PrivateKey = RsaPrivateHandle;

    fn import_public_key(&self, der: &[u8]) -> Result<Self::PublicKey, EnvelopeError> {
        let key = RsaPublicKey::from_public_key_der(der)
            .or_else(|_| RsaPublicKey::from_pkcs1_der(der))
            .map_err(|_| {
                EnvelopeError::KeyFormat("public key is not an RSA SPKI or PKCS#1 key".into())
            })?;
        check_modulus(key.size())?;
        Ok(RsaPublicHandle(key))
    }

    fn import_private_key(&self, der: &[u8]) -> Result<Self::PrivateKey, EnvelopeError> {
        let key = RsaPrivateKey::from_pkcs8_der(der)
            .or_else(|_| RsaPrivateKey::from_pkcs1_der(der))
            .map_err(|_| {
                EnvelopeError::KeyFormat("private key is not an RSA PKCS#8 or PKCS#1 key".into())
            })?;
        check_modulus(key.size())?;
        Ok(RsaPrivateHandle(key))
    }

    fn wrap_key(&self, recipient: &Self::PublicKey, key: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
        recipient
            .0
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key)
            .map_err(|e| EnvelopeError::EncryptionFailure(format!("key wrap rejected: {e}")))
    }

    fn unwrap_key(
        &self,
        key: &Self::PrivateKey,
        wrapped: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        if wrapped.len() != key.0.size() {
            return Err(EnvelopeError::UnwrapFailure);
        }
        let session = key
            .0
            .decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), wrapped)
            .map(Zeroizing::new)
            .map_err(|_| EnvelopeError::UnwrapFailure)?;
        if session.len() != KEY_LEN {
            return Err(EnvelopeError::UnwrapFailure);
        }
        Ok(session)
    }

    fn encrypt_blocks(
        &self,
        key: &[u8],
        iv: &[u8; IV_LEN],
        padded: &[u8],
    ) -> Result<Vec<u8>, EnvelopeError> {
        if padded.is_empty() || padded.len() % BLOCK_SIZE != 0 {
            return Err(EnvelopeError::EncryptionFailure(format!(
                "input length {} is not block aligned",
                padded.len()
            )));
        }
        let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| {
            EnvelopeError::EncryptionFailure(format!(
                "AES key must be {KEY_LEN} bytes, got {}",
                key.len()
            ))
        })?;
        Ok(cipher.encrypt_padded_vec_mut::<NoPadding>(padded))
    }

    fn decrypt_blocks(
        &self,
        key: &[u8],
        iv: &[u8; IV_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, EnvelopeError> {
        if ciphertext.is_empty() {
            return Err(PaddingFault::Empty.into());
        }
        if ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(PaddingFault::Misaligned {
                len: ciphertext.len(),
                block_size: BLOCK_SIZE,
            }
            .into());
        }
        let cipher = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| {
            EnvelopeError::EncryptionFailure(format!(
                "AES key must be {KEY_LEN} bytes, got {}",
                key.len()
            ))
        })?;
        cipher
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|_| {
                PaddingFault::Misaligned {
                    len: ciphertext.len(),
                    block_size: BLOCK_SIZE,
                }
                .into()
            })
    }

    fn random_bytes(&self, out: &mut [u8]) {
        OsRng.fill_bytes(out);
    }
}

fn check_modulus(len: usize) -> Result<(), EnvelopeError> {
    if len < MIN_MODULUS_LEN {
        return Err(EnvelopeError::KeyFormat(format!(
            "RSA modulus of {} bits is below the 2048-bit minimum",
            len * 8
        )));
    }
    Ok(())
}
