//! Cryptographic building blocks for the envelope layer.
//!
//! This module has no HTTP or key-caching dependencies.
//!
//! # Parameters
//!
//! Fixed, not negotiated:
//!
//! ```text
//! key wrap    RSA-OAEP, SHA-256, MGF1-SHA-256, empty label
//! bulk data   AES-256-CBC, 16-byte IV, PKCS#7 padding applied by `padding`
//! ```

pub mod padding;
pub mod pem;
pub mod provider;
pub mod session;

pub use provider::{CryptoProvider, RsaAesProvider};
pub use session::SessionKey;

/// Byte length of a session key (AES-256).
pub const KEY_LEN: usize = 32;

/// Symmetric cipher block size in bytes.
pub const BLOCK_SIZE: usize = 16;
