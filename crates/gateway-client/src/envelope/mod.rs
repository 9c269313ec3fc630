//! Envelope sealing and opening.
//!
//! # Data flow
//!
//! ```text
//! encrypt: JSON -> bytes -> pad -> AES-256-CBC(session key, iv)   -> encrypted_data
//!                                  RSA-OAEP(gateway public key)    -> encrypted_key
//! decrypt: encrypted_key -> RSA-OAEP(local private key) -> session key
//!          encrypted_data -> AES-256-CBC -> unpad -> JSON
//! ```
//!
//! CBC carries no authentication tag. A tampered envelope is caught by the
//! OAEP check, the padding check, or the JSON parse; callers must treat all
//! three as the same "decryption failed" outcome.

pub mod decryptor;
pub mod encryptor;

pub use decryptor::Decryptor;
pub use encryptor::Encryptor;
