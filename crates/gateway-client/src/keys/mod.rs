//! Asymmetric key acquisition and process-lifetime caching.
//!
//! # Lifecycle
//!
//! 1. Both slots start empty. Nothing is fetched at construction.
//! 2. The first caller of [`KeyManager::remote_public_key`] or
//!    [`KeyManager::local_private_key`] triggers the fetch, PEM decode, and
//!    import. Callers arriving while it runs wait for that same load.
//! 3. On success the handle is cached and handed out as an `Arc` forever; there
//!    is no rotation. On failure nothing is cached and the next call retries.
//!
//! # Security invariants
//!
//! - Private key PEM and DER buffers are zeroed after import.
//! - Key material is never logged; handles redact themselves in `Debug`.

pub mod source;
pub mod store;

pub use source::{FilePrivateKeySource, KeySource, RemotePublicKeySource, StaticKeySource};
pub use store::{KeyManager, KeySlot};
