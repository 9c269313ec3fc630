//! Structured logging for the client binary.
//!
//! # Telemetry invariants
//!
//! - No key material, plaintext payload, or envelope field content appears in
//!   any log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden by
//!   `RUST_LOG` when set.

pub mod init;

pub use init::init;
