//! Client side of the envelope-encrypted gateway channel.
//!
//! Request bodies are sealed for the gateway's RSA public key before they leave
//! the process; responses are sealed for the client's key pair and opened
//! here. Everything in between, the same-origin proxy included, sees only
//! [`common::Envelope`] JSON.
//!
//! ```text
//! GatewayClient ──► Encryptor ──► GatewayTransport ──► proxy ──► gateway
//!       ▲                                                          │
//!       └──────────── Decryptor ◄──────── Envelope ◄───────────────┘
//! ```
//!
//! [`keys::KeyManager`] loads both asymmetric keys lazily and caches them for
//! the life of the process.

pub mod client;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod keys;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
mod fixtures;

pub use client::GatewayClient;
pub use config::ClientConfig;
pub use envelope::{Decryptor, Encryptor};
pub use keys::KeyManager;
pub use transport::{GatewayTransport, HttpTransport};
