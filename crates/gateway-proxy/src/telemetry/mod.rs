//! Telemetry for the gateway proxy: structured JSON logs, plus OTLP span
//! export when a collector endpoint is configured.
//!
//! # Telemetry invariants
//!
//! - Request and response bodies are never logged. They are ciphertext, but
//!   their size and timing are all the proxy needs to report.
//! - Query strings are not recorded in spans.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`).

pub mod init;

pub use init::init;
