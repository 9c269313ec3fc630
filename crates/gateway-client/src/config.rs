//! Configuration loading and validation for the gateway client.
//!
//! Values come from environment variables. A missing or invalid variable is a
//! start-up error, reported before any request is attempted.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the same-origin proxy, e.g. `http://localhost:3000/api/gateway`.
    /// **Required.**
    pub gateway_base_url: String,

    /// Path suffix of the gateway public-key endpoint.
    #[serde(default = "default_public_key_path")]
    pub public_key_path: String,

    /// PEM file holding the client private key. **Required.**
    pub client_private_key_path: PathBuf,

    /// Tracing log level, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_public_key_path() -> String {
    "api/public-key".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl ClientConfig {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or invalid.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build client configuration from environment")?;

        let c: ClientConfig = cfg
            .try_deserialize()
            .context("failed to deserialise client configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.gateway_base_url, "GATEWAY_BASE_URL")?;
        ensure_http_url(&self.gateway_base_url, "GATEWAY_BASE_URL")?;
        ensure_non_empty(&self.public_key_path, "PUBLIC_KEY_PATH")?;
        if self.client_private_key_path.as_os_str().is_empty() {
            anyhow::bail!("CLIENT_PRIVATE_KEY_PATH is required and must not be empty");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

fn ensure_http_url(value: &str, name: &str) -> Result<()> {
    let rest = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => anyhow::bail!("{name} must be an http:// or https:// URL"),
    }
}
