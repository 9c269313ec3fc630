//! Configuration loading and validation for the gateway proxy.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated proxy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Gateway base URL requests are forwarded to. **Required.**
    pub upstream_base_url: String,

    /// TCP port to accept requests on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Path prefix the wildcard forwarding route is mounted under.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// Upstream round-trip timeout in seconds.
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,

    /// Largest request body the proxy will buffer and forward.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// OTLP collector endpoint. Spans are exported only when set.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    3000
}
fn default_route_prefix() -> String {
    "/api/gateway".into()
}
fn default_upstream_timeout() -> u64 {
    30
}
fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or invalid.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build gateway-proxy configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise gateway-proxy configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Upstream timeout as a [`Duration`].
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// OTLP endpoint, treating an empty value as unset.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        self.otel_exporter_otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn validate(&self) -> Result<()> {
        let base = self.upstream_base_url.trim();
        if base.is_empty() {
            anyhow::bail!("UPSTREAM_BASE_URL is required and must not be empty");
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            anyhow::bail!("UPSTREAM_BASE_URL must be an http:// or https:// URL");
        }
        if !self.route_prefix.starts_with('/') || self.route_prefix.ends_with('/') {
            anyhow::bail!("ROUTE_PREFIX must start with '/' and not end with '/'");
        }
        if self.upstream_timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be > 0");
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("MAX_BODY_BYTES must be > 0");
        }
        Ok(())
    }
}
