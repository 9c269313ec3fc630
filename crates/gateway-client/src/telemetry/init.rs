//! JSON tracing subscriber for the CLI.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the JSON tracing subscriber.
///
/// Logs go to stderr; stdout is reserved for the decrypted response.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise gateway-client tracing subscriber: {e}"))
}
