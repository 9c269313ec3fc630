//! `gateway-proxy`: same-origin pass-through to the gateway.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`](config::Config) from environment variables.
//! 2. Initialise telemetry (JSON logs, OTLP spans when configured).
//! 3. Build the upstream client.
//! 4. Build the Axum router and start serving.

mod config;
mod server;
mod telemetry;
mod upstream;

use anyhow::{Context, Result};
use tracing::info;

use server::state::AppState;
use upstream::Upstream;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = config::Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: gateway-proxy configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(cfg.otlp_endpoint(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        route_prefix = %cfg.route_prefix,
        max_body_bytes = cfg.max_body_bytes,
        otlp = cfg.otlp_endpoint().is_some(),
        "gateway-proxy starting"
    );

    // -----------------------------------------------------------------------
    // 3. Upstream
    // -----------------------------------------------------------------------
    let upstream = Upstream::new(&cfg.upstream_base_url, cfg.upstream_timeout())?;

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let router = server::router::build(AppState::new(
        upstream,
        cfg.route_prefix.clone(),
        cfg.max_body_bytes,
    ));

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router).await?;
    Ok(())
}
