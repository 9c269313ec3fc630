//! `gateway-client`: send one encrypted request through the proxy.
//!
//! Startup sequence:
//! 1. Parse command-line arguments.
//! 2. Load and validate [`ClientConfig`] from environment variables.
//! 3. Initialise structured JSON logging (stderr).
//! 4. Read the request body from `--body` or stdin.
//! 5. Load both keys, so a bad key fails before anything is sent.
//! 6. Seal, send, open, and print the response as pretty JSON.

use std::io::Read;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use tracing::{error, info};

use gateway_client::{telemetry, ClientConfig, GatewayClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliMethod {
    Get,
    Post,
}

/// Send an envelope-encrypted request to the gateway and print the decrypted reply.
#[derive(Debug, Parser)]
#[command(name = "gateway-client", version)]
struct Cli {
    /// HTTP method.
    #[arg(long, value_enum, default_value = "post")]
    method: CliMethod,

    /// Request path relative to `GATEWAY_BASE_URL`, e.g. `api/query`.
    path: String,

    /// JSON request body. Read from stdin for POST when omitted.
    #[arg(long)]
    body: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // -----------------------------------------------------------------------
    // 1. Arguments
    // -----------------------------------------------------------------------
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = match ClientConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Telemetry is not yet up; write to stderr directly.
            eprintln!("ERROR: configuration invalid: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    if let Err(e) = telemetry::init(&cfg.log_level) {
        eprintln!("ERROR: {e:#}");
        return ExitCode::FAILURE;
    }
    info!(version = env!("CARGO_PKG_VERSION"), "gateway-client starting");

    // -----------------------------------------------------------------------
    // 4. Request body
    // -----------------------------------------------------------------------
    let body = match read_body(&cli) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // -----------------------------------------------------------------------
    // 5. Keys
    // -----------------------------------------------------------------------
    let client = match GatewayClient::from_config(&cfg) {
        Ok(client) => client,
        Err(e) => {
            error!(code = e.code(), error = %e, "client construction failed");
            eprintln!("ERROR: {}", e.public_message());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = client.preload().await {
        error!(code = e.code(), error = %e, "key preload failed");
        eprintln!("ERROR: {}", e.public_message());
        return ExitCode::FAILURE;
    }
    info!("keys ready");

    // -----------------------------------------------------------------------
    // 6. Exchange
    // -----------------------------------------------------------------------
    let result = match cli.method {
        CliMethod::Post => client.post_encrypted(&cli.path, &body.unwrap_or(Value::Null)).await,
        CliMethod::Get => client.get_encrypted(&cli.path, body.as_ref()).await,
    };

    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("ERROR: cannot print response: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!(code = e.code(), retryable = e.is_retryable(), error = %e, "request failed");
            eprintln!("ERROR: {}", e.public_message());
            ExitCode::FAILURE
        }
    }
}

/// `--body` if given; otherwise stdin for POST, nothing for GET.
fn read_body(cli: &Cli) -> Result<Option<Value>> {
    let text = match (&cli.body, cli.method) {
        (Some(text), _) => text.clone(),
        (None, CliMethod::Post) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read request body from stdin")?;
            buf
        }
        (None, CliMethod::Get) => return Ok(None),
    };
    let value = serde_json::from_str(&text).context("request body is not valid JSON")?;
    Ok(Some(value))
}
