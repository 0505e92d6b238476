//! CLI command implementations

use std::fs;
use std::path::Path;

use tracing::info;

use crate::http_server::{GatewayConfig, HttpServer};
use crate::observability::init_logging;

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config).map(|_| ()),
        Command::Start { config, port } => start(&config, port),
    }
}

/// Create the store directory, writing a default config file if none exists
pub fn init(config_path: &Path) -> CliResult<GatewayConfig> {
    let config = if config_path.exists() {
        GatewayConfig::load(config_path)?
    } else {
        let config = GatewayConfig::default();
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(config_path, serde_json::to_string_pretty(&config)?)?;
        config
    };

    fs::create_dir_all(&config.store_location).map_err(|e| {
        CliError::io_error(format!(
            "Failed to create store directory {:?}: {}",
            config.store_location, e
        ))
    })?;

    println!(
        "{}",
        serde_json::json!({
            "initialized": true,
            "store_location": config.store_location,
        })
    );
    Ok(config)
}

/// Load configuration and serve until the listener fails
pub fn start(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = GatewayConfig::load(config_path)?;
    if let Some(port) = port {
        config.port = port;
    }

    init_logging(config.log_format);
    info!(
        config = %config_path.display(),
        store = %config.store_location.display(),
        workers = config.max_workers,
        "GATEWAY_STARTING"
    );

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to start runtime: {}", e)))?;
    runtime
        .block_on(HttpServer::with_config(config).start())
        .map_err(|e| CliError::serve_failed(e.to_string()))
}
