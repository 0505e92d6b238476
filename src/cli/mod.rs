//! CLI module for revgate
//!
//! Provides command-line interface for:
//! - init: Write a default config and create the store directory
//! - start: Serve the gateway

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, run, run_command, start};
pub use errors::{CliError, CliErrorCode, CliResult};
