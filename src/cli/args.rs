//! CLI argument definitions using clap
//!
//! Commands:
//! - revgate init --config <path>
//! - revgate start --config <path> [--port <port>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// revgate - read gateway for temporal document stores
#[derive(Parser, Debug)]
#[command(name = "revgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file and create the store directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./revgate.json")]
        config: PathBuf,
    },

    /// Serve the gateway
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./revgate.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
