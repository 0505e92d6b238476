//! # HTTP Server Module
//!
//! Axum server hosting the read gateway.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/` - Database listing and store-wide queries
//! - `/:database` - Resource listing
//! - `/:database/:resource` - Revision serialization and queries

pub mod config;
pub mod observability_routes;
pub mod server;

pub use config::{AuthConfig, ConfigError, GatewayConfig};
pub use server::HttpServer;
