//! # HTTP Server
//!
//! Main HTTP server combining the health check and the read gateway routes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::Authenticator;
use crate::rest_api::{GatewayState, RestServer, WorkerPool};
use crate::store::{DirectoryStore, Store};

use super::config::GatewayConfig;
use super::observability_routes::health_routes;

/// HTTP server for the read gateway
pub struct HttpServer {
    config: GatewayConfig,
    router: Router,
}

impl HttpServer {
    /// Serve the directory store named by `config.store_location`
    pub fn with_config(config: GatewayConfig) -> Self {
        let store: Arc<dyn Store> = Arc::new(DirectoryStore::new(config.store_location.clone()));
        Self::with_store(config, store)
    }

    /// Serve an arbitrary store
    pub fn with_store(config: GatewayConfig, store: Arc<dyn Store>) -> Self {
        let router = Self::build_router(&config, store);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &GatewayConfig, store: Arc<dyn Store>) -> Router {
        let authenticator = match config.auth.jwt_config() {
            Some(jwt) => Authenticator::with_jwt(jwt),
            None => Authenticator::disabled(),
        };
        let auth_enabled = authenticator.is_enabled();
        let pool = WorkerPool::new(config.max_workers);
        let state = GatewayState::new(store, authenticator, pool.clone());

        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            // Static health route wins over the `/:database` pattern
            .merge(health_routes(pool, auth_enabled))
            .merge(RestServer::new(state).router())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}", self.config.socket_addr()),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(
            addr = %addr,
            store = %self.config.store_location.display(),
            workers = self.config.max_workers,
            auth = self.config.auth.jwt_secret.is_some(),
            "GATEWAY_LISTENING"
        );

        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_creation() {
        let server = HttpServer::with_config(GatewayConfig::default());
        assert_eq!(server.socket_addr(), "0.0.0.0:9443");
    }

    #[test]
    fn test_server_with_custom_port() {
        let config = GatewayConfig::with_port(8080);
        let server = HttpServer::with_config(config);
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_router_builds_with_restricted_cors() {
        let config = GatewayConfig {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..Default::default()
        };
        let _router = HttpServer::with_config(config).router();
    }
}
