//! Gateway Configuration
//!
//! Configuration for the HTTP gateway: bind address, store location, worker
//! pool size, CORS, authentication and logging. Loaded from a JSON file;
//! every field has a default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::JwtConfig;
use crate::observability::LogFormat;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Bearer-token authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret; authentication is off when absent
    #[serde(default)]
    pub jwt_secret: Option<String>,

    #[serde(default = "default_token_party")]
    pub issuer: String,

    #[serde(default = "default_token_party")]
    pub audience: String,
}

fn default_token_party() -> String {
    "revgate".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: default_token_party(),
            audience: default_token_party(),
        }
    }
}

impl AuthConfig {
    /// JWT settings, if a secret is configured
    pub fn jwt_config(&self) -> Option<JwtConfig> {
        self.jwt_secret.as_ref().map(|secret| {
            let mut config = JwtConfig::new(secret.clone());
            config.issuer = self.issuer.clone();
            config.audience = self.audience.clone();
            config
        })
    }
}

/// HTTP gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 9443)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding one sub-directory per database (default: "data")
    #[serde(default = "default_store_location")]
    pub store_location: PathBuf,

    /// Maximum number of reads touching the store at once
    /// (default: available parallelism)
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// CORS allowed origins (default: none, any origin allowed)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9443
}

fn default_store_location() -> PathBuf {
    PathBuf::from("data")
}

fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            store_location: default_store_location(),
            max_workers: default_max_workers(),
            cors_origins: Vec::new(),
            auth: AuthConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl GatewayConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Read and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GatewayConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid("max_workers must be positive".to_string()));
        }
        if self.store_location.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store_location must not be empty".to_string()));
        }
        if let Some(secret) = &self.auth.jwt_secret {
            if secret.is_empty() {
                return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9443);
        assert!(config.max_workers > 0);
        assert!(config.auth.jwt_config().is_none());
    }

    #[test]
    fn test_socket_addr() {
        let config = GatewayConfig::with_port(8080);
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"port": 7000, "store_location": "/srv/docs", "auth": {{"jwt_secret": "s3cret"}}, "log_format": "json"}}"#
        )
        .unwrap();

        let config = GatewayConfig::load(file.path()).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.store_location, PathBuf::from("/srv/docs"));
        assert_eq!(config.log_format, LogFormat::Json);

        let jwt = config.auth.jwt_config().unwrap();
        assert_eq!(jwt.secret, "s3cret");
        assert_eq!(jwt.issuer, "revgate");
    }

    #[test]
    fn test_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_workers": 0}}"#).unwrap();
        assert!(matches!(
            GatewayConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));

        let missing = GatewayConfig::load(Path::new("/nonexistent/revgate.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
