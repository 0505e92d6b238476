//! # Principals
//!
//! The acting identity of one request and the databases it may read.

use std::collections::BTreeSet;

use axum::http::HeaderMap;

use super::errors::{AuthError, AuthResult};
use super::jwt::{JwtConfig, JwtManager};

/// Acting identity of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
    /// `None` grants every database
    databases: Option<BTreeSet<String>>,
}

impl Principal {
    /// Principal used when authentication is disabled
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".to_string(),
            databases: None,
        }
    }

    pub fn new(name: impl Into<String>, databases: Option<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            databases: databases.map(|list| list.into_iter().collect()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn can_access(&self, database: &str) -> bool {
        match &self.databases {
            Some(allowed) => allowed.contains(database),
            None => true,
        }
    }
}

/// Resolves request headers to a [`Principal`]
#[derive(Clone)]
pub struct Authenticator {
    jwt: Option<JwtManager>,
}

impl Authenticator {
    /// Every request is anonymous
    pub fn disabled() -> Self {
        Self { jwt: None }
    }

    /// Every request needs a valid bearer token
    pub fn with_jwt(config: JwtConfig) -> Self {
        Self {
            jwt: Some(JwtManager::new(config)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.jwt.is_some()
    }

    /// Extract the principal from the `Authorization` header
    pub fn authenticate(&self, headers: &HeaderMap) -> AuthResult<Principal> {
        let jwt = match &self.jwt {
            Some(jwt) => jwt,
            None => return Ok(Principal::anonymous()),
        };

        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AuthError::MissingToken)?;

        let claims = jwt.validate_token(token.trim())?;
        Ok(Principal::new(claims.sub, claims.databases))
    }
}
