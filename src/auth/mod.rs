//! # Authentication
//!
//! Bearer-token principal extraction. When no signing secret is configured
//! every request runs as the anonymous principal, which may read every
//! database.

pub mod errors;
pub mod jwt;
pub mod principal;

pub use errors::{AuthError, AuthResult};
pub use jwt::{JwtClaims, JwtConfig, JwtManager};
pub use principal::{Authenticator, Principal};
