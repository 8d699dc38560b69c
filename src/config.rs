//! # Guard Configuration
//!
//! The shared secret and token lifetime are always externally supplied.
//! There is no default secret anywhere in this crate: missing
//! configuration is a fatal startup error, never a silent fallback.

use std::env;

use crate::errors::{AccessError, AccessResult};

/// Environment variable holding the token-signing secret
pub const SECRET_ENV: &str = "DOCGATE_JWT_SECRET";

/// Environment variable holding the token lifetime in seconds
pub const TTL_ENV: &str = "DOCGATE_JWT_TTL_SECS";

/// Token verification settings
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Shared HMAC secret for signing and verifying tokens
    pub secret: String,
    /// Token lifetime in seconds
    pub token_ttl_secs: i64,
}

impl GuardConfig {
    pub fn new(secret: impl Into<String>, token_ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            token_ttl_secs,
        }
    }

    /// Read the configuration from the environment.
    ///
    /// Both variables are required; absence is an error, not a default.
    pub fn from_env() -> AccessResult<Self> {
        let secret = env::var(SECRET_ENV).map_err(|_| {
            AccessError::DevelopmentError(format!("{SECRET_ENV} must be set; refusing to start"))
        })?;
        let ttl = env::var(TTL_ENV).map_err(|_| {
            AccessError::DevelopmentError(format!("{TTL_ENV} must be set; refusing to start"))
        })?;
        let token_ttl_secs: i64 = ttl.parse().map_err(|_| {
            AccessError::DevelopmentError(format!("{TTL_ENV} must be an integer number of seconds"))
        })?;

        Ok(Self::new(secret, token_ttl_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_construction() {
        let config = GuardConfig::new("s3cret", 900);
        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.token_ttl_secs, 900);
    }
}
