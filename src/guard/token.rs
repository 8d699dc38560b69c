//! # Token Verification
//!
//! Bearer tokens are HS256 JWTs with a subject identifier, issued-at,
//! and expiry. Verification distinguishes three failure classes:
//! signature or shape problems become `InvalidToken`; a token outside
//! its validity window becomes `TokenExpired` carrying the exact
//! boundary timestamp; anything else the library reports is surfaced as
//! a `DevelopmentError` rather than mapped to an auth failure.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::GuardConfig;
use crate::errors::{AccessError, AccessResult};

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier; its absence fails the payload check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issued-at timestamp (Unix epoch seconds)
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,

    /// Not-before timestamp (Unix epoch seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// Signs and verifies bearer tokens against a shared secret
#[derive(Clone)]
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: i64,
    leeway_secs: i64,
}

impl TokenVerifier {
    /// Clock-skew tolerance applied to expiry and not-before checks
    pub const LEEWAY_SECS: i64 = 60;

    pub fn new(config: &GuardConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            token_ttl_secs: config.token_ttl_secs,
            leeway_secs: Self::LEEWAY_SECS,
        }
    }

    /// Issue a token for a subject, valid for the configured lifetime
    pub fn sign(&self, subject: &str) -> AccessResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Some(subject.to_string()),
            iat: now,
            exp: now + self.token_ttl_secs,
            nbf: None,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AccessError::DevelopmentError(format!("token signing failed: {e}")))
    }

    /// Verify a token's signature and validity window.
    ///
    /// Expiry and not-before are checked here, after signature
    /// verification, so `TokenExpired` can carry the token's exact
    /// boundary timestamp.
    pub fn verify(&self, token: &str) -> AccessResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => AccessError::InvalidToken,
                _ => AccessError::DevelopmentError(format!("token verification failed: {e}")),
            }
        })?;
        let claims = data.claims;

        let now = Utc::now().timestamp();
        if let Some(nbf) = claims.nbf {
            if nbf > now + self.leeway_secs {
                return Err(AccessError::TokenExpired(epoch(nbf)));
            }
        }
        if now > claims.exp + self.leeway_secs {
            return Err(AccessError::TokenExpired(epoch(claims.exp)));
        }

        Ok(claims)
    }
}

fn epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}
