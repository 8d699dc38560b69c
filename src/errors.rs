//! # Error Taxonomy
//!
//! The closed set of typed failures shared by the access layer and the
//! authentication guard. Every variant carries a fixed HTTP status code;
//! user-facing text is resolved through the [`MessageCatalog`] at the
//! boundary, except for `DevelopmentError`, which is programmer-facing
//! and never localized.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::messages::MessageCatalog;

/// Result type for access and guard operations
pub type AccessResult<T> = Result<T, AccessError>;

/// Catalog keys, one per taxonomy kind.
pub mod kind {
    pub const INVALID_IDENTIFIER: &str = "invalid_identifier";
    pub const DOCUMENT_NOT_FOUND: &str = "document_not_found";
    pub const DOCUMENT_CONFLICT: &str = "document_conflict";
    pub const NOT_LOGGED_IN: &str = "not_logged_in";
    pub const INVALID_TOKEN: &str = "invalid_token";
    pub const TOKEN_EXPIRED: &str = "token_expired";
    pub const USER_NO_LONGER_EXISTS: &str = "user_no_longer_exists";
    pub const PERMISSION_DENIED: &str = "permission_denied";
    pub const DEVELOPMENT_ERROR: &str = "development_error";

    /// Every kind a catalog's default language must cover.
    pub const ALL: &[&str] = &[
        INVALID_IDENTIFIER,
        DOCUMENT_NOT_FOUND,
        DOCUMENT_CONFLICT,
        NOT_LOGGED_IN,
        INVALID_TOKEN,
        TOKEN_EXPIRED,
        USER_NO_LONGER_EXISTS,
        PERMISSION_DENIED,
        DEVELOPMENT_ERROR,
    ];
}

/// Typed failures for data access and authentication
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    // ==================
    // Data Access
    // ==================
    /// Identifier value does not match the store's native format
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(Value),

    /// No document matched the filter on an operation that requires one
    #[error("No document matched filter {0}")]
    DocumentNotFound(Value),

    /// Document collides with an existing one
    #[error("Document conflicts with an existing document")]
    DocumentConflict(Value),

    // ==================
    // Authentication
    // ==================
    /// No bearer token in the header, cookie, or handshake field
    #[error("Not logged in")]
    NotLoggedIn,

    /// Token signature or shape is invalid, or the payload lacks a subject
    #[error("Invalid token")]
    InvalidToken,

    /// Token is outside its validity window; carries the boundary timestamp
    #[error("Token expired or not yet valid as of {0}")]
    TokenExpired(DateTime<Utc>),

    /// Token subject does not resolve to a stored user
    #[error("User for subject {0} no longer exists")]
    UserNoLongerExists(String),

    /// Authenticated user's role is outside the allow-list
    #[error("Permission denied for {0}")]
    PermissionDenied(String),

    // ==================
    // Misconfiguration
    // ==================
    /// Programmer error, never shown to end users beyond its raw message
    #[error("Development error: {0}")]
    DevelopmentError(String),
}

impl AccessError {
    /// HTTP status code, fixed per kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccessError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,

            AccessError::NotLoggedIn => StatusCode::UNAUTHORIZED,
            AccessError::InvalidToken => StatusCode::UNAUTHORIZED,
            AccessError::TokenExpired(_) => StatusCode::UNAUTHORIZED,

            AccessError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            AccessError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            AccessError::UserNoLongerExists(_) => StatusCode::NOT_FOUND,

            AccessError::DocumentConflict(_) => StatusCode::CONFLICT,

            AccessError::DevelopmentError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Catalog key for this kind
    pub fn kind(&self) -> &'static str {
        match self {
            AccessError::InvalidIdentifier(_) => kind::INVALID_IDENTIFIER,
            AccessError::DocumentNotFound(_) => kind::DOCUMENT_NOT_FOUND,
            AccessError::DocumentConflict(_) => kind::DOCUMENT_CONFLICT,
            AccessError::NotLoggedIn => kind::NOT_LOGGED_IN,
            AccessError::InvalidToken => kind::INVALID_TOKEN,
            AccessError::TokenExpired(_) => kind::TOKEN_EXPIRED,
            AccessError::UserNoLongerExists(_) => kind::USER_NO_LONGER_EXISTS,
            AccessError::PermissionDenied(_) => kind::PERMISSION_DENIED,
            AccessError::DevelopmentError(_) => kind::DEVELOPMENT_ERROR,
        }
    }

    /// Payload rendered into the localized message, when the kind carries one
    pub fn payload(&self) -> Option<String> {
        match self {
            AccessError::InvalidIdentifier(raw) => Some(match raw {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            AccessError::DocumentNotFound(filter) => Some(filter.to_string()),
            AccessError::DocumentConflict(payload) => Some(payload.to_string()),
            AccessError::TokenExpired(at) => Some(at.to_rfc3339()),
            AccessError::UserNoLongerExists(id) => Some(id.clone()),
            AccessError::PermissionDenied(resource) => Some(resource.clone()),
            AccessError::NotLoggedIn
            | AccessError::InvalidToken
            | AccessError::DevelopmentError(_) => None,
        }
    }

    /// Whether this kind signals a caller mistake rather than a server bug
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Resolve this error into a boundary record with a localized message.
    ///
    /// `DevelopmentError` bypasses the catalog: its raw message is the record.
    pub fn to_record(&self, catalog: &MessageCatalog, language: Option<&str>) -> ErrorRecord {
        let message = match self {
            AccessError::DevelopmentError(msg) => msg.clone(),
            other => catalog.render(other.kind(), language, other.payload().as_deref()),
        };
        ErrorRecord {
            kind: self.kind(),
            status: self.status_code(),
            message,
        }
    }
}

/// A fully resolved failure, ready to cross the boundary
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub kind: &'static str,
    pub status: StatusCode,
    pub message: String,
}

impl ErrorRecord {
    /// A malformed-request record for the HTTP shell's own parse failures
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            kind: "bad_request",
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    code: u16,
    message: String,
}

impl IntoResponse for ErrorRecord {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            code: self.status.as_u16(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
