//! # Authentication Guard
//!
//! Bearer-token authentication and role authorization in front of the
//! access layer. The state machine lives in [`authorize`] and runs once
//! per request or connection; the `http` and `handshake` modules adapt
//! only the termination protocol per transport.

pub mod authorize;
pub mod handshake;
pub mod http;
pub mod token;

pub use authorize::{AuthContext, GuardRequest, RoleSet, ROLE_FIELD, USERS_COLLECTION, WILDCARD_ROLE};
pub use handshake::{accept_authorized, authorize_handshake, HandshakeContext};
pub use http::{require_auth, HttpGuard, ACCESS_TOKEN_COOKIE};
pub use token::{Claims, TokenVerifier};
