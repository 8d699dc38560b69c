//! # HTTP Guard Adapter
//!
//! Axum middleware terminating the guard state machine in continuation
//! style: success attaches the `AuthContext` to the request and runs the
//! downstream handler; failure propagates the typed error into the
//! boundary renderer. The document-store handle must already be bound to
//! the request as an extension — its absence is a programmer error
//! detected before any credential is read.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{ACCEPT_LANGUAGE, AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::authorize::{authorize, GuardRequest, RoleSet};
use super::token::TokenVerifier;
use crate::access::AccessLayer;
use crate::errors::{AccessError, ErrorRecord};
use crate::messages::MessageCatalog;
use crate::store::DocumentStore;

/// Cookie consulted when no `Authorization` header is present
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Per-route guard state
#[derive(Clone)]
pub struct HttpGuard {
    pub verifier: Arc<TokenVerifier>,
    pub catalog: Arc<MessageCatalog>,
    pub roles: RoleSet,
}

/// Guard middleware for `axum::middleware::from_fn_with_state`
pub async fn require_auth<S: DocumentStore + 'static>(
    State(guard): State<HttpGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ErrorRecord> {
    let language = declared_language(req.headers());

    let outcome = match req.extensions().get::<AccessLayer<S>>().cloned() {
        Some(engine) => {
            let request = GuardRequest {
                bearer: bearer_token(req.headers()),
                cookie_token: cookie_value(req.headers(), ACCESS_TOKEN_COOKIE),
                language: language.clone(),
                resource: req.uri().path().to_string(),
            };
            authorize(&engine, &guard.verifier, &request, &guard.roles).await
        }
        None => Err(AccessError::DevelopmentError(
            "no document-store handle bound to the request".into(),
        )),
    };

    match outcome {
        Ok(context) => {
            req.extensions_mut().insert(context);
            Ok(next.run(req).await)
        }
        Err(err) => Err(err.to_record(&guard.catalog, language.as_deref())),
    }
}

/// Token from the `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Value of a named cookie from the `Cookie` header
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(COOKIE).and_then(|v| v.to_str().ok())?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Caller's declared language: first tag of `Accept-Language`
pub fn declared_language(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok())?;
    let first = raw.split(',').next()?;
    let tag = first.split(';').next()?.trim();
    (!tag.is_empty()).then(|| tag.to_string())
}
