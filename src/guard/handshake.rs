//! # Handshake Guard Adapter
//!
//! The guard state machine adapted to persistent-connection transports:
//! credentials are captured from the WebSocket upgrade request, the same
//! authorization sequence runs, and termination happens through an
//! explicit callback carrying the result. Rejected connections are
//! closed with a policy-violation close frame.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::handshake::server::{
    Request as UpgradeRequest, Response as UpgradeResponse,
};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

use super::authorize::{authorize, AuthContext, GuardRequest, RoleSet};
use super::http::{bearer_token, cookie_value, declared_language, ACCESS_TOKEN_COOKIE};
use super::token::TokenVerifier;
use crate::access::AccessLayer;
use crate::errors::{AccessError, AccessResult};
use crate::store::DocumentStore;

/// Query parameter consulted when the upgrade request carries no header
/// or cookie credential
pub const TOKEN_FIELD: &str = "token";

/// Credentials and request facts captured from an upgrade request
#[derive(Debug, Clone, Default)]
pub struct HandshakeContext {
    pub bearer: Option<String>,
    pub cookie_token: Option<String>,
    /// Token passed as a handshake field (query parameter)
    pub field_token: Option<String>,
    pub language: Option<String>,
    pub resource: String,
}

impl HandshakeContext {
    pub fn from_request(req: &UpgradeRequest) -> Self {
        Self {
            bearer: bearer_token(req.headers()),
            cookie_token: cookie_value(req.headers(), ACCESS_TOKEN_COOKIE),
            field_token: query_param(req.uri().query(), TOKEN_FIELD),
            language: declared_language(req.headers()),
            resource: req.uri().path().to_string(),
        }
    }

    fn guard_request(&self) -> GuardRequest {
        GuardRequest {
            bearer: self.bearer.clone(),
            cookie_token: self.cookie_token.clone().or_else(|| self.field_token.clone()),
            language: self.language.clone(),
            resource: self.resource.clone(),
        }
    }
}

/// Run the guard sequence for a handshake and deliver the outcome
/// through `done`
pub async fn authorize_handshake<S, F>(
    engine: &AccessLayer<S>,
    verifier: &TokenVerifier,
    handshake: &HandshakeContext,
    roles: &RoleSet,
    done: F,
) where
    S: DocumentStore,
    F: FnOnce(AccessResult<AuthContext>),
{
    done(authorize(engine, verifier, &handshake.guard_request(), roles).await);
}

/// Accept a WebSocket connection and authorize it in one step.
///
/// The upgrade completes first so a rejection can be delivered as a
/// close frame on the established socket rather than a raw TCP drop.
pub async fn accept_authorized<S, T>(
    engine: &AccessLayer<S>,
    verifier: &TokenVerifier,
    roles: &RoleSet,
    stream: T,
) -> AccessResult<(WebSocketStream<T>, AuthContext)>
where
    S: DocumentStore,
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut handshake: Option<HandshakeContext> = None;
    let mut ws = accept_hdr_async(stream, |req: &UpgradeRequest, response: UpgradeResponse| {
        handshake = Some(HandshakeContext::from_request(req));
        Ok(response)
    })
    .await
    .map_err(|e| AccessError::DevelopmentError(format!("websocket handshake failed: {e}")))?;

    let handshake = handshake.ok_or_else(|| {
        AccessError::DevelopmentError("upgrade completed without a handshake request".into())
    })?;

    let mut outcome = Err(AccessError::NotLoggedIn);
    authorize_handshake(engine, verifier, &handshake, roles, |result| {
        outcome = result;
    })
    .await;

    match outcome {
        Ok(context) => Ok((ws, context)),
        Err(err) => {
            let frame = CloseFrame {
                code: CloseCode::Policy,
                reason: err.to_string().into(),
            };
            let _ = ws.close(Some(frame)).await;
            Err(err)
        }
    }
}

fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
