//! # Guard State Machine
//!
//! The authentication/authorization sequence, implemented once as a pure
//! function of the extracted credentials, the store handle, and the role
//! allow-list. Transport adapters (`http`, `handshake`) only adapt the
//! termination protocol around this function.
//!
//! Steps: extract -> verify -> payload check -> load user -> authorize ->
//! attach.

use serde_json::Value;

use super::token::TokenVerifier;
use crate::access::{AccessLayer, FetchOptions};
use crate::errors::{AccessError, AccessResult};
use crate::store::{DocumentId, DocumentStore, FilterDoc, ID_FIELD};

/// Collection the guard resolves subjects against
pub const USERS_COLLECTION: &str = "users";

/// Field on the user document holding its role
pub const ROLE_FIELD: &str = "role";

/// Allow-list entry admitting any authenticated caller
pub const WILDCARD_ROLE: &str = "*";

/// A role allow-list declared by the protected call site
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(Vec<String>);

impl RoleSet {
    /// Admit any authenticated caller
    pub fn any() -> Self {
        Self(vec![WILDCARD_ROLE.to_string()])
    }

    pub fn of<I, T>(roles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }

    /// Whether a caller with `role` passes this allow-list
    pub fn allows(&self, role: &str) -> bool {
        self.0.iter().any(|r| r == WILDCARD_ROLE || r == role)
    }
}

/// Credentials and request facts extracted by a transport adapter
#[derive(Debug, Clone, Default)]
pub struct GuardRequest {
    /// Token from the `Authorization: Bearer` header
    pub bearer: Option<String>,
    /// Token from the named cookie or handshake field
    pub cookie_token: Option<String>,
    /// Caller's declared language, for error rendering
    pub language: Option<String>,
    /// Resource being accessed, reported on permission failures
    pub resource: String,
}

/// The caller identity attached to a request or connection on success.
/// Lives for one request/connection lifecycle; never persisted.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The loaded user document
    pub user: Value,
    pub user_id: DocumentId,
    pub role: String,
    pub language: Option<String>,
}

/// Run the guard sequence against the given store handle.
///
/// Failure taxonomy per step: no credentials -> `NotLoggedIn`; bad
/// signature or shape -> `InvalidToken`; outside the validity window ->
/// `TokenExpired`; no subject claim -> `InvalidToken`; subject without a
/// stored user -> `UserNoLongerExists`; role outside the allow-list ->
/// `PermissionDenied` carrying the resource.
pub async fn authorize<S: DocumentStore>(
    engine: &AccessLayer<S>,
    verifier: &TokenVerifier,
    request: &GuardRequest,
    roles: &RoleSet,
) -> AccessResult<AuthContext> {
    let token = request
        .bearer
        .as_deref()
        .or(request.cookie_token.as_deref())
        .ok_or(AccessError::NotLoggedIn)?;

    let claims = verifier.verify(token)?;

    let subject = claims
        .sub
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(AccessError::InvalidToken)?;

    let filter = FilterDoc::new().with(ID_FIELD, Value::String(subject.to_string()));
    let envelope = engine
        .fetch_one(USERS_COLLECTION, FetchOptions::filtered(filter))
        .await?;
    let user = match envelope.data {
        Value::Null => {
            tracing::warn!(subject, "token subject has no stored user");
            return Err(AccessError::UserNoLongerExists(subject.to_string()));
        }
        user => user,
    };

    let role = user
        .get(ROLE_FIELD)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if !roles.allows(&role) {
        tracing::warn!(subject, role = %role, resource = %request.resource, "role outside allow-list");
        return Err(AccessError::PermissionDenied(request.resource.clone()));
    }

    let user_id = user
        .get(ID_FIELD)
        .ok_or_else(|| AccessError::DevelopmentError("stored user document has no _id".into()))
        .and_then(|raw| {
            DocumentId::coerce(raw).map_err(|_| {
                AccessError::DevelopmentError("stored user document has a malformed _id".into())
            })
        })?;

    Ok(AuthContext {
        user,
        user_id,
        role,
        language: request.language.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardConfig;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (AccessLayer<MemoryStore>, TokenVerifier) {
        let engine = AccessLayer::new(Arc::new(MemoryStore::new()));
        let verifier = TokenVerifier::new(&GuardConfig::new("test-secret", 900));
        (engine, verifier)
    }

    async fn seed_user(engine: &AccessLayer<MemoryStore>, role: &str) -> DocumentId {
        let id = DocumentId::generate();
        engine
            .store()
            .insert_one(
                USERS_COLLECTION,
                json!({ID_FIELD: id.to_string(), "name": "ada", ROLE_FIELD: role}),
            )
            .await
            .unwrap();
        id
    }

    fn request(token: Option<String>) -> GuardRequest {
        GuardRequest {
            bearer: token,
            cookie_token: None,
            language: None,
            resource: "/api/v1/users".into(),
        }
    }

    #[tokio::test]
    async fn test_no_credentials_is_not_logged_in() {
        let (engine, verifier) = setup();
        let err = authorize(&engine, &verifier, &request(None), &RoleSet::any())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotLoggedIn));
    }

    #[tokio::test]
    async fn test_cookie_token_is_accepted() {
        let (engine, verifier) = setup();
        let id = seed_user(&engine, "member").await;

        let req = GuardRequest {
            bearer: None,
            cookie_token: Some(verifier.sign(&id.to_string()).unwrap()),
            language: None,
            resource: "/ws".into(),
        };
        let ctx = authorize(&engine, &verifier, &req, &RoleSet::any()).await.unwrap();
        assert_eq!(ctx.user_id, id);
    }

    #[tokio::test]
    async fn test_unknown_subject_is_user_no_longer_exists() {
        let (engine, verifier) = setup();
        let ghost = DocumentId::generate();
        let token = verifier.sign(&ghost.to_string()).unwrap();

        let err = authorize(&engine, &verifier, &request(Some(token)), &RoleSet::any())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::UserNoLongerExists(id) if id == ghost.to_string()));
    }

    #[tokio::test]
    async fn test_missing_subject_claim_is_invalid_token() {
        let (engine, verifier) = setup();
        let now = chrono::Utc::now().timestamp();
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &super::super::token::Claims {
                sub: None,
                iat: now,
                exp: now + 900,
                nbf: None,
            },
            &jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = authorize(&engine, &verifier, &request(Some(token)), &RoleSet::any())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::InvalidToken));
    }

    #[tokio::test]
    async fn test_excluded_role_is_permission_denied_with_resource() {
        let (engine, verifier) = setup();
        let id = seed_user(&engine, "member").await;
        let token = verifier.sign(&id.to_string()).unwrap();

        let err = authorize(
            &engine,
            &verifier,
            &request(Some(token)),
            &RoleSet::of(["admin"]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AccessError::PermissionDenied(r) if r == "/api/v1/users"));
    }

    #[tokio::test]
    async fn test_wildcard_admits_any_authenticated_caller() {
        let (engine, verifier) = setup();
        let id = seed_user(&engine, "member").await;
        let token = verifier.sign(&id.to_string()).unwrap();

        let ctx = authorize(&engine, &verifier, &request(Some(token)), &RoleSet::any())
            .await
            .unwrap();
        assert_eq!(ctx.role, "member");
        assert_eq!(ctx.user["name"], "ada");
    }

    #[tokio::test]
    async fn test_listed_role_passes() {
        let (engine, verifier) = setup();
        let id = seed_user(&engine, "admin").await;
        let token = verifier.sign(&id.to_string()).unwrap();

        let ctx = authorize(
            &engine,
            &verifier,
            &request(Some(token)),
            &RoleSet::of(["admin", "owner"]),
        )
        .await
        .unwrap();
        assert_eq!(ctx.role, "admin");
    }

    #[tokio::test]
    async fn test_header_token_wins_over_cookie() {
        let (engine, verifier) = setup();
        let id = seed_user(&engine, "member").await;

        let req = GuardRequest {
            bearer: Some(verifier.sign(&id.to_string()).unwrap()),
            cookie_token: Some("garbage".into()),
            language: Some("de".into()),
            resource: "/api/v1/posts".into(),
        };
        let ctx = authorize(&engine, &verifier, &req, &RoleSet::any()).await.unwrap();
        assert_eq!(ctx.language.as_deref(), Some("de"));
    }
}
