//! # HTTP API Server
//!
//! Axum shell over the access layer: REST routes per collection behind
//! the authentication guard, query-string parsing into the options
//! contract, and boundary error rendering in the caller's declared
//! language.

pub mod query;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::access::{
    AccessLayer, CreateEnvelope, DeleteEnvelope, DeleteOptions, ListEnvelope, SingleEnvelope,
    UpdateEnvelope, UpdateOptions,
};
use crate::errors::ErrorRecord;
use crate::guard::http::{declared_language, require_auth, HttpGuard};
use crate::guard::{RoleSet, TokenVerifier};
use crate::messages::MessageCatalog;
use crate::store::{DocumentStore, FilterDoc, ID_FIELD};

/// Shared state behind every handler
pub struct ApiState<S> {
    pub engine: AccessLayer<S>,
    pub verifier: Arc<TokenVerifier>,
    pub catalog: Arc<MessageCatalog>,
}

/// REST API server
pub struct ApiServer<S> {
    state: Arc<ApiState<S>>,
    roles: RoleSet,
}

impl<S: DocumentStore + 'static> ApiServer<S> {
    pub fn new(
        engine: AccessLayer<S>,
        verifier: Arc<TokenVerifier>,
        catalog: Arc<MessageCatalog>,
    ) -> Self {
        Self {
            state: Arc::new(ApiState {
                engine,
                verifier,
                catalog,
            }),
            roles: RoleSet::any(),
        }
    }

    /// Restrict the API to the given roles instead of any authenticated
    /// caller
    pub fn with_roles(mut self, roles: RoleSet) -> Self {
        self.roles = roles;
        self
    }

    /// Build the router: collection routes behind the guard, with the
    /// store handle bound to every request
    pub fn router(&self) -> Router {
        let guard = HttpGuard {
            verifier: self.state.verifier.clone(),
            catalog: self.state.catalog.clone(),
            roles: self.roles.clone(),
        };

        Router::new()
            .route(
                "/api/v1/:collection",
                get(list_handler::<S>).post(create_handler::<S>),
            )
            .route(
                "/api/v1/:collection/:id",
                get(get_handler::<S>)
                    .patch(update_handler::<S>)
                    .delete(delete_handler::<S>),
            )
            .route_layer(middleware::from_fn_with_state(guard, require_auth::<S>))
            .layer(Extension(self.state.engine.clone()))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }
}

async fn list_handler<S: DocumentStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<ListEnvelope>, ErrorRecord> {
    let language = declared_language(&headers);
    let options = query::parse_fetch_options(&params)?;

    state
        .engine
        .fetch_many(&collection, options)
        .await
        .map(Json)
        .map_err(|e| e.to_record(&state.catalog, language.as_deref()))
}

async fn get_handler<S: DocumentStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path((collection, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<SingleEnvelope>, ErrorRecord> {
    let language = declared_language(&headers);
    let mut options = query::parse_fetch_options(&params)?;
    options.filter = FilterDoc::new().with(ID_FIELD, Value::String(id));

    state
        .engine
        .fetch_one(&collection, options)
        .await
        .map(Json)
        .map_err(|e| e.to_record(&state.catalog, language.as_deref()))
}

async fn create_handler<S: DocumentStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(document): Json<Value>,
) -> Result<(StatusCode, Json<CreateEnvelope>), ErrorRecord> {
    let language = declared_language(&headers);

    state
        .engine
        .create_one(&collection, document, None)
        .await
        .map(|envelope| (StatusCode::CREATED, Json(envelope)))
        .map_err(|e| e.to_record(&state.catalog, language.as_deref()))
}

async fn update_handler<S: DocumentStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path((collection, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(update): Json<Value>,
) -> Result<Json<UpdateEnvelope>, ErrorRecord> {
    let language = declared_language(&headers);
    let mut options =
        UpdateOptions::filtered(FilterDoc::new().with(ID_FIELD, Value::String(id)));
    options.return_new = query::parse_return_new(&params)?;

    state
        .engine
        .update_one(&collection, update, options)
        .await
        .map(Json)
        .map_err(|e| e.to_record(&state.catalog, language.as_deref()))
}

async fn delete_handler<S: DocumentStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    Path((collection, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<DeleteEnvelope>, ErrorRecord> {
    let language = declared_language(&headers);
    let options = DeleteOptions::filtered(FilterDoc::new().with(ID_FIELD, Value::String(id)));

    state
        .engine
        .delete_one(&collection, options)
        .await
        .map(Json)
        .map_err(|e| e.to_record(&state.catalog, language.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardConfig;
    use crate::store::MemoryStore;

    #[test]
    fn test_router_builds() {
        let engine = AccessLayer::new(Arc::new(MemoryStore::new()));
        let verifier = Arc::new(TokenVerifier::new(&GuardConfig::new("test-secret", 900)));
        let catalog = Arc::new(MessageCatalog::builtin());

        let server = ApiServer::new(engine, verifier, catalog).with_roles(RoleSet::of(["admin"]));
        let _router = server.router();
    }
}
