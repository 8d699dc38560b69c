//! # Document Store
//!
//! The collection-oriented persistence contract the access layer runs
//! against, plus the in-memory reference engine. A store must support
//! filtered find-many with sort/skip/limit, find-one, count, insert-one,
//! atomic find-and-update, and delete-one, all against named collections.

pub mod filter;
pub mod id;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use filter::{FilterDoc, FilterOp};
pub use id::{DocumentId, ID_FIELD};
pub use memory::MemoryStore;

use crate::errors::AccessError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures originating inside a store backend
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Write collides with an existing document
    #[error("document conflicts with an existing document")]
    Conflict(Value),

    /// Backend failure outside the data model
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(payload) => AccessError::DocumentConflict(payload),
            StoreError::Backend(msg) => AccessError::DevelopmentError(msg),
        }
    }
}

/// A single sort criterion; criteria apply in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub ascending: bool,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// Collection-oriented document persistence
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find documents matching `filter`, ordered by `sort`, windowed by
    /// `skip`/`limit`
    async fn find_many(
        &self,
        collection: &str,
        filter: &FilterDoc,
        sort: &[SortKey],
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<Value>>;

    /// First document matching `filter`, if any
    async fn find_one(&self, collection: &str, filter: &FilterDoc) -> StoreResult<Option<Value>>;

    /// Number of documents matching `filter`, ignoring pagination
    async fn count(&self, collection: &str, filter: &FilterDoc) -> StoreResult<u64>;

    /// Insert a document. Fails with `Conflict` when its `_id` is taken.
    async fn insert_one(&self, collection: &str, document: Value) -> StoreResult<()>;

    /// Atomically update the first document matching `filter`, returning
    /// the post-update document when `return_new` is set, the pre-update
    /// document otherwise, or `None` when nothing matched
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &FilterDoc,
        update: &Value,
        return_new: bool,
    ) -> StoreResult<Option<Value>>;

    /// Delete at most one matching document; reports whether one was removed
    async fn delete_one(&self, collection: &str, filter: &FilterDoc) -> StoreResult<bool>;
}
