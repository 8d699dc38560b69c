//! # In-Memory Store
//!
//! Reference `DocumentStore` backed by per-collection vectors behind an
//! async read-write lock. Suitable for tests and single-process
//! deployments; writes are serialized per store, reads may interleave.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::filter::{compare_values, FilterDoc};
use super::id::{DocumentId, ID_FIELD};
use super::{DocumentStore, SortKey, StoreError, StoreResult};

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection, regardless of filter
    pub async fn len(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map(Vec::len).unwrap_or(0)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

/// Order documents by the given sort keys, in sequence
fn sort_documents(docs: &mut [Value], sort: &[SortKey]) {
    if sort.is_empty() {
        return;
    }

    docs.sort_by(|a, b| {
        for key in sort {
            let va = a.get(&key.field).unwrap_or(&Value::Null);
            let vb = b.get(&key.field).unwrap_or(&Value::Null);
            let cmp = compare_values(va, vb);
            let cmp = if key.ascending { cmp } else { -cmp };
            match cmp {
                c if c < 0 => return std::cmp::Ordering::Less,
                c if c > 0 => return std::cmp::Ordering::Greater,
                _ => continue,
            }
        }
        std::cmp::Ordering::Equal
    });
}

/// Merge top-level fields of `update` into `target`
fn apply_update(target: &mut Value, update: &Value) -> StoreResult<()> {
    let update = update
        .as_object()
        .ok_or_else(|| StoreError::Backend("update document must be a JSON object".into()))?;
    let target = target
        .as_object_mut()
        .ok_or_else(|| StoreError::Backend("stored document is not a JSON object".into()))?;

    for (field, value) in update {
        target.insert(field.clone(), value.clone());
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_many(
        &self,
        collection: &str,
        filter: &FilterDoc,
        sort: &[SortKey],
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().await;
        let mut matched: Vec<Value> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();

        sort_documents(&mut matched, sort);

        Ok(matched
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_one(&self, collection: &str, filter: &FilterDoc) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn count(&self, collection: &str, filter: &FilterDoc) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count() as u64)
            .unwrap_or(0))
    }

    async fn insert_one(&self, collection: &str, mut document: Value) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        match document.get(ID_FIELD) {
            Some(id) => {
                if docs.iter().any(|d| d.get(ID_FIELD) == Some(id)) {
                    return Err(StoreError::Conflict(document));
                }
            }
            None => {
                let object = document.as_object_mut().ok_or_else(|| {
                    StoreError::Backend("document must be a JSON object".into())
                })?;
                object.insert(ID_FIELD.to_string(), DocumentId::generate().to_value());
            }
        }

        docs.push(document);
        Ok(())
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &FilterDoc,
        update: &Value,
        return_new: bool,
    ) -> StoreResult<Option<Value>> {
        let mut collections = self.collections.write().await;
        let docs = match collections.get_mut(collection) {
            Some(docs) => docs,
            None => return Ok(None),
        };

        let target = match docs.iter_mut().find(|d| filter.matches(d)) {
            Some(doc) => doc,
            None => return Ok(None),
        };

        let before = target.clone();
        apply_update(target, update)?;

        Ok(Some(if return_new { target.clone() } else { before }))
    }

    async fn delete_one(&self, collection: &str, filter: &FilterDoc) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let docs = match collections.get_mut(collection) {
            Some(docs) => docs,
            None => return Ok(false),
        };

        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
