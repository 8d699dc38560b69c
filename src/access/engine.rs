//! # Access Operations
//!
//! The five data-access operations sharing filter and identifier
//! handling: fetch-many, fetch-one, create-one, update-one, delete-one.
//! All run against a [`DocumentStore`] and return fixed-shape envelopes;
//! failures surface as [`AccessError`] values for the boundary handler.

use std::sync::Arc;

use futures_util::future::try_join_all;
use serde_json::Value;

use super::envelope::{
    CreateEnvelope, DeleteEnvelope, ListEnvelope, SingleEnvelope, UpdateEnvelope,
};
use super::options::{DeleteOptions, FetchOptions, LookupSpec, UpdateOptions};
use crate::errors::{AccessError, AccessResult};
use crate::store::{DocumentStore, FilterDoc};

/// Uniform operations over a document store
pub struct AccessLayer<S> {
    store: Arc<S>,
}

impl<S> Clone for AccessLayer<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> AccessLayer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch a page of documents.
    ///
    /// The pagination summary counts with the same filter un-paginated, so
    /// `data.len() <= limit` and `current_page` echoes the requested page
    /// even past the last one (empty data, not an error). A lookup issues
    /// one extra point read per result document, concurrently; result
    /// order is preserved.
    pub async fn fetch_many(
        &self,
        collection: &str,
        options: FetchOptions,
    ) -> AccessResult<ListEnvelope> {
        let filter = options.filter.normalize_id()?;
        let page = options.page;

        let docs = self
            .store
            .find_many(collection, &filter, &options.sort, page.skip(), page.limit())
            .await?;
        let docs = match &options.lookup {
            Some(lookup) => self.join_all(docs, lookup).await?,
            None => docs,
        };

        let total_docs = self.store.count(collection, &filter).await?;
        tracing::debug!(collection, total_docs, returned = docs.len(), "fetch_many");

        Ok(ListEnvelope::new(
            collection,
            docs,
            &page,
            total_docs,
            options.message,
        ))
    }

    /// Fetch the first matching document.
    ///
    /// A filter matching nothing returns success with null data; it is the
    /// update/delete operations that treat a miss as `DocumentNotFound`.
    pub async fn fetch_one(
        &self,
        collection: &str,
        options: FetchOptions,
    ) -> AccessResult<SingleEnvelope> {
        let filter = options.filter.normalize_id()?;

        let doc = self.store.find_one(collection, &filter).await?;
        let doc = match (doc, &options.lookup) {
            (Some(doc), Some(lookup)) => self.join_one(doc, lookup).await?,
            (Some(doc), None) => doc,
            (None, _) => Value::Null,
        };

        Ok(SingleEnvelope::new(collection, doc, options.message))
    }

    /// Insert a document.
    ///
    /// Contract: the envelope echoes the SUPPLIED payload, not the
    /// persisted document — a store-generated `_id` is not read back.
    /// Callers that need it must perform a follow-up fetch.
    pub async fn create_one(
        &self,
        collection: &str,
        document: Value,
        message: Option<String>,
    ) -> AccessResult<CreateEnvelope> {
        self.store.insert_one(collection, document.clone()).await?;
        tracing::debug!(collection, "create_one");

        Ok(CreateEnvelope::new(collection, document, message))
    }

    /// Atomically update the first matching document and return the pre-
    /// or post-update image per `options.return_new`.
    ///
    /// The filter is required: a miss fails with `DocumentNotFound`, and
    /// an empty filter is refused unless `allow_unfiltered` was set.
    pub async fn update_one(
        &self,
        collection: &str,
        update: Value,
        options: UpdateOptions,
    ) -> AccessResult<UpdateEnvelope> {
        if options.filter.is_empty() && !options.allow_unfiltered {
            return Err(AccessError::DevelopmentError(
                "refusing update_one with an empty filter; set allow_unfiltered to opt in".into(),
            ));
        }
        let filter = options.filter.normalize_id()?;

        match self
            .store
            .find_one_and_update(collection, &filter, &update, options.return_new)
            .await?
        {
            Some(doc) => Ok(UpdateEnvelope::new(
                collection,
                doc,
                options.return_new,
                options.message,
            )),
            None => Err(AccessError::DocumentNotFound(filter.as_value())),
        }
    }

    /// Delete at most one matching document.
    ///
    /// Zero deletions fail with `DocumentNotFound`, so repeated deletes of
    /// the same document never succeed silently. An empty filter is
    /// refused unless `allow_unfiltered` was set.
    pub async fn delete_one(
        &self,
        collection: &str,
        options: DeleteOptions,
    ) -> AccessResult<DeleteEnvelope> {
        if options.filter.is_empty() && !options.allow_unfiltered {
            return Err(AccessError::DevelopmentError(
                "refusing delete_one with an empty filter; set allow_unfiltered to opt in".into(),
            ));
        }
        let filter = options.filter.normalize_id()?;

        if self.store.delete_one(collection, &filter).await? {
            Ok(DeleteEnvelope::new(collection, options.message))
        } else {
            Err(AccessError::DocumentNotFound(filter.as_value()))
        }
    }

    /// Join one related document onto `doc` under the lookup's target
    /// field; no match attaches an explicit null, never omits the field
    async fn join_one(&self, mut doc: Value, lookup: &LookupSpec) -> AccessResult<Value> {
        let local = doc.get(&lookup.local_field).cloned();
        let related = match local {
            None | Some(Value::Null) => Value::Null,
            Some(value) => self
                .store
                .find_one(
                    &lookup.from,
                    &FilterDoc::new().with(&lookup.foreign_field, value),
                )
                .await?
                .unwrap_or(Value::Null),
        };

        if let Some(object) = doc.as_object_mut() {
            object.insert(lookup.target_field().to_string(), related);
        }
        Ok(doc)
    }

    /// Point-lookups issued concurrently, one per result document; the
    /// output preserves the input order
    async fn join_all(&self, docs: Vec<Value>, lookup: &LookupSpec) -> AccessResult<Vec<Value>> {
        try_join_all(docs.into_iter().map(|doc| self.join_one(doc, lookup))).await
    }
}
