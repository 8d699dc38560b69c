//! Access-layer invariant tests
//!
//! Proves the shared operation semantics end-to-end against the memory
//! store:
//! 1. Pagination arithmetic and beyond-range pages
//! 2. The fetch-one-null vs update/delete-not-found asymmetry
//! 3. Lookup joins attaching explicit nulls
//! 4. Identifier coercion failing closed
//! 5. The empty-filter opt-in on destructive operations

use std::sync::Arc;

use serde_json::json;

use docgate::access::{
    AccessLayer, DeleteOptions, FetchOptions, LookupSpec, PageSpec, UpdateOptions,
};
use docgate::errors::AccessError;
use docgate::store::{DocumentId, FilterDoc, MemoryStore, SortKey, ID_FIELD};

fn layer() -> AccessLayer<MemoryStore> {
    AccessLayer::new(Arc::new(MemoryStore::new()))
}

async fn seed(layer: &AccessLayer<MemoryStore>, collection: &str, count: u64) {
    for n in 0..count {
        layer
            .create_one(collection, json!({"n": n}), None)
            .await
            .unwrap();
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// 15 documents, page 2 with limit 10: 5 documents, 2 pages total.
#[tokio::test]
async fn test_second_page_of_fifteen_documents() {
    let layer = layer();
    seed(&layer, "users", 15).await;

    let options = FetchOptions::default().with_page(PageSpec::new(2, 10).unwrap());
    let envelope = layer.fetch_many("users", options).await.unwrap();

    assert_eq!(envelope.data.len(), 5);
    assert_eq!(envelope.total_docs, 15);
    assert_eq!(envelope.total_pages, 2);
    assert_eq!(envelope.current_page, 2);
    assert_eq!(envelope.limit, 10);
}

/// `data.len() <= limit` and `totalPages == ceil(totalDocs / limit)`
/// across windows.
#[tokio::test]
async fn test_pagination_bounds_hold_across_pages() {
    let layer = layer();
    seed(&layer, "rows", 23).await;

    for page in 1..=6 {
        let options = FetchOptions::default()
            .with_page(PageSpec::new(page, 7).unwrap())
            .with_sort(vec![SortKey::asc("n")]);
        let envelope = layer.fetch_many("rows", options).await.unwrap();

        assert!(envelope.data.len() <= 7);
        assert_eq!(envelope.total_pages, 4);
        assert_eq!(envelope.current_page, page);
    }
}

/// A page past the last one is an empty success, not an error.
#[tokio::test]
async fn test_page_beyond_range_is_empty_success() {
    let layer = layer();
    seed(&layer, "rows", 3).await;

    let options = FetchOptions::default().with_page(PageSpec::new(5, 10).unwrap());
    let envelope = layer.fetch_many("rows", options).await.unwrap();

    assert!(envelope.data.is_empty());
    assert_eq!(envelope.current_page, 5);
    assert_eq!(envelope.total_pages, 1);
}

/// The summary counts with the filter, not the whole collection.
#[tokio::test]
async fn test_summary_counts_with_same_filter() {
    let layer = layer();
    seed(&layer, "rows", 10).await;

    let options = FetchOptions::filtered(FilterDoc::new().with("n", json!({"lt": 4})))
        .with_page(PageSpec::new(1, 3).unwrap());
    let envelope = layer.fetch_many("rows", options).await.unwrap();

    assert_eq!(envelope.data.len(), 3);
    assert_eq!(envelope.total_docs, 4);
    assert_eq!(envelope.total_pages, 2);
}

// =============================================================================
// The miss asymmetry
// =============================================================================

/// Fetch-one misses succeed with null data.
#[tokio::test]
async fn test_fetch_one_miss_is_null() {
    let layer = layer();
    let options = FetchOptions::filtered(FilterDoc::new().with("name", json!("nobody")));
    let envelope = layer.fetch_one("users", options).await.unwrap();
    assert!(envelope.data.is_null());

    // And the serialized envelope still carries the data field
    let value = serde_json::to_value(&envelope).unwrap();
    assert!(value.as_object().unwrap().contains_key("data"));
}

/// Update and delete misses are always `DocumentNotFound`.
#[tokio::test]
async fn test_update_and_delete_misses_are_not_found() {
    let layer = layer();
    seed(&layer, "rows", 2).await;

    let miss = FilterDoc::new().with("n", json!(99));
    let update_err = layer
        .update_one("rows", json!({"n": 0}), UpdateOptions::filtered(miss.clone()))
        .await
        .unwrap_err();
    assert!(matches!(update_err, AccessError::DocumentNotFound(_)));

    let delete_err = layer
        .delete_one("rows", DeleteOptions::filtered(miss))
        .await
        .unwrap_err();
    assert!(matches!(delete_err, AccessError::DocumentNotFound(_)));
}

/// A second delete of the same document fails; it never succeeds
/// silently.
#[tokio::test]
async fn test_repeated_delete_fails() {
    let layer = layer();
    layer
        .create_one("posts", json!({"slug": "once"}), None)
        .await
        .unwrap();

    let options = || DeleteOptions::filtered(FilterDoc::new().with("slug", json!("once")));
    layer.delete_one("posts", options()).await.unwrap();
    let err = layer.delete_one("posts", options()).await.unwrap_err();
    assert!(matches!(err, AccessError::DocumentNotFound(_)));
}

// =============================================================================
// Lookup joins
// =============================================================================

/// Joined documents attach under the alias; a missing foreign match
/// attaches an explicit null that survives serialization.
#[tokio::test]
async fn test_lookup_null_is_serialized_not_omitted() {
    let layer = layer();
    let author = DocumentId::generate();
    layer
        .create_one(
            "users",
            json!({ID_FIELD: author.to_string(), "name": "ada"}),
            None,
        )
        .await
        .unwrap();
    layer
        .create_one(
            "posts",
            json!({"title": "a", "author_id": author.to_string()}),
            None,
        )
        .await
        .unwrap();
    layer
        .create_one(
            "posts",
            json!({"title": "b", "author_id": DocumentId::generate().to_string()}),
            None,
        )
        .await
        .unwrap();

    let options = FetchOptions::default()
        .with_sort(vec![SortKey::asc("title")])
        .with_lookup(LookupSpec::new("author_id", "users", ID_FIELD).with_alias("author"));
    let envelope = layer.fetch_many("posts", options).await.unwrap();

    let serialized = serde_json::to_value(&envelope).unwrap();
    assert_eq!(serialized["data"][0]["author"]["name"], "ada");
    // The orphan's alias is present and null in the serialized body
    let orphan = serialized["data"][1].as_object().unwrap();
    assert!(orphan.contains_key("author"));
    assert!(orphan["author"].is_null());
}

/// Fetch-one applies the same join.
#[tokio::test]
async fn test_fetch_one_lookup() {
    let layer = layer();
    let author = DocumentId::generate();
    layer
        .create_one(
            "users",
            json!({ID_FIELD: author.to_string(), "name": "ada"}),
            None,
        )
        .await
        .unwrap();
    layer
        .create_one("posts", json!({"author_id": author.to_string()}), None)
        .await
        .unwrap();

    let options = FetchOptions::default()
        .with_lookup(LookupSpec::new("author_id", "users", ID_FIELD));
    let envelope = layer.fetch_one("posts", options).await.unwrap();
    assert_eq!(envelope.data["author_id"]["name"], "ada");
}

// =============================================================================
// Identifier coercion
// =============================================================================

/// Coercion is idempotent for valid identifiers and fails closed for
/// malformed ones across every operation that takes a filter.
#[tokio::test]
async fn test_id_coercion_across_operations() {
    let layer = layer();
    let bad = FilterDoc::new().with(ID_FIELD, json!("definitely-not-an-id"));

    let fetch_err = layer
        .fetch_many("users", FetchOptions::filtered(bad.clone()))
        .await
        .unwrap_err();
    assert!(matches!(fetch_err, AccessError::InvalidIdentifier(_)));

    let update_err = layer
        .update_one("users", json!({"x": 1}), UpdateOptions::filtered(bad.clone()))
        .await
        .unwrap_err();
    assert!(matches!(update_err, AccessError::InvalidIdentifier(_)));

    let delete_err = layer
        .delete_one("users", DeleteOptions::filtered(bad))
        .await
        .unwrap_err();
    assert!(matches!(delete_err, AccessError::InvalidIdentifier(_)));
}

/// A raw identifier in any case resolves to the same stored document.
#[tokio::test]
async fn test_id_filter_matches_regardless_of_case() {
    let layer = layer();
    let id = DocumentId::generate();
    layer
        .create_one("users", json!({ID_FIELD: id.to_string(), "name": "ada"}), None)
        .await
        .unwrap();

    for raw in [id.to_string(), id.to_string().to_uppercase()] {
        let filter = FilterDoc::new().with(ID_FIELD, json!(raw));
        let envelope = layer
            .fetch_one("users", FetchOptions::filtered(filter))
            .await
            .unwrap();
        assert_eq!(envelope.data["name"], "ada");
    }
}

// =============================================================================
// Destructive-operation guard
// =============================================================================

/// Updates and deletes refuse an empty filter unless explicitly opted
/// in.
#[tokio::test]
async fn test_empty_filter_requires_opt_in() {
    let layer = layer();
    seed(&layer, "rows", 2).await;

    let err = layer
        .update_one(
            "rows",
            json!({"n": 9}),
            UpdateOptions::filtered(FilterDoc::new()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::DevelopmentError(_)));

    let err = layer
        .delete_one("rows", DeleteOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::DevelopmentError(_)));

    let mut delete = DeleteOptions::default();
    delete.allow_unfiltered = true;
    layer.delete_one("rows", delete).await.unwrap();
    assert_eq!(layer.store().len("rows").await, 1);
}

/// Create echoes the supplied payload and conflicts on duplicate ids.
#[tokio::test]
async fn test_create_contract() {
    let layer = layer();
    let envelope = layer
        .create_one("posts", json!({"title": "t"}), None)
        .await
        .unwrap();
    assert_eq!(envelope.data, json!({"title": "t"}));

    let id = DocumentId::generate();
    layer
        .create_one("posts", json!({ID_FIELD: id.to_string()}), None)
        .await
        .unwrap();
    let err = layer
        .create_one("posts", json!({ID_FIELD: id.to_string()}), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::DocumentConflict(_)));
}
