//! # Access Layer
//!
//! Uniform data-access operations over named collections: fetch-many,
//! fetch-one, create-one, update-one, delete-one, sharing a common
//! options contract (filter, pagination, sort, single-hop lookup) and a
//! fixed success-envelope shape per operation kind.

pub mod engine;
pub mod envelope;
pub mod options;

pub use engine::AccessLayer;
pub use envelope::{CreateEnvelope, DeleteEnvelope, ListEnvelope, SingleEnvelope, UpdateEnvelope};
pub use options::{DeleteOptions, FetchOptions, LookupSpec, PageSpec, UpdateOptions};
