//! # Success Envelopes
//!
//! Fixed-shape success responses, one shape per operation kind. Pure
//! constructors with no I/O; the timestamp is captured when the envelope
//! is built, not when the operation started. Envelopes never carry error
//! information.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::options::PageSpec;

const SUCCESS: &str = "success";

/// Envelope for fetch-many, with the pagination summary
#[derive(Debug, Clone, Serialize)]
pub struct ListEnvelope {
    pub status: &'static str,
    pub data: Vec<Value>,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_created_at: DateTime<Utc>,
    #[serde(rename = "totalDocs")]
    pub total_docs: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
    #[serde(rename = "currentPage")]
    pub current_page: u64,
    pub limit: u64,
}

impl ListEnvelope {
    pub fn new(
        table: impl Into<String>,
        data: Vec<Value>,
        page: &PageSpec,
        total_docs: u64,
        message: Option<String>,
    ) -> Self {
        Self {
            status: SUCCESS,
            data,
            table: table.into(),
            message,
            response_created_at: Utc::now(),
            total_docs,
            total_pages: page.total_pages(total_docs),
            current_page: page.page(),
            limit: page.limit(),
        }
    }
}

/// Envelope for fetch-one; `data` is null when nothing matched
#[derive(Debug, Clone, Serialize)]
pub struct SingleEnvelope {
    pub status: &'static str,
    pub data: Value,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_created_at: DateTime<Utc>,
}

impl SingleEnvelope {
    pub fn new(table: impl Into<String>, data: Value, message: Option<String>) -> Self {
        Self {
            status: SUCCESS,
            data,
            table: table.into(),
            message,
            response_created_at: Utc::now(),
        }
    }
}

/// Envelope for create-one; `data` echoes the supplied payload
#[derive(Debug, Clone, Serialize)]
pub struct CreateEnvelope {
    pub status: &'static str,
    pub data: Value,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_created_at: DateTime<Utc>,
}

impl CreateEnvelope {
    pub fn new(table: impl Into<String>, data: Value, message: Option<String>) -> Self {
        Self {
            status: SUCCESS,
            data,
            table: table.into(),
            message,
            response_created_at: Utc::now(),
        }
    }
}

/// Envelope for update-one, recording which image was returned
#[derive(Debug, Clone, Serialize)]
pub struct UpdateEnvelope {
    pub status: &'static str,
    pub data: Value,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_created_at: DateTime<Utc>,
    #[serde(rename = "returnedNew")]
    pub returned_new: bool,
}

impl UpdateEnvelope {
    pub fn new(
        table: impl Into<String>,
        data: Value,
        returned_new: bool,
        message: Option<String>,
    ) -> Self {
        Self {
            status: SUCCESS,
            data,
            table: table.into(),
            message,
            response_created_at: Utc::now(),
            returned_new,
        }
    }
}

/// Envelope for delete-one; carries no document
#[derive(Debug, Clone, Serialize)]
pub struct DeleteEnvelope {
    pub status: &'static str,
    pub data: Value,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_created_at: DateTime<Utc>,
}

impl DeleteEnvelope {
    pub fn new(table: impl Into<String>, message: Option<String>) -> Self {
        Self {
            status: SUCCESS,
            data: Value::Null,
            table: table.into(),
            message,
            response_created_at: Utc::now(),
        }
    }
}
