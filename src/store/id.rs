//! # Identifier Coercion
//!
//! Documents are addressed by a native UUID identifier carried in the
//! reserved `_id` field as its canonical hyphenated lowercase string.
//! Raw identifier values arriving in filters must be coerced into the
//! native form before they reach the store; coercion fails closed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{AccessError, AccessResult};

/// Reserved identifier field on every document and filter
pub const ID_FIELD: &str = "_id";

/// Native document identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Coerce a raw JSON value into a native identifier.
    ///
    /// Accepts a string holding a UUID in any case. Anything else fails
    /// with `InvalidIdentifier` carrying the offending value. Coercing a
    /// canonical rendering of an already-coerced identifier yields an
    /// equal value.
    pub fn coerce(raw: &Value) -> AccessResult<Self> {
        match raw {
            Value::String(s) => Uuid::parse_str(s)
                .map(Self)
                .map_err(|_| AccessError::InvalidIdentifier(raw.clone())),
            other => Err(AccessError::InvalidIdentifier(other.clone())),
        }
    }

    /// Canonical JSON rendering, as stored in documents
    pub fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Uuid renders hyphenated lowercase
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::coerce(&Value::String(s.to_string()))
    }
}

impl From<Uuid> for DocumentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}
