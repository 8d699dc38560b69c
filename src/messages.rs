//! # Localized Error Messages
//!
//! An immutable-after-init catalog of per-language message templates,
//! consulted when errors are rendered at the boundary. The default
//! language must cover every taxonomy kind; other languages may be
//! partial and fall back to the default rendering.

use std::collections::HashMap;

use crate::errors::{kind, AccessError};

/// Language tag used when no catalog language matches
pub const DEFAULT_LANGUAGE: &str = "en";

/// Placeholder substituted with the error's payload, if any
const PAYLOAD_SLOT: &str = "{payload}";

/// Per-language message tables, frozen at construction
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    default_language: String,
    tables: HashMap<String, HashMap<&'static str, String>>,
}

impl MessageCatalog {
    /// Catalog with the built-in default-language table
    pub fn builtin() -> Self {
        let mut table = HashMap::new();
        table.insert(kind::INVALID_IDENTIFIER, "Invalid identifier: {payload}".to_string());
        table.insert(
            kind::DOCUMENT_NOT_FOUND,
            "No document was found matching {payload}".to_string(),
        );
        table.insert(
            kind::DOCUMENT_CONFLICT,
            "A document with these values already exists".to_string(),
        );
        table.insert(
            kind::NOT_LOGGED_IN,
            "You are not logged in. Please log in to get access".to_string(),
        );
        table.insert(kind::INVALID_TOKEN, "Invalid token. Please log in again".to_string());
        table.insert(
            kind::TOKEN_EXPIRED,
            "Your token is outside its validity window ({payload}). Please log in again"
                .to_string(),
        );
        table.insert(
            kind::USER_NO_LONGER_EXISTS,
            "The user belonging to this token no longer exists".to_string(),
        );
        table.insert(
            kind::PERMISSION_DENIED,
            "You do not have permission to access {payload}".to_string(),
        );
        table.insert(kind::DEVELOPMENT_ERROR, "Something went wrong".to_string());

        let mut tables = HashMap::new();
        tables.insert(DEFAULT_LANGUAGE.to_string(), table);

        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
            tables,
        }
    }

    /// Start building a catalog on top of the built-in default table
    pub fn builder() -> MessageCatalogBuilder {
        MessageCatalogBuilder {
            catalog: Self::builtin(),
        }
    }

    /// Render the message for a kind in the requested language.
    ///
    /// Falls back to the default language when the requested language has
    /// no table or no translation for the kind, and to the kind key itself
    /// if even the default table lacks it.
    pub fn render(&self, kind: &str, language: Option<&str>, payload: Option<&str>) -> String {
        let template = language
            .and_then(|lang| self.tables.get(lang))
            .and_then(|table| table.get(kind))
            .or_else(|| {
                self.tables
                    .get(&self.default_language)
                    .and_then(|table| table.get(kind))
            });

        match template {
            Some(template) => match payload {
                Some(payload) => template.replace(PAYLOAD_SLOT, payload),
                None => template.clone(),
            },
            None => kind.to_string(),
        }
    }

    /// The language used when no requested language matches
    pub fn default_language(&self) -> &str {
        &self.default_language
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Builder layering extra languages onto the built-in table
pub struct MessageCatalogBuilder {
    catalog: MessageCatalog,
}

impl MessageCatalogBuilder {
    /// Add or extend a language table
    pub fn language<I, K>(mut self, tag: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, K)>,
        K: Into<String>,
    {
        let table = self.catalog.tables.entry(tag.into()).or_default();
        for (kind, template) in entries {
            table.insert(kind, template.into());
        }
        self
    }

    /// Freeze the catalog. Fails when the default language does not cover
    /// every taxonomy kind.
    pub fn build(self) -> Result<MessageCatalog, AccessError> {
        let default_table = self
            .catalog
            .tables
            .get(&self.catalog.default_language)
            .ok_or_else(|| {
                AccessError::DevelopmentError("message catalog has no default-language table".into())
            })?;
        for required in kind::ALL {
            if !default_table.contains_key(required) {
                return Err(AccessError::DevelopmentError(format!(
                    "message catalog default language is missing kind '{required}'"
                )));
            }
        }
        Ok(self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_all_kinds() {
        let catalog = MessageCatalog::builder().build().unwrap();
        for k in kind::ALL {
            let rendered = catalog.render(k, None, Some("x"));
            assert_ne!(rendered, *k, "kind {k} fell through to its key");
        }
    }

    #[test]
    fn test_payload_substitution() {
        let catalog = MessageCatalog::builtin();
        let msg = catalog.render(kind::PERMISSION_DENIED, None, Some("/api/v1/users"));
        assert_eq!(msg, "You do not have permission to access /api/v1/users");
    }

    #[test]
    fn test_unknown_language_falls_back_to_default() {
        let catalog = MessageCatalog::builtin();
        let fallback = catalog.render(kind::NOT_LOGGED_IN, Some("xx"), None);
        let default = catalog.render(kind::NOT_LOGGED_IN, None, None);
        assert_eq!(fallback, default);
    }

    #[test]
    fn test_partial_language_falls_back_per_kind() {
        let catalog = MessageCatalog::builder()
            .language("de", [(kind::NOT_LOGGED_IN, "Sie sind nicht angemeldet")])
            .build()
            .unwrap();

        assert_eq!(
            catalog.render(kind::NOT_LOGGED_IN, Some("de"), None),
            "Sie sind nicht angemeldet"
        );
        // Untranslated kind renders in the default language
        assert_eq!(
            catalog.render(kind::INVALID_TOKEN, Some("de"), None),
            catalog.render(kind::INVALID_TOKEN, None, None)
        );
    }
}
