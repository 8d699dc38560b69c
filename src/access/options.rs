//! # Operation Options
//!
//! The per-operation options contract shared by the access operations.
//! Shapes are enforced by the type system: a page or limit of zero is
//! unrepresentable through the validated constructor, and destructive
//! operations must opt in explicitly before an empty filter is accepted.

use crate::errors::{AccessError, AccessResult};
use crate::store::{FilterDoc, SortKey};

/// Pagination window. `page` and `limit` are both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    page: u64,
    limit: u64,
}

impl PageSpec {
    pub const DEFAULT_PAGE: u64 = 1;
    pub const DEFAULT_LIMIT: u64 = 20;

    /// Validated constructor; zero values are rejected
    pub fn new(page: u64, limit: u64) -> AccessResult<Self> {
        if page == 0 || limit == 0 {
            return Err(AccessError::DevelopmentError(
                "page and limit must both be at least 1".into(),
            ));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of documents skipped before this page starts
    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    /// Total pages needed for `total_docs` documents
    pub fn total_pages(&self, total_docs: u64) -> u64 {
        total_docs.div_ceil(self.limit)
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// A single-hop foreign-key join applied per result document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSpec {
    /// Field on the result document holding the foreign key
    pub local_field: String,
    /// Collection the related document is fetched from
    pub from: String,
    /// Field on the foreign document matched against the local value
    pub foreign_field: String,
    /// Field the related document is attached under; defaults to `local_field`
    pub alias: Option<String>,
}

impl LookupSpec {
    pub fn new(
        local_field: impl Into<String>,
        from: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Self {
            local_field: local_field.into(),
            from: from.into(),
            foreign_field: foreign_field.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The field the joined document lands under
    pub fn target_field(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.local_field)
    }
}

/// Options for fetch-many and fetch-one
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Empty filter matches every document
    pub filter: FilterDoc,
    pub page: PageSpec,
    pub sort: Vec<SortKey>,
    pub lookup: Option<LookupSpec>,
    pub message: Option<String>,
}

impl FetchOptions {
    pub fn filtered(filter: FilterDoc) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: PageSpec) -> Self {
        self.page = page;
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_lookup(mut self, lookup: LookupSpec) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Options for update-one. The filter is required: an empty filter is
/// refused unless `allow_unfiltered` is set explicitly.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub filter: FilterDoc,
    /// Return the post-update document instead of the pre-update one
    pub return_new: bool,
    pub message: Option<String>,
    /// Explicit opt-in for an empty filter (matches an arbitrary document)
    pub allow_unfiltered: bool,
}

impl UpdateOptions {
    pub fn filtered(filter: FilterDoc) -> Self {
        Self {
            filter,
            return_new: true,
            message: None,
            allow_unfiltered: false,
        }
    }

    pub fn returning_old(mut self) -> Self {
        self.return_new = false;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Options for delete-one; same empty-filter opt-in as updates
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    pub filter: FilterDoc,
    pub message: Option<String>,
    pub allow_unfiltered: bool,
}

impl DeleteOptions {
    pub fn filtered(filter: FilterDoc) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
}
