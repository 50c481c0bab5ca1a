//! Storage layer for the RBAC engine
//!
//! The engine is storage-agnostic: every component talks to a
//! [`DocumentStore`], a per-collection document contract (insert, lookup,
//! filtered find with skip/limit/sort, field update, delete, count). The
//! in-process [`MemoryStore`] backs tests and embedded use; production
//! adapters implement the same trait over a real document database.

pub mod memory;

pub use memory::MemoryStore;

use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Collection names used by the engine. These match the stored data layout
/// of existing deployments and must not be renamed.
pub mod collections {
    /// Permission documents
    pub const PERMISSIONS: &str = "permissions";
    /// Role documents
    pub const ROLES: &str = "roles";
    /// Menu documents
    pub const MENUS: &str = "menus";
    /// User-role binding documents
    pub const USER_ROLES: &str = "user_roles";
}

/// A single filter condition on a document field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the given value (a missing field compares as null)
    Eq(String, Value),
    /// String field contains the given substring, case-insensitive
    ContainsCi(String, String),
    /// Array field contains the given value
    ArrayContains(String, Value),
}

/// A conjunction of filter conditions; an empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.into(), value.into()));
        self
    }

    /// Add a case-insensitive substring condition
    pub fn contains_ci(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::ContainsCi(field.into(), needle.into()));
        self
    }

    /// Add an array-membership condition
    pub fn array_contains(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::ArrayContains(field.into(), value.into()));
        self
    }

    /// The conditions making up this filter
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether this filter has no conditions
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Sort direction for a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

/// A sort key; keys earlier in the slice take precedence
#[derive(Debug, Clone)]
pub struct SortKey {
    /// Document field to sort on
    pub field: String,
    /// Sort direction
    pub order: SortOrder,
}

impl SortKey {
    /// Ascending sort on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    /// Descending sort on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Skip/limit pagination window
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// Number of matching documents to skip
    pub skip: usize,
    /// Maximum number of documents to return
    pub limit: usize,
}

impl Page {
    /// Create a pagination window
    pub fn new(skip: usize, limit: usize) -> Self {
        Self { skip, limit }
    }

    /// A window returning at most the first `limit` documents
    pub fn first(limit: usize) -> Self {
        Self { skip: 0, limit }
    }

    /// A window returning every matching document
    pub fn all() -> Self {
        Self {
            skip: 0,
            limit: usize::MAX,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
        }
    }
}

/// Per-collection document persistence contract.
///
/// Documents are JSON objects carrying a string `id` field. Implementations
/// must assign a fresh id on insert when the document has none, and must
/// apply sort keys in order before the pagination window.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Insert a document, returning its id
    async fn insert(&self, collection: &str, doc: Value) -> Result<String>;

    /// Fetch a document by id
    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Fetch documents matching `filter`, sorted then paginated
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        page: Page,
        sort: &[SortKey],
    ) -> Result<Vec<Value>>;

    /// Set the given fields on the document with id `id`, returning the
    /// matched count (0 when the id does not resolve)
    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<u64>;

    /// Delete the document with id `id`, returning the deleted count
    async fn delete(&self, collection: &str, id: &str) -> Result<u64>;

    /// Delete every document matching `filter`, returning the deleted count
    async fn delete_by_filter(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Count documents matching `filter`
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;
}
