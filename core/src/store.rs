//! The document store boundary.
//!
//! # Design
//! The repository needs very little from its backend: JSON documents by key,
//! a secondary index over some of their fields, and a query against that
//! index. `DocumentStore` captures exactly that surface so the record logic
//! can run against Redis Stack in production and `MemoryStore` in tests.
//! Implementations are shared across request tasks behind an `Arc`, so they
//! take `&self` and do their own synchronization.

use async_trait::async_trait;
use thiserror::Error;

use crate::query::Query;

/// Failures reported by a `DocumentStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the connection broke mid-command.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store understood the command and refused it.
    #[error("store rejected command: {0}")]
    Rejected(String),

    /// The reply, or a stored document, could not be decoded.
    #[error("malformed store data: {0}")]
    Malformed(String),

    /// An index with this name is already defined.
    #[error("index {0} already exists")]
    IndexExists(String),
}

/// Indexed field type. Only full-text fields are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "TEXT",
        }
    }
}

/// One indexed field: a JSON path in the document exposed under `alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    pub path: String,
    pub alias: String,
    pub kind: FieldKind,
}

/// Definition of a search index over JSON documents whose key starts with
/// `prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub name: String,
    pub prefix: String,
    pub fields: Vec<IndexField>,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            fields: Vec::new(),
        }
    }

    pub fn text_field(mut self, path: impl Into<String>, alias: impl Into<String>) -> Self {
        self.fields.push(IndexField {
            path: path.into(),
            alias: alias.into(),
            kind: FieldKind::Text,
        });
        self
    }
}

/// A matched document: its key and raw JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub json: String,
}

/// Result of running a query. `total` is the store's own count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResult {
    pub total: u64,
    pub hits: Vec<SearchHit>,
}

/// Key/value JSON document store with secondary-index search.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Write `json` at `path` of the document stored under `key`.
    async fn json_set(&self, key: &str, path: &str, json: &str) -> Result<(), StoreError>;

    /// Read the whole document under `key`, or `None` if there is none.
    async fn json_get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Delete `path` of the document under `key`. Missing keys are not an error.
    async fn json_del(&self, key: &str, path: &str) -> Result<(), StoreError>;

    async fn list_indexes(&self) -> Result<Vec<String>, StoreError>;

    async fn create_index(&self, schema: &IndexSchema) -> Result<(), StoreError>;

    async fn drop_index(&self, name: &str) -> Result<(), StoreError>;

    /// Run `query` against `index`, returning every match.
    async fn search(&self, index: &str, query: &Query) -> Result<SearchResult, StoreError>;
}
