//! Record management for the todo service.
//!
//! # Overview
//! Todos are JSON documents in an external store that also provides a
//! full-text search index. This crate owns the document schema, identifier
//! normalization, the index lifecycle and the mapping from store failures to
//! the three error classes callers care about.
//!
//! # Design
//! - `TodoRepository` talks to a `DocumentStore` and knows the key layout.
//! - `TodoService` applies input policy and delegates to the repository.
//! - `DocumentStore` is the only I/O seam. `MemoryStore` implements it in
//!   process; the server crate provides a Redis Stack implementation.
//! - Nothing is cached in process. Every call reads the store.

pub mod error;
pub mod memory;
pub mod query;
pub mod repository;
pub mod service;
pub mod store;
pub mod types;

pub use error::{TodoError, TodoResult};
pub use memory::MemoryStore;
pub use query::Query;
pub use repository::{normalize_id, TodoRepository, TODOS_INDEX, TODOS_PREFIX};
pub use service::TodoService;
pub use store::{DocumentStore, IndexSchema, SearchHit, SearchResult, StoreError};
pub use types::{CreateTodo, SearchTodos, Todo, TodoDocument, TodoStatus, Todos, UpdateTodo};
