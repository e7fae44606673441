//! Record repository: index lifecycle and raw store I/O for todos.
//!
//! # Design
//! `TodoRepository` owns everything store-shaped about a todo: the key
//! namespace, the search index definition, the JSON document layout and the
//! translation of `StoreError`s into `TodoError`s. It keeps no copy of any
//! record; every call reads the store afresh. Construction does no I/O;
//! callers run `ensure_index` once before serving traffic.
//!
//! Writes are plain overwrites. `update` is a read followed by an
//! independent write, so concurrent updates of one record resolve as last
//! writer wins.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{TodoError, TodoResult};
use crate::query::Query;
use crate::store::{DocumentStore, IndexSchema, SearchResult, StoreError};
use crate::types::{Todo, TodoDocument, TodoStatus, Todos};

/// Name of the search index over todo documents.
pub const TODOS_INDEX: &str = "todos-idx";

/// Key namespace every todo id carries.
pub const TODOS_PREFIX: &str = "todos:";

/// JSON path addressing a whole document.
const ROOT: &str = "$";

/// Prefix `id` with the todo namespace unless it already carries it.
pub fn normalize_id(id: &str) -> String {
    if id.starts_with(TODOS_PREFIX) {
        id.to_string()
    } else {
        format!("{TODOS_PREFIX}{id}")
    }
}

/// A new random id token, without the namespace.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Normalize a caller-supplied id for creation, generating one when the
/// caller gave none.
fn creation_id(id: &str) -> String {
    if id.is_empty() {
        normalize_id(&generate_id())
    } else {
        normalize_id(id)
    }
}

fn parse_todo(id: &str, raw: &str) -> TodoResult<Todo> {
    match serde_json::from_str::<TodoDocument>(raw) {
        Ok(document) => Ok(document.into_todo(id)),
        Err(e) => {
            tracing::warn!(id, error = %e, "stored todo does not decode");
            Err(TodoError::unknown(
                format!("failed to read todo {id}"),
                StoreError::Malformed(e.to_string()),
            ))
        }
    }
}

fn collect(result: SearchResult) -> TodoResult<Todos> {
    let documents = result
        .hits
        .iter()
        .map(|hit| parse_todo(&hit.id, &hit.json))
        .collect::<TodoResult<Vec<_>>>()?;
    Ok(Todos {
        total: result.total,
        documents,
    })
}

#[derive(Clone)]
pub struct TodoRepository {
    store: Arc<dyn DocumentStore>,
}

impl TodoRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// `todos-idx`: JSON documents under `todos:` with full-text `name` and
    /// `status` fields.
    pub fn schema() -> IndexSchema {
        IndexSchema::new(TODOS_INDEX, TODOS_PREFIX)
            .text_field("$.name", "name")
            .text_field("$.status", "status")
    }

    async fn have_index(&self) -> TodoResult<bool> {
        let indexes = self
            .store
            .list_indexes()
            .await
            .map_err(|e| TodoError::unknown("failed to list search indexes", e))?;
        Ok(indexes.iter().any(|name| name == TODOS_INDEX))
    }

    /// Create the search index unless it already exists.
    pub async fn ensure_index(&self) -> TodoResult<()> {
        if self.have_index().await? {
            return Ok(());
        }

        match self.store.create_index(&Self::schema()).await {
            Ok(()) => {
                tracing::info!(index = TODOS_INDEX, "created search index");
                Ok(())
            }
            Err(StoreError::IndexExists(_)) => Ok(()),
            Err(e) => Err(TodoError::unknown("failed to create search index", e)),
        }
    }

    /// Drop the search index if present. Documents are left in place.
    pub async fn drop_index(&self) -> TodoResult<()> {
        if !self.have_index().await? {
            return Ok(());
        }

        self.store
            .drop_index(TODOS_INDEX)
            .await
            .map_err(|e| TodoError::unknown("failed to drop search index", e))?;
        tracing::info!(index = TODOS_INDEX, "dropped search index");
        Ok(())
    }

    pub async fn get_all(&self) -> TodoResult<Todos> {
        let result = self
            .store
            .search(TODOS_INDEX, &Query::match_all())
            .await
            .map_err(|e| TodoError::unknown("failed to list todos", e))?;
        collect(result)
    }

    pub async fn get_one(&self, id: &str) -> TodoResult<Todo> {
        let id = normalize_id(id);
        let raw = self
            .store
            .json_get(&id)
            .await
            .map_err(|e| TodoError::unknown(format!("failed to read todo {id}"), e))?;

        match raw {
            Some(raw) if !raw.trim().is_empty() => parse_todo(&id, &raw),
            _ => Err(TodoError::not_found(&id)),
        }
    }

    /// Search by `name` and/or `status`; empty arguments are ignored, and
    /// with both empty this lists everything. An argument with no searchable
    /// terms matches nothing.
    pub async fn search(&self, name: &str, status: &str) -> TodoResult<Todos> {
        let query = Query::match_all().and("name", name).and("status", status);
        if query.matches_nothing() {
            tracing::debug!(name, status, "search has no searchable terms");
            return Ok(Todos {
                total: 0,
                documents: Vec::new(),
            });
        }
        tracing::debug!(%query, "searching todos");

        let result = self
            .store
            .search(TODOS_INDEX, &query)
            .await
            .map_err(|e| TodoError::unknown("failed to search todos", e))?;
        collect(result)
    }

    pub async fn create(&self, id: &str, name: &str) -> TodoResult<Todo> {
        if name.trim().is_empty() {
            return Err(TodoError::invalid("todo name must not be empty"));
        }

        let todo = Todo::new(creation_id(id), name, Utc::now());
        self.write(&todo).await?;
        tracing::debug!(id = %todo.id, "created todo");
        Ok(todo)
    }

    /// Set the status of a todo from its external label.
    pub async fn update(&self, id: &str, status: &str) -> TodoResult<Todo> {
        let status: TodoStatus = status.parse()?;
        self.update_status(id, status).await
    }

    /// Set the status of a todo. Reads the record, then writes it back whole.
    pub async fn update_status(&self, id: &str, status: TodoStatus) -> TodoResult<Todo> {
        let mut todo = self.get_one(id).await?;
        todo.set_status(status, Utc::now());
        self.write(&todo).await?;
        tracing::debug!(id = %todo.id, %status, "updated todo");
        Ok(todo)
    }

    /// Delete a todo. Deleting an id that does not exist succeeds.
    pub async fn delete(&self, id: &str) -> TodoResult<()> {
        let id = normalize_id(id);
        self.store
            .json_del(&id, ROOT)
            .await
            .map_err(|e| TodoError::unknown(format!("failed to delete todo {id}"), e))
    }

    /// Delete every indexed todo, one at a time. Stops at the first failure;
    /// records deleted before it stay deleted.
    pub async fn delete_all(&self) -> TodoResult<()> {
        let todos = self.get_all().await?;

        for (deleted, todo) in todos.documents.iter().enumerate() {
            if let Err(e) = self.store.json_del(&todo.id, ROOT).await {
                tracing::error!(id = %todo.id, deleted, error = %e, "aborting delete of all todos");
                return Err(TodoError::unknown(
                    format!("failed to delete todo {} after deleting {deleted}", todo.id),
                    e,
                ));
            }
        }

        tracing::debug!(count = todos.documents.len(), "deleted all todos");
        Ok(())
    }

    async fn write(&self, todo: &Todo) -> TodoResult<()> {
        let json = serde_json::to_string(&todo.to_document()).map_err(|e| {
            TodoError::unknown(
                format!("failed to encode todo {}", todo.id),
                StoreError::Malformed(e.to_string()),
            )
        })?;
        self.store
            .json_set(&todo.id, ROOT, &json)
            .await
            .map_err(|e| TodoError::from_write(format!("failed to save todo {}", todo.id), e))
    }
}
