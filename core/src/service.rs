//! Record service: input policy in front of the repository.
//!
//! `TodoService` is what the HTTP layer talks to. It normalizes ids, checks
//! required fields and resolves status labels, then hands off to
//! `TodoRepository`. It holds nothing but the repository.

use crate::error::{TodoError, TodoResult};
use crate::repository::{normalize_id, TodoRepository};
use crate::types::{Todo, TodoStatus, Todos};

#[derive(Clone)]
pub struct TodoService {
    repository: TodoRepository,
}

impl TodoService {
    pub fn new(repository: TodoRepository) -> Self {
        Self { repository }
    }

    /// Make sure the search index exists. Run once before serving.
    pub async fn ensure_index(&self) -> TodoResult<()> {
        self.repository.ensure_index().await
    }

    pub async fn all(&self) -> TodoResult<Todos> {
        self.repository.get_all().await
    }

    pub async fn search(&self, name: &str, status: &str) -> TodoResult<Todos> {
        self.repository.search(name, status).await
    }

    pub async fn one(&self, id: &str) -> TodoResult<Todo> {
        self.repository.get_one(&normalize_id(id)).await
    }

    pub async fn create(&self, id: &str, name: &str) -> TodoResult<Todo> {
        if name.trim().is_empty() {
            return Err(TodoError::invalid("todo name must not be empty"));
        }
        let id = if id.is_empty() {
            String::new()
        } else {
            normalize_id(id)
        };
        self.repository.create(&id, name).await
    }

    pub async fn update(&self, id: &str, status: &str) -> TodoResult<Todo> {
        let status = TodoStatus::from_label(status)
            .ok_or_else(|| TodoError::invalid(format!("invalid status {status:?}")))?;
        self.repository
            .update_status(&normalize_id(id), status)
            .await
    }

    pub async fn delete(&self, id: &str) -> TodoResult<()> {
        self.repository.delete(&normalize_id(id)).await
    }

    pub async fn delete_all(&self) -> TodoResult<()> {
        self.repository.delete_all().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::MemoryStore;
    use crate::repository::TODOS_PREFIX;

    async fn service() -> (Arc<MemoryStore>, TodoService) {
        let store = Arc::new(MemoryStore::new());
        let service = TodoService::new(TodoRepository::new(store.clone()));
        service.ensure_index().await.unwrap();
        (store, service)
    }

    #[tokio::test]
    async fn crud_for_a_single_todo() {
        let (_, service) = service().await;

        let created = service.create("abc123", "Take out the trash").await.unwrap();
        assert_eq!(created.id, "todos:abc123");
        assert_eq!(created.name, "Take out the trash");
        assert_eq!(created.status.as_str(), "todo");

        let read = service.one(&created.id).await.unwrap();
        assert_eq!(read, created);

        let updated = service.update("abc123", "complete").await.unwrap();
        assert_eq!(updated.status.as_str(), "complete");
        assert!(updated.updated_date > updated.created_date);
        assert_eq!(service.one("abc123").await.unwrap().status, TodoStatus::Complete);

        service.delete(&updated.id).await.unwrap();
        let err = service.one("todos:abc123").await.unwrap_err();
        assert!(matches!(err, TodoError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_without_id_generates_prefixed_id() {
        let (_, service) = service().await;
        let todo = service.create("", "Walk the dog").await.unwrap();
        assert!(todo.id.starts_with(TODOS_PREFIX));
        assert!(todo.id.len() > TODOS_PREFIX.len());
        assert_eq!(todo.status, TodoStatus::NotStarted);
        assert_eq!(todo.created_date, todo.updated_date);
    }

    #[tokio::test]
    async fn create_keeps_already_prefixed_id() {
        let (_, service) = service().await;
        let todo = service.create("todos:xyz", "x").await.unwrap();
        assert_eq!(todo.id, "todos:xyz");

        let bare = service.create("todos:", "y").await.unwrap();
        assert_eq!(bare.id, "todos:");
        assert_eq!(service.one("todos:").await.unwrap(), bare);
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let (store, service) = service().await;
        for name in ["", "   "] {
            let err = service.create("abc", name).await.unwrap_err();
            assert!(matches!(err, TodoError::Invalid(_)));
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_rejects_unknown_label() {
        let (_, service) = service().await;
        let created = service.create("abc", "x").await.unwrap();
        for label in ["done", "Complete", "", "in-progress"] {
            let err = service.update("abc", label).await.unwrap_err();
            assert!(matches!(err, TodoError::Invalid(_)), "{label:?}");
        }
        assert_eq!(service.one("abc").await.unwrap(), created);
    }

    #[tokio::test]
    async fn any_status_is_reachable_from_any_other() {
        let (_, service) = service().await;
        service.create("abc", "x").await.unwrap();
        let mut last = service.one("abc").await.unwrap().updated_date;
        for label in ["complete", "todo", "in progress", "in progress", "complete"] {
            let todo = service.update("abc", label).await.unwrap();
            assert_eq!(todo.status.as_str(), label);
            assert!(todo.updated_date > last);
            last = todo.updated_date;
        }
    }

    #[tokio::test]
    async fn search_returns_matching_records_only() {
        let (_, service) = service().await;
        let trash = service.create("", "Take out the trash").await.unwrap();
        service.create("", "Walk the dog").await.unwrap();

        let found = service.search("trash", "").await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.documents, vec![trash]);
    }

    #[tokio::test]
    async fn list_then_delete_all() {
        let (_, service) = service().await;
        for name in ["a", "b", "c", "d", "e"] {
            service.create("", name).await.unwrap();
        }
        let all = service.all().await.unwrap();
        assert_eq!(all.total, 5);
        assert_eq!(all.documents.len(), 5);

        service.delete_all().await.unwrap();
        assert_eq!(service.all().await.unwrap().total, 0);
    }
}
