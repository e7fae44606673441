//! Record lifecycle against a live Redis Stack server.
//!
//! These need RedisJSON and RediSearch at `REDIS_URL` (default
//! `redis://localhost:6379`) and are skipped by default. Run them with
//! `cargo test -p todo-server --test redis_store -- --ignored --test-threads=1`.
//! They delete every todo and rebuild the index, so do not point them at
//! data you care about.

use std::collections::HashSet;
use std::sync::Arc;

use todo_core::{TodoError, TodoRepository, TodoService, TodoStatus};
use todo_server::config::DEFAULT_REDIS_URL;
use todo_server::RedisStore;

async fn fresh_repository() -> TodoRepository {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());
    let store = RedisStore::connect(&url).await.unwrap();
    let repository = TodoRepository::new(Arc::new(store));
    repository.ensure_index().await.unwrap();
    repository.delete_all().await.unwrap();
    repository
}

async fn cleanup(repository: &TodoRepository) {
    repository.delete_all().await.unwrap();
    repository.drop_index().await.unwrap();
    repository.ensure_index().await.unwrap();
}

#[tokio::test]
#[ignore = "needs a Redis Stack server"]
async fn crud_for_a_single_todo() {
    let repository = fresh_repository().await;
    let service = TodoService::new(repository.clone());

    let todo = service.create("todos:abc123", "Take out the trash").await.unwrap();
    assert_eq!(todo.id, "todos:abc123");
    assert_eq!(todo.status, TodoStatus::NotStarted);

    let read = service.one(&todo.id).await.unwrap();
    assert_eq!(read, todo);

    let updated = service.update("abc123", "complete").await.unwrap();
    assert_eq!(updated.status, TodoStatus::Complete);
    assert!(updated.updated_date > updated.created_date);

    service.delete(&updated.id).await.unwrap();
    assert!(matches!(
        service.one("abc123").await.unwrap_err(),
        TodoError::NotFound(_)
    ));

    cleanup(&repository).await;
}

#[tokio::test]
#[ignore = "needs a Redis Stack server"]
async fn create_and_read_many_todos() {
    let repository = fresh_repository().await;

    // More than the default FT.SEARCH page of ten.
    let names: Vec<String> = (0..15).map(|i| format!("Chore number {i}")).collect();
    for (i, name) in names.iter().enumerate() {
        repository.create(&i.to_string(), name).await.unwrap();
    }

    let all = repository.get_all().await.unwrap();
    assert_eq!(all.total, names.len() as u64);
    assert_eq!(all.documents.len(), names.len());
    let listed: HashSet<_> = all.documents.iter().map(|t| t.name.clone()).collect();
    assert_eq!(listed, names.iter().cloned().collect());

    cleanup(&repository).await;
}

#[tokio::test]
#[ignore = "needs a Redis Stack server"]
async fn search_by_name_and_status() {
    let repository = fresh_repository().await;
    let trash = repository.create("1", "Take out the trash").await.unwrap();
    repository.create("2", "Walk the dog").await.unwrap();
    repository.update("2", "in progress").await.unwrap();

    let found = repository.search("trash", "").await.unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.documents[0].id, trash.id);

    let found = repository.search("", "in progress").await.unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.documents[0].id, "todos:2");

    cleanup(&repository).await;
}

#[tokio::test]
#[ignore = "needs a Redis Stack server"]
async fn search_follows_the_index_tokenizer() {
    let repository = fresh_repository().await;
    let bug = repository.create("1", "Fix snake_case bug").await.unwrap();
    repository.create("2", "Take out the trash").await.unwrap();

    let found = repository.search("snake_case", "").await.unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.documents[0].id, bug.id);

    assert_eq!(repository.search("snake", "").await.unwrap().total, 0);
    assert_eq!(repository.search("the", "").await.unwrap().total, 0);
    assert_eq!(repository.search("!!!", "").await.unwrap().total, 0);

    let found = repository.search("take the", "").await.unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.documents[0].name, "Take out the trash");

    cleanup(&repository).await;
}
