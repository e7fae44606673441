//! In-process `DocumentStore`.
//!
//! Documents and index definitions live in `tokio::sync::RwLock`-guarded
//! maps. Queries are evaluated on the fly against every document under the
//! index prefix, which is fine for tests and small demos.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::query::Query;
use crate::store::{DocumentStore, IndexSchema, SearchHit, SearchResult, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, Value>>,
    indexes: RwLock<BTreeMap<String, IndexSchema>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored, indexed or not.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

/// Split a `$.a.b` path into its segments. `$` alone is the root.
fn path_segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let rest = path
        .strip_prefix('$')
        .ok_or_else(|| StoreError::Rejected(format!("invalid JSON path {path}")))?;
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    let rest = rest
        .strip_prefix('.')
        .ok_or_else(|| StoreError::Rejected(format!("invalid JSON path {path}")))?;
    Ok(rest.split('.').collect())
}

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = path_segments(path).ok()?;
    segments
        .iter()
        .try_fold(document, |value, segment| value.get(*segment))
}

fn matches(schema: &IndexSchema, document: &Value, query: &Query) -> Result<bool, StoreError> {
    if query.matches_nothing() {
        return Ok(false);
    }
    for clause in query.clauses() {
        let field = schema
            .fields
            .iter()
            .find(|field| field.alias == clause.field)
            .ok_or_else(|| StoreError::Rejected(format!("Unknown field `{}`", clause.field)))?;
        let text = match lookup(document, &field.path) {
            Some(Value::String(text)) => text,
            _ => return Ok(false),
        };
        if !clause.matches(text) {
            return Ok(false);
        }
    }
    Ok(true)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn json_set(&self, key: &str, path: &str, json: &str) -> Result<(), StoreError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| StoreError::Rejected(e.to_string()))?;
        let segments = path_segments(path)?;
        let mut documents = self.documents.write().await;

        let Some((last, parents)) = segments.split_last() else {
            documents.insert(key.to_string(), value);
            return Ok(());
        };

        let document = documents.get_mut(key).ok_or_else(|| {
            StoreError::Rejected("new objects must be created at the root".to_string())
        })?;
        let mut target = document;
        for segment in parents {
            target = target
                .get_mut(*segment)
                .ok_or_else(|| StoreError::Rejected(format!("path {path} does not exist")))?;
        }
        match target {
            Value::Object(object) => {
                object.insert((*last).to_string(), value);
                Ok(())
            }
            _ => Err(StoreError::Rejected(format!("path {path} is not an object member"))),
        }
    }

    async fn json_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.get(key).map(Value::to_string))
    }

    async fn json_del(&self, key: &str, path: &str) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let mut documents = self.documents.write().await;

        let Some((last, parents)) = segments.split_last() else {
            documents.remove(key);
            return Ok(());
        };

        let Some(mut target) = documents.get_mut(key) else {
            return Ok(());
        };
        for segment in parents {
            match target.get_mut(*segment) {
                Some(next) => target = next,
                None => return Ok(()),
            }
        }
        if let Value::Object(object) = target {
            object.remove(*last);
        }
        Ok(())
    }

    async fn list_indexes(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.indexes.read().await.keys().cloned().collect())
    }

    async fn create_index(&self, schema: &IndexSchema) -> Result<(), StoreError> {
        let mut indexes = self.indexes.write().await;
        if indexes.contains_key(&schema.name) {
            return Err(StoreError::IndexExists(schema.name.clone()));
        }
        indexes.insert(schema.name.clone(), schema.clone());
        Ok(())
    }

    async fn drop_index(&self, name: &str) -> Result<(), StoreError> {
        match self.indexes.write().await.remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::Rejected("Unknown Index name".to_string())),
        }
    }

    async fn search(&self, index: &str, query: &Query) -> Result<SearchResult, StoreError> {
        let schema = self
            .indexes
            .read()
            .await
            .get(index)
            .cloned()
            .ok_or_else(|| StoreError::Rejected(format!("{index}: no such index")))?;

        let documents = self.documents.read().await;
        let mut hits = Vec::new();
        for (key, document) in documents.range(schema.prefix.clone()..) {
            if !key.starts_with(&schema.prefix) {
                break;
            }
            if matches(&schema, document, query)? {
                hits.push(SearchHit {
                    id: key.clone(),
                    json: document.to_string(),
                });
            }
        }

        Ok(SearchResult {
            total: hits.len() as u64,
            hits,
        })
    }
}
