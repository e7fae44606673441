//! Redis Stack implementation of `DocumentStore`.
//!
//! # Design
//! Documents go through RedisJSON (`JSON.SET` / `JSON.GET` / `JSON.DEL`) and
//! the index through RediSearch (`FT.*`). A single `ConnectionManager` is
//! cloned per command; it multiplexes over one connection and reconnects on
//! its own. Replies are read in RESP2 form.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Cmd, ErrorKind, RedisError, Value};
use todo_core::{DocumentStore, IndexSchema, Query, SearchHit, SearchResult, StoreError};

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Open a managed connection to the Redis server at `url`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(store_error)?;
        let connection = ConnectionManager::new(client).await.map_err(store_error)?;
        tracing::info!("connected to redis");
        Ok(Self { connection })
    }

    async fn query<T: redis::FromRedisValue>(&self, cmd: &Cmd) -> Result<T, StoreError> {
        let mut connection = self.connection.clone();
        cmd.query_async(&mut connection).await.map_err(store_error)
    }
}

fn store_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
        StoreError::Unavailable(e.to_string())
    } else if matches!(e.kind(), ErrorKind::TypeError) {
        StoreError::Malformed(e.to_string())
    } else {
        StoreError::Rejected(e.to_string())
    }
}

/// `FT.CREATE <name> ON JSON PREFIX 1 <prefix> SCHEMA <path> AS <alias> <type> ...`
pub fn create_index_command(schema: &IndexSchema) -> Cmd {
    let mut cmd = redis::cmd("FT.CREATE");
    cmd.arg(&schema.name)
        .arg("ON")
        .arg("JSON")
        .arg("PREFIX")
        .arg(1)
        .arg(&schema.prefix)
        .arg("SCHEMA");
    for field in &schema.fields {
        cmd.arg(&field.path)
            .arg("AS")
            .arg(&field.alias)
            .arg(field.kind.as_str());
    }
    cmd
}

/// `FT.SEARCH <index> <query> [LIMIT 0 <limit>]`
pub fn search_command(index: &str, query: &Query, limit: Option<u64>) -> Cmd {
    let mut cmd = redis::cmd("FT.SEARCH");
    cmd.arg(index).arg(query.to_string());
    if let Some(limit) = limit {
        cmd.arg("LIMIT").arg(0).arg(limit);
    }
    cmd
}

fn malformed(message: impl Into<String>) -> StoreError {
    StoreError::Malformed(message.into())
}

fn string_value(value: Value) -> Result<String, StoreError> {
    match value {
        Value::BulkString(bytes) => {
            String::from_utf8(bytes).map_err(|e| malformed(format!("reply is not utf-8: {e}")))
        }
        Value::SimpleString(text) => Ok(text),
        other => Err(malformed(format!("expected a string, got {other:?}"))),
    }
}

/// Pull the `$` member (the whole JSON document) out of a hit's field list.
fn document_field(fields: Value) -> Result<String, StoreError> {
    let Value::Array(fields) = fields else {
        return Err(malformed("expected a field list"));
    };
    let mut fields = fields.into_iter();
    while let Some(name) = fields.next() {
        let value = fields
            .next()
            .ok_or_else(|| malformed("field list has an odd length"))?;
        if string_value(name)? == "$" {
            return string_value(value);
        }
    }
    Err(malformed("hit carries no `$` document"))
}

/// Decode a RESP2 `FT.SEARCH` reply: `[total, id, [field, value, ...], id, ...]`.
pub fn parse_search_reply(reply: Value) -> Result<SearchResult, StoreError> {
    let Value::Array(items) = reply else {
        return Err(malformed(format!("expected an array reply, got {reply:?}")));
    };
    let mut items = items.into_iter();
    let total = match items.next() {
        Some(Value::Int(total)) if total >= 0 => total as u64,
        other => return Err(malformed(format!("expected a result count, got {other:?}"))),
    };

    let mut hits = Vec::new();
    while let Some(id) = items.next() {
        let id = string_value(id)?;
        let fields = items
            .next()
            .ok_or_else(|| malformed(format!("hit {id} has no fields")))?;
        let json = document_field(fields)?;
        hits.push(SearchHit { id, json });
    }

    Ok(SearchResult { total, hits })
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn json_set(&self, key: &str, path: &str, json: &str) -> Result<(), StoreError> {
        tracing::debug!(key, path, "JSON.SET");
        self.query::<()>(redis::cmd("JSON.SET").arg(key).arg(path).arg(json))
            .await
    }

    async fn json_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        tracing::debug!(key, "JSON.GET");
        self.query(redis::cmd("JSON.GET").arg(key)).await
    }

    async fn json_del(&self, key: &str, path: &str) -> Result<(), StoreError> {
        tracing::debug!(key, path, "JSON.DEL");
        self.query::<i64>(redis::cmd("JSON.DEL").arg(key).arg(path))
            .await
            .map(|_| ())
    }

    async fn list_indexes(&self) -> Result<Vec<String>, StoreError> {
        self.query(&redis::cmd("FT._LIST")).await
    }

    async fn create_index(&self, schema: &IndexSchema) -> Result<(), StoreError> {
        tracing::debug!(index = %schema.name, "FT.CREATE");
        let mut connection = self.connection.clone();
        match create_index_command(schema)
            .query_async::<()>(&mut connection)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().to_lowercase().contains("already exists") => {
                Err(StoreError::IndexExists(schema.name.clone()))
            }
            Err(e) => Err(store_error(e)),
        }
    }

    async fn drop_index(&self, name: &str) -> Result<(), StoreError> {
        tracing::debug!(index = name, "FT.DROPINDEX");
        self.query::<()>(redis::cmd("FT.DROPINDEX").arg(name)).await
    }

    async fn search(&self, index: &str, query: &Query) -> Result<SearchResult, StoreError> {
        if query.matches_nothing() {
            return Ok(SearchResult {
                total: 0,
                hits: Vec::new(),
            });
        }
        tracing::debug!(index, %query, "FT.SEARCH");
        let reply: Value = self.query(&search_command(index, query, None)).await?;
        let result = parse_search_reply(reply)?;
        if result.total <= result.hits.len() as u64 {
            return Ok(result);
        }

        // The default page was short; ask for everything.
        let reply: Value = self
            .query(&search_command(index, query, Some(result.total)))
            .await?;
        parse_search_reply(reply)
    }
}
