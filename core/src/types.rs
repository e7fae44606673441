//! Domain types for todo records.
//!
//! # Design
//! A record exists in two shapes. `TodoDocument` is the flat JSON body stored
//! under a key in the document store (`name`, `status`, `created_date`,
//! `updated_date`); it carries no id because the key is the id. `Todo` is the
//! record handed to callers and serialized in HTTP responses: the document
//! plus the namespaced id it was read from.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TodoError;

/// Progress of a todo. Stored as its external label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TodoStatus {
    #[default]
    #[serde(rename = "todo")]
    NotStarted,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "complete")]
    Complete,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 3] = [Self::NotStarted, Self::InProgress, Self::Complete];

    /// The label written to the store and accepted from callers.
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::NotStarted => "todo",
            TodoStatus::InProgress => "in progress",
            TodoStatus::Complete => "complete",
        }
    }

    /// Resolve an external label. Matching is exact.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == label)
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoStatus {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| TodoError::invalid(format!("invalid status {s:?}")))
    }
}

/// The JSON body persisted for each record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDocument {
    pub name: String,
    pub status: TodoStatus,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl TodoDocument {
    pub fn into_todo(self, id: impl Into<String>) -> Todo {
        Todo {
            id: id.into(),
            name: self.name,
            status: self.status,
            created_date: self.created_date,
            updated_date: self.updated_date,
        }
    }
}

/// A single todo record as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub name: String,
    pub status: TodoStatus,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Todo {
    /// A fresh record: not started, both timestamps equal to `now`.
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: TodoStatus::NotStarted,
            created_date: now,
            updated_date: now,
        }
    }

    pub fn to_document(&self) -> TodoDocument {
        TodoDocument {
            name: self.name.clone(),
            status: self.status,
            created_date: self.created_date,
            updated_date: self.updated_date,
        }
    }

    /// Set `status` and advance `updated_date`.
    ///
    /// `updated_date` always moves strictly forward, even if the wall clock
    /// reads the same instant (or earlier) than the last write.
    pub fn set_status(&mut self, status: TodoStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_date = next_timestamp(self.updated_date, now);
    }
}

fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Collection result for list and search operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Todos {
    pub total: u64,
    pub documents: Vec<Todo>,
}

/// Request payload for creating a todo. An empty or missing `id` asks the
/// service to generate one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTodo {
    #[serde(default)]
    pub id: String,
    pub name: String,
}

/// Request payload for updating a todo's status label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTodo {
    pub status: String,
}

/// Query parameters for search. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchTodos {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}
