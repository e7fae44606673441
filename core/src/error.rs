//! Error types for record management.
//!
//! # Design
//! Callers only ever need to tell three situations apart: their input was
//! wrong, the record does not exist, or the store misbehaved. Each variant's
//! `Display` is safe to show to a client. The store failure behind an
//! `Unknown` is kept as the error `source` so it can be logged without being
//! leaked into a response body.

use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by `TodoRepository` and `TodoService`.
#[derive(Debug, Error)]
pub enum TodoError {
    /// Caller input violates a precondition (empty name, unknown status).
    #[error("{0}")]
    Invalid(String),

    /// The referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The store failed unexpectedly.
    #[error("{message}")]
    Unknown {
        message: String,
        #[source]
        source: StoreError,
    },
}

impl TodoError {
    pub fn invalid(message: impl Into<String>) -> Self {
        TodoError::Invalid(message.into())
    }

    pub fn not_found(id: &str) -> Self {
        TodoError::NotFound(format!("todo {id} not found"))
    }

    pub fn unknown(message: impl Into<String>, source: StoreError) -> Self {
        TodoError::Unknown {
            message: message.into(),
            source,
        }
    }

    /// Translate a failed store write. A payload the store refuses is the
    /// caller's problem; anything else is ours.
    pub fn from_write(message: impl Into<String>, source: StoreError) -> Self {
        let message: String = message.into();
        match source {
            StoreError::Rejected(reason) => TodoError::Invalid(format!("{message}: {reason}")),
            other => TodoError::unknown(message, other),
        }
    }

    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            TodoError::Invalid(_) => "invalid",
            TodoError::NotFound(_) => "not_found",
            TodoError::Unknown { .. } => "unknown",
        }
    }
}

pub type TodoResult<T> = Result<T, TodoError>;
