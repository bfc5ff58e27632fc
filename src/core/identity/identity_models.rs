// Identity domain models and the error type every collaborator speaks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An authenticated account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }
}

/// A signed-in session returned by the auth provider.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: User,
}

// ============================================================================
// ERRORS
// ============================================================================

/// Failure reported by an external collaborator (data API, object store,
/// identity provider).
///
/// `Conflict` is the only variant the core translates specially; everything
/// else is propagated unchanged to the caller.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A uniqueness constraint rejected the write.
    #[error("Duplicate record{}", constraint_suffix(.constraint))]
    Conflict { constraint: Option<String> },

    #[error("Not authorized")]
    Unauthorized,

    #[error("Record not found")]
    NotFound,

    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

fn constraint_suffix(constraint: &Option<String>) -> String {
    constraint
        .as_deref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default()
}

impl BackendError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, BackendError::Conflict { .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => BackendError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => BackendError::Conflict {
                constraint: db.constraint().map(str::to_string),
            },
            _ => BackendError::Storage(err.to_string()),
        }
    }
}
