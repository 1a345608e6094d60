//! Common error types used throughout persona.
//!
//! Every crate funnels its failures into [`Error`]. Storage failures from
//! rusqlite and r2d2 are folded into [`Error::Database`] at the query layer,
//! fixture problems carry the offending path, and I/O errors convert directly.

use std::fmt;
use std::path::PathBuf;

/// Common error type for persona.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "feature", "person").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Input data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another party holds the resource (e.g. a live install lease).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A fixture file could not be read or decoded.
    #[error("Fixture error [{}]: {message}", path.display())]
    Fixture {
        /// Path of the fixture file.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// Taking a database backup failed.
    #[error("Backup error: {0}")]
    Backup(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new Conflict error.
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a new Fixture error for the file at `path`.
    pub fn fixture(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Fixture {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new Backup error.
    pub fn backup<S: Into<String>>(msg: S) -> Self {
        Self::Backup(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error came from the storage layer.
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
