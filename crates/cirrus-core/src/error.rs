//! Application-wide error type.
//!
//! Every fallible operation in the workspace returns [`AppError`], which
//! carries an [`ErrorKind`] that callers match on instead of inspecting
//! message text.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The resource does not exist, or the caller does not own it. The two
    /// cases are deliberately indistinguishable.
    NotFound,
    /// The request is well-formed but not allowed in the current state.
    InvalidOperation,
    /// A credential check failed.
    Unauthorized,
    /// A uniqueness constraint was violated.
    Conflict,
    /// The storage backend failed while reading object bytes.
    StorageRead,
    /// The storage backend failed while writing or deleting object bytes.
    StorageWrite,
    /// The database rejected or failed a query.
    Database,
    /// The configuration is missing or malformed.
    Configuration,
    /// A value could not be serialized or deserialized.
    Serialization,
    /// An unexpected internal failure.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "NOT_FOUND"),
            ErrorKind::InvalidOperation => write!(f, "INVALID_OPERATION"),
            ErrorKind::Unauthorized => write!(f, "UNAUTHORIZED"),
            ErrorKind::Conflict => write!(f, "CONFLICT"),
            ErrorKind::StorageRead => write!(f, "STORAGE_READ"),
            ErrorKind::StorageWrite => write!(f, "STORAGE_WRITE"),
            ErrorKind::Database => write!(f, "DATABASE"),
            ErrorKind::Configuration => write!(f, "CONFIGURATION"),
            ErrorKind::Serialization => write!(f, "SERIALIZATION"),
            ErrorKind::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The error type shared by every crate in the workspace.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying error while keeping the public message stable.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOperation, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn storage_read(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageRead, message)
    }

    pub fn storage_write(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageWrite, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        // Boxed sources are not cloneable; a cloned error keeps only the
        // kind and message.
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorKind::Serialization, "Serialization failed", err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(ErrorKind::Configuration, "Invalid configuration", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = AppError::not_found("Folder not found");
        assert_eq!(err.to_string(), "NOT_FOUND: Folder not found");
    }

    #[test]
    fn constructors_set_matching_kinds() {
        assert_eq!(AppError::conflict("x").kind, ErrorKind::Conflict);
        assert_eq!(AppError::unauthorized("x").kind, ErrorKind::Unauthorized);
        assert_eq!(AppError::storage_write("x").kind, ErrorKind::StorageWrite);
        assert_eq!(AppError::invalid_operation("x").kind, ErrorKind::InvalidOperation);
    }

    #[test]
    fn clone_drops_source() {
        let io = std::io::Error::other("disk gone");
        let err = AppError::with_source(ErrorKind::StorageRead, "Read failed", io);
        assert!(err.source.is_some());

        let cloned = err.clone();
        assert!(cloned.source.is_none());
        assert_eq!(cloned.kind, ErrorKind::StorageRead);
        assert_eq!(cloned.message, "Read failed");
    }
}
