//! Error types for cfw-fl
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. The lifecycle taxonomy (PermissionDenied, InvalidTransition,
//! RoleMismatch) is always surfaced synchronously to the caller; persistence
//! errors are classified by trigger type in the save coordinator.

use cfw_common::events::{FolderStatus, ReviewerRole};
use thiserror::Error;

/// Main error type for the folder lifecycle service
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Edit attempted while the folder is read-only for the caller
    #[error("Permission denied: folder is read-only in status {status}")]
    PermissionDenied {
        /// Status the folder was in when the edit was rejected
        status: FolderStatus,
    },

    /// Status action not legal from the current state
    #[error("Invalid transition: {action} is not legal from {from}")]
    InvalidTransition {
        /// Status the folder was in
        from: FolderStatus,
        /// Action that was attempted
        action: String,
    },

    /// Decision attempted by a role that does not own the current stage
    #[error("Role mismatch: {attempted} cannot decide at {status} (stage owner: {expected})")]
    RoleMismatch {
        /// Role that attempted the decision
        attempted: ReviewerRole,
        /// Role that owns the current review stage
        expected: ReviewerRole,
        /// Status the folder was in
        status: FolderStatus,
    },

    /// Folder does not exist
    #[error("Folder not found: {0}")]
    FolderNotFound(uuid::Uuid),

    /// Editing session errors (e.g. session task gone)
    #[error("Session error: {0}")]
    Session(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<cfw_common::Error> for Error {
    fn from(e: cfw_common::Error) -> Self {
        match e {
            cfw_common::Error::Database(e) => Error::Database(e),
            cfw_common::Error::Config(msg) => Error::Config(msg),
            other => Error::Internal(other.to_string()),
        }
    }
}

/// Convenience Result type using cfw-fl Error
pub type Result<T> = std::result::Result<T, Error>;
