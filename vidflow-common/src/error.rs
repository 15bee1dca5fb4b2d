//! Common error types for VidFlow

use thiserror::Error;

use crate::workflow::{Role, VideoStatus};

/// Common result type for VidFlow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the VidFlow crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller's role or identity does not permit the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested status change is not in the role's transition table
    #[error("Transition {from} -> {to} is not allowed for role {role}")]
    InvalidTransition {
        role: Role,
        from: VideoStatus,
        to: VideoStatus,
    },

    /// Uniqueness or state conflict (duplicate name, already claimed, ...)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Failure reported by an external collaborator (YouTube, analysis service)
    #[error("External service error: {0}")]
    External(String),

    /// CSV encoding or decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error for stored documents
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
