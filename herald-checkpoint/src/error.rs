//! Error types for the herald-checkpoint crate.
//!
//! This module provides typed error handling for checkpoint operations
//! including file I/O, serialization, and path validation.

use std::io;

use thiserror::Error;

/// Top-level checkpoint error type.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// I/O operation failed (file read/write/rename).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Checkpoint directory validation failed.
    #[error("Checkpoint validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Internal error (lock poisoning, injected failures).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Serialization and deserialization errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// Bincode serialization failed.
    #[error("Bincode encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Bincode deserialization failed.
    #[error("Bincode decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// The record decoded but did not consume the whole file.
    #[error("Corrupted checkpoint data: {0}")]
    Corrupted(String),
}

/// Checkpoint location validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Path escapes its parent with `..`.
    #[error("Checkpoint path cannot contain '..' components: {0}")]
    ParentDir(String),

    /// Path points into a system directory.
    #[error("Checkpoint path cannot be in system directory {prefix}: {path}")]
    SystemDirectory { prefix: String, path: String },

    /// Path exists but is not a directory.
    #[error("Checkpoint path is not a directory: {0}")]
    NotDirectory(String),

    /// A list key contains characters that are unsafe in a file name.
    #[error("Invalid checkpoint key: {0}")]
    InvalidKey(String),
}

/// Specialized `Result` type for checkpoint operations.
pub type Result<T> = std::result::Result<T, CheckpointError>;

impl<T> From<std::sync::PoisonError<T>> for CheckpointError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}
