//! Error handling module for tonie-sync

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for tonie-sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// Domain rule or adapter failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Input directory not found or inaccessible
    #[error("Input path does not exist: {path}")]
    InputPathNotFound { path: String },

    /// Upload to a slot failed
    #[error("Failed to update slot '{slot}': {message}")]
    UploadError { slot: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for tonie-sync operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;
