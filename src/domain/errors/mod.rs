// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// No recognized input files
    EmptyInput(String),
    /// Malformed advisory input (silence transcripts); callers fail open
    ParseWarning(String),
    /// An invariant of the planner was broken
    PolicyViolation(String),
    /// Filesystem operation failed
    FsFail(String),
    /// External tool could not be found or started
    ToolUnavailable(String),
    /// External tool ran but failed
    ProcessingError(String),
    /// Remote slot store failure
    SlotStore(String),
    /// Configuration could not be loaded or is invalid
    Config(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::EmptyInput(msg) => write!(f, "No input files: {}", msg),
            DomainError::ParseWarning(msg) => write!(f, "Unparseable transcript: {}", msg),
            DomainError::PolicyViolation(msg) => write!(f, "Policy violation: {}", msg),
            DomainError::FsFail(msg) => write!(f, "Filesystem error: {}", msg),
            DomainError::ToolUnavailable(msg) => write!(f, "Tool unavailable: {}", msg),
            DomainError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            DomainError::SlotStore(msg) => write!(f, "Slot store error: {}", msg),
            DomainError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

impl DomainError {
    /// Whether the caller can recover by changing its input (e.g. picking another directory)
    pub fn is_input_error(&self) -> bool {
        matches!(self, DomainError::BadArgs(_) | DomainError::EmptyInput(_))
    }
}
