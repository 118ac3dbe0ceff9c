//! Error types for the GapCheck engine

use thiserror::Error;

/// Main error type for engine operations.
///
/// The reconciliation, numbering and evaluation passes are total and never
/// return errors; this type covers the loading surface (snapshot parsing,
/// size limits) and identifier lookups on the service layer.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Snapshot document exceeds the configured size limit
    #[error("Snapshot too large: {size} bytes (max {max})")]
    SnapshotTooLarge { size: usize, max: usize },

    /// Snapshot contains more parts than allowed
    #[error("Too many parts: {count} (max {max})")]
    TooManyParts { count: usize, max: usize },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Part not found by identifier
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// Question group not found by identifier
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// Question not found by reference
    #[error("Question not found: {0}")]
    QuestionNotFound(String),

    /// Tag allocation would exceed the maximum tag number
    #[error("Tag limit exceeded in scope {scope}: next slot would be {next}")]
    TagLimitExceeded { scope: String, next: u32 },
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
