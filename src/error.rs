//! Error types for toolreg
//!
//! Centralized error handling using thiserror.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a failure, carried next to the message in result envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input was not valid JSON
    Parse,
    /// Well-formed definition that breaks a validation rule
    Validation,
    /// Unknown tool or command
    NotFound,
    /// Parameters rejected by schema enforcement
    InvalidParameters,
    /// Network or endpoint failure
    Transport,
    /// Caller abandoned the call
    Cancelled,
    /// Persistence failure
    Storage,
    /// Anything else
    Internal,
}

/// All error types that can occur in toolreg
#[derive(Debug, Error)]
pub enum ToolregError {
    /// Tool definition is not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Tool definition failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Tool is not installed
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Tool has no command with this name
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// Parameters do not satisfy the command schema
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Remote execution endpoint failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Remote call exceeded its deadline
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// Call was cancelled before it completed
    #[error("Cancelled")]
    Cancelled,

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolregError {
    /// Classify this error for callers that branch on kind instead of message text
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) | Self::Json(_) => ErrorKind::Parse,
            Self::Validation(_) => ErrorKind::Validation,
            Self::ToolNotFound(_) | Self::CommandNotFound(_) => ErrorKind::NotFound,
            Self::InvalidParameters(_) => ErrorKind::InvalidParameters,
            Self::Transport(_) | Self::Timeout(_) => ErrorKind::Transport,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Storage(_) | Self::Io(_) => ErrorKind::Storage,
            Self::InvalidState(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for toolreg operations
pub type Result<T> = std::result::Result<T, ToolregError>;
