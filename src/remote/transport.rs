//! Transport trait for the remote execution endpoint

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::types::ExecuteRequest;

/// Errors that can occur while talking to the execution endpoint
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(_) => true,
            TransportError::Status { status, .. } => *status >= 500,
            TransportError::InvalidBody(_) => false,
            TransportError::Timeout(_) => true,
        }
    }
}

/// A channel to the remote execution endpoint.
///
/// One call is one attempt; retry and cancellation live in the dispatcher.
#[async_trait]
pub trait ExecuteTransport: Send + Sync {
    /// Send an execute request and return the response body
    async fn execute(&self, request: &ExecuteRequest, timeout: Duration) -> Result<Value, TransportError>;
}
