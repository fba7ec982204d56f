//! Wire and result types for remote command execution

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, ToolregError};

/// Body of a POST to `<server>/execute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub tool: String,
    pub command: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ExecuteRequest {
    /// Create a new execute request
    pub fn new(tool: impl Into<String>, command: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            command: command.into(),
            parameters,
        }
    }
}

/// Outcome of a dispatched command. There is no partial success.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    /// Endpoint response body, passed through untouched
    Success(Value),
    /// Human-readable failure with its classification
    Failure { kind: ErrorKind, message: String },
}

impl InvocationResult {
    /// Create a successful result
    pub fn success(data: Value) -> Self {
        Self::Success(data)
    }

    /// Create a failed result
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Response body on success
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Failure message
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { message, .. } => Some(message),
        }
    }

    /// Failure kind
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl From<ToolregError> for InvocationResult {
    fn from(err: ToolregError) -> Self {
        Self::failure(err.kind(), err.to_string())
    }
}

/// Uniform `{success, data|error, kind}` shape handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl Envelope {
    /// Successful envelope carrying `data`
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }

    /// Failed envelope
    pub fn err(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            kind: Some(kind),
        }
    }
}

impl From<InvocationResult> for Envelope {
    fn from(result: InvocationResult) -> Self {
        match result {
            InvocationResult::Success(data) => Self::ok(data),
            InvocationResult::Failure { kind, message } => Self::err(kind, message),
        }
    }
}

impl From<ToolregError> for Envelope {
    fn from(err: ToolregError) -> Self {
        Self::err(err.kind(), err.to_string())
    }
}
