//! Command dispatch
//!
//! Resolves a (tool, command) pair through the registry and forwards the call
//! to the remote execution endpoint. Every outcome, including lookup misses,
//! comes back as an `InvocationResult`; nothing is raised to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, ToolregError};
use crate::remote::{ExecuteRequest, ExecuteTransport, InvocationResult, TransportError};

use super::definition::{CommandDefinition, ParameterType};
use super::registry::ToolRegistry;

/// How the dispatcher talks to the endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Deadline for a single attempt
    pub timeout: Duration,
    /// Total attempts for commands marked idempotent; others always get one
    pub max_attempts: u32,
    /// Delay before retry n is `n * retry_backoff`
    pub retry_backoff: Duration,
    /// Reject calls that violate the command's parameter schema
    pub enforce_schema: bool,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_backoff: Duration::from_millis(250),
            enforce_schema: false,
        }
    }
}

/// Per-call overrides
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Replaces the policy timeout for this call
    pub timeout: Option<Duration>,
    /// Cancelling abandons the call, including any pending retry
    pub cancel: CancellationToken,
}

impl CallOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Dispatches command invocations to the execution endpoint
pub struct CommandDispatcher {
    registry: Arc<ToolRegistry>,
    transport: Arc<dyn ExecuteTransport>,
    policy: DispatchPolicy,
}

impl CommandDispatcher {
    /// Create a dispatcher with the default policy
    pub fn new(registry: Arc<ToolRegistry>, transport: Arc<dyn ExecuteTransport>) -> Self {
        Self {
            registry,
            transport,
            policy: DispatchPolicy::default(),
        }
    }

    /// Set dispatch policy
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// Execute a command with default call options
    pub async fn execute(&self, tool: &str, command: &str, parameters: Map<String, Value>) -> InvocationResult {
        self.execute_with(tool, command, parameters, CallOptions::default())
            .await
    }

    /// Execute a command, abandoning it when `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        tool: &str,
        command: &str,
        parameters: Map<String, Value>,
        cancel: CancellationToken,
    ) -> InvocationResult {
        self.execute_with(tool, command, parameters, CallOptions::default().with_cancel(cancel))
            .await
    }

    /// Execute a command with explicit call options
    pub async fn execute_with(
        &self,
        tool: &str,
        command: &str,
        parameters: Map<String, Value>,
        options: CallOptions,
    ) -> InvocationResult {
        match self.dispatch(tool, command, parameters, &options).await {
            Ok(body) => {
                log::info!("Executed {}.{}", tool, command);
                InvocationResult::success(body)
            }
            Err(e) => {
                log::warn!("Execution of {}.{} failed: {}", tool, command, e);
                e.into()
            }
        }
    }

    async fn dispatch(
        &self,
        tool_name: &str,
        command_name: &str,
        parameters: Map<String, Value>,
        options: &CallOptions,
    ) -> Result<Value> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| ToolregError::ToolNotFound(tool_name.to_string()))?;
        let command = tool
            .command(command_name)
            .ok_or_else(|| ToolregError::CommandNotFound(command_name.to_string()))?;

        if self.policy.enforce_schema {
            check_parameters(command, &parameters)?;
        }

        let attempts = if command.idempotent {
            self.policy.max_attempts.max(1)
        } else {
            1
        };
        let timeout = options.timeout.unwrap_or(self.policy.timeout);
        let request = ExecuteRequest::new(tool_name, command_name, parameters);

        let mut attempt = 1;
        loop {
            let outcome = tokio::select! {
                biased;
                _ = options.cancel.cancelled() => return Err(ToolregError::Cancelled),
                outcome = self.attempt(&request, timeout) => outcome,
            };

            match outcome {
                Ok(body) => return Ok(body),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    let delay = self.policy.retry_backoff * attempt;
                    tracing::warn!(
                        tool = %request.tool,
                        command = %request.command,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying idempotent command"
                    );
                    tokio::select! {
                        biased;
                        _ = options.cancel.cancelled() => return Err(ToolregError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(TransportError::Timeout(elapsed)) => {
                    return Err(ToolregError::Timeout(elapsed.as_millis() as u64));
                }
                Err(e) => return Err(ToolregError::Transport(e.to_string())),
            }
        }
    }

    async fn attempt(&self, request: &ExecuteRequest, timeout: Duration) -> std::result::Result<Value, TransportError> {
        // The transport may not honour the deadline itself
        match tokio::time::timeout(timeout, self.transport.execute(request, timeout)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }
}

/// Check caller-supplied values against a command's parameter schema
pub fn check_parameters(command: &CommandDefinition, parameters: &Map<String, Value>) -> Result<()> {
    let mut problems = Vec::new();

    for param in &command.parameters {
        match parameters.get(&param.name) {
            None | Some(Value::Null) if param.required => {
                problems.push(format!("missing required parameter '{}'", param.name));
            }
            None | Some(Value::Null) => {}
            Some(value) if !param.param_type.matches(value) => {
                let actual = ParameterType::of(value).map(|t| t.as_str()).unwrap_or("null");
                problems.push(format!(
                    "parameter '{}' expects {}, got {}",
                    param.name, param.param_type, actual
                ));
            }
            Some(_) => {}
        }
    }

    for name in parameters.keys() {
        if command.parameter(name).is_none() {
            problems.push(format!("unknown parameter '{}'", name));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ToolregError::InvalidParameters(problems.join("; ")))
    }
}
