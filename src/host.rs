//! Host-facing operations
//!
//! `ToolHost` wires a registry and a dispatcher together and exposes the
//! operations a presentation layer calls. Every operation answers with an
//! `Envelope`; failures never escape as errors.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{ErrorKind, Result, ToolregError};
use crate::remote::{Envelope, ExecuteTransport};
use crate::storage::ToolStore;
use crate::tools::{CallOptions, CommandDispatcher, DispatchPolicy, ToolDefinition, ToolRegistry};

/// Registry plus dispatcher behind a uniform result shape
pub struct ToolHost {
    registry: Arc<ToolRegistry>,
    dispatcher: CommandDispatcher,
}

impl ToolHost {
    /// Open the registry from `store` and prepare dispatch over `transport`
    pub async fn open(
        store: Arc<dyn ToolStore>,
        transport: Arc<dyn ExecuteTransport>,
        policy: DispatchPolicy,
    ) -> Result<Self> {
        let registry = Arc::new(ToolRegistry::open(store).await?);
        let dispatcher = CommandDispatcher::new(Arc::clone(&registry), transport).with_policy(policy);
        Ok(Self { registry, dispatcher })
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Install a serialized tool definition
    pub async fn install_tool(&self, definition: &str) -> Envelope {
        into_envelope(self.registry.install_json(definition).await)
    }

    /// Install an already-typed definition, e.g. one produced by `ToolBuilder`
    pub async fn install_definition(&self, tool: ToolDefinition) -> Envelope {
        into_envelope(self.registry.install(tool).await)
    }

    /// Execute a command. `parameters` must be a JSON object or null.
    pub async fn execute_command(&self, tool: &str, command: &str, parameters: Value) -> Envelope {
        self.execute_command_with(tool, command, parameters, CallOptions::default())
            .await
    }

    /// Execute a command with per-call timeout or cancellation
    pub async fn execute_command_with(
        &self,
        tool: &str,
        command: &str,
        parameters: Value,
        options: CallOptions,
    ) -> Envelope {
        let parameters = match parameters {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Envelope::err(
                    ErrorKind::InvalidParameters,
                    format!("parameters must be a JSON object, got {}", kind_name(&other)),
                );
            }
        };
        self.dispatcher
            .execute_with(tool, command, parameters, options)
            .await
            .into()
    }

    /// Installed tools in registry order
    pub fn get_tools(&self) -> Vec<ToolDefinition> {
        self.registry.list()
    }

    pub fn get_tool(&self, name: &str) -> Option<ToolDefinition> {
        self.registry.get(name)
    }

    /// Remove a tool; with `persist` the removal is written through to the store
    pub async fn remove_tool(&self, name: &str, persist: bool) -> Envelope {
        let Some(removed) = self.registry.remove(name).await else {
            return ToolregError::ToolNotFound(name.to_string()).into();
        };
        if persist {
            if let Err(e) = self.registry.persist().await {
                return e.into();
            }
        }
        into_envelope(Ok(removed))
    }

    /// Close the underlying registry
    pub async fn close(&self) {
        self.registry.close().await;
    }
}

fn into_envelope(result: Result<ToolDefinition>) -> Envelope {
    match result.and_then(|tool| Ok(serde_json::to_value(tool)?)) {
        Ok(data) => Envelope::ok(data),
        Err(e) => {
            log::warn!("{}", e);
            e.into()
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
