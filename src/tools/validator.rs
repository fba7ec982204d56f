//! Tool definition validation
//!
//! Checks a raw JSON definition against the install rules before anything
//! touches the registry. Validation is pure and never panics on malformed input.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{Result, ToolregError};

use super::definition::{ParameterType, ToolDefinition};

/// Why a definition was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Location of the offending field, e.g. `commands[1].description`
    pub path: String,
    /// Human-readable reason
    pub reason: String,
}

impl Rejection {
    fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

impl From<Rejection> for ToolregError {
    fn from(rejection: Rejection) -> Self {
        ToolregError::Validation(rejection.to_string())
    }
}

/// Parse and validate a serialized definition.
///
/// Malformed JSON yields `ToolregError::Parse`, a well-formed definition that
/// breaks a rule yields `ToolregError::Validation`.
pub fn parse_definition(input: &str) -> Result<ToolDefinition> {
    let raw: Value = serde_json::from_str(input).map_err(|e| ToolregError::Parse(e.to_string()))?;
    Ok(validate(&raw)?)
}

/// Validate a raw definition and convert it into a `ToolDefinition`
pub fn validate(raw: &Value) -> std::result::Result<ToolDefinition, Rejection> {
    let obj = raw
        .as_object()
        .ok_or_else(|| Rejection::new("", "tool definition must be a JSON object"))?;

    for field in ["name", "description", "version"] {
        non_empty_string(obj.get(field), field)?;
    }

    let commands = match obj.get("commands") {
        Some(Value::Array(commands)) => commands,
        Some(_) => return Err(Rejection::new("commands", "must be an array")),
        None => return Err(Rejection::new("commands", "is required")),
    };
    if commands.is_empty() {
        return Err(Rejection::new("commands", "must contain at least one command"));
    }

    let mut command_names = HashSet::new();
    for (i, command) in commands.iter().enumerate() {
        let path = format!("commands[{}]", i);
        let name = validate_command(command, &path)?;
        if !command_names.insert(name) {
            return Err(Rejection::new(
                format!("{}.name", path),
                format!("duplicate command name '{}'", name),
            ));
        }
    }

    serde_json::from_value(raw.clone()).map_err(|e| Rejection::new("", e.to_string()))
}

fn validate_command<'a>(command: &'a Value, path: &str) -> std::result::Result<&'a str, Rejection> {
    let obj = command
        .as_object()
        .ok_or_else(|| Rejection::new(path, "command must be a JSON object"))?;

    let name = non_empty_string(obj.get("name"), &format!("{}.name", path))?;
    non_empty_string(obj.get("description"), &format!("{}.description", path))?;

    let parameters = match obj.get("parameters") {
        Some(Value::Array(parameters)) => parameters,
        Some(_) => return Err(Rejection::new(format!("{}.parameters", path), "must be an array")),
        None => return Err(Rejection::new(format!("{}.parameters", path), "is required")),
    };

    let mut parameter_names = HashSet::new();
    for (j, parameter) in parameters.iter().enumerate() {
        let param_path = format!("{}.parameters[{}]", path, j);
        let param_name = validate_parameter(parameter, &param_path)?;
        if !parameter_names.insert(param_name) {
            return Err(Rejection::new(
                format!("{}.name", param_path),
                format!("duplicate parameter name '{}'", param_name),
            ));
        }
    }

    if obj.get("idempotent").is_some_and(|v| !v.is_boolean()) {
        return Err(Rejection::new(format!("{}.idempotent", path), "must be a boolean"));
    }

    Ok(name)
}

fn validate_parameter<'a>(parameter: &'a Value, path: &str) -> std::result::Result<&'a str, Rejection> {
    let obj = parameter
        .as_object()
        .ok_or_else(|| Rejection::new(path, "parameter must be a JSON object"))?;

    let name = non_empty_string(obj.get("name"), &format!("{}.name", path))?;

    match obj.get("description") {
        None | Some(Value::String(_)) => {}
        Some(_) => return Err(Rejection::new(format!("{}.description", path), "must be a string")),
    }

    let type_path = format!("{}.type", path);
    let type_name = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Rejection::new(&type_path, "is required"))?;
    // Only the exact lowercase spelling round-trips through serde
    if type_name.parse::<ParameterType>().ok().map(|t| t.as_str()) != Some(type_name) {
        return Err(Rejection::new(
            type_path,
            format!(
                "unknown type '{}', expected one of string, number, boolean, object, array",
                type_name
            ),
        ));
    }

    match obj.get("required") {
        None | Some(Value::Bool(_)) => {}
        Some(_) => return Err(Rejection::new(format!("{}.required", path), "must be a boolean")),
    }

    Ok(name)
}

fn non_empty_string<'a>(value: Option<&'a Value>, path: &str) -> std::result::Result<&'a str, Rejection> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) => Err(Rejection::new(path, "must not be empty")),
        Some(_) => Err(Rejection::new(path, "must be a string")),
        None => Err(Rejection::new(path, "is required")),
    }
}
