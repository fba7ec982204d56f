//! Interactive tool builder
//!
//! A finite-state machine that assembles a `ToolDefinition` one answer at a
//! time. The caller renders `prompt()`, collects an answer and feeds it back
//! with `handle()`. Cancelling, or submitting an empty answer, at any point
//! discards everything collected so far.
//!
//! The builder never touches the registry; `finish()` hands the definition
//! back for the caller to install.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolregError};

use super::definition::{CommandDefinition, ParameterDefinition, ParameterType, ToolDefinition};

/// Version offered when the operator has no better idea
pub const DEFAULT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaField {
    Name,
    Description,
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandField {
    Name,
    Description,
    /// Confirm: add a (first) parameter to this command?
    AddParameter,
    /// Confirm: add another command?
    AddAnother,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterField {
    Name,
    Description,
    Type,
    Required,
    /// Confirm: add another parameter?
    AddAnother,
}

/// Where the builder is in the collection flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "field", rename_all = "snake_case")]
pub enum BuilderState {
    CollectingToolMeta(MetaField),
    CollectingCommand(CommandField),
    CollectingParameter(ParameterField),
    Done,
    Cancelled,
}

impl BuilderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

/// An operator answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderEvent {
    /// Free text, or the chosen option for a choice prompt
    Text(String),
    /// Yes/no answer
    Confirm(bool),
    /// Abort the whole flow
    Cancel,
}

/// What kind of answer a prompt expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Choice,
    Confirm,
}

/// A question to show the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub message: &'static str,
    pub placeholder: &'static str,
    pub default: Option<&'static str>,
    pub kind: InputKind,
    /// Options for `InputKind::Choice`
    pub choices: Vec<&'static str>,
}

impl Prompt {
    fn text(message: &'static str, placeholder: &'static str) -> Self {
        Self {
            message,
            placeholder,
            default: None,
            kind: InputKind::Text,
            choices: Vec::new(),
        }
    }

    fn confirm(message: &'static str) -> Self {
        Self {
            message,
            placeholder: "",
            default: None,
            kind: InputKind::Confirm,
            choices: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct PendingParameter {
    name: String,
    description: String,
    param_type: Option<ParameterType>,
    required: bool,
}

/// Step-by-step tool definition builder
#[derive(Debug)]
pub struct ToolBuilder {
    state: BuilderState,
    name: String,
    description: String,
    version: String,
    commands: Vec<CommandDefinition>,
    command: Option<CommandDefinition>,
    parameter: PendingParameter,
}

impl ToolBuilder {
    /// Start a new flow at the tool name prompt
    pub fn new() -> Self {
        Self {
            state: BuilderState::CollectingToolMeta(MetaField::Name),
            name: String::new(),
            description: String::new(),
            version: String::new(),
            commands: Vec::new(),
            command: None,
            parameter: PendingParameter::default(),
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// The question for the current state, `None` once terminal
    pub fn prompt(&self) -> Option<Prompt> {
        let prompt = match self.state {
            BuilderState::CollectingToolMeta(MetaField::Name) => {
                Prompt::text("Tool name", "e.g. FileManager, DatabaseTool")
            }
            BuilderState::CollectingToolMeta(MetaField::Description) => {
                Prompt::text("Tool description", "e.g. Manages file operations")
            }
            BuilderState::CollectingToolMeta(MetaField::Version) => Prompt {
                default: Some(DEFAULT_VERSION),
                ..Prompt::text("Tool version", "e.g. 1.0.0")
            },
            BuilderState::CollectingCommand(CommandField::Name) => {
                Prompt::text("Command name", "e.g. readFile, executeQuery")
            }
            BuilderState::CollectingCommand(CommandField::Description) => {
                Prompt::text("Command description", "e.g. Reads file contents")
            }
            BuilderState::CollectingCommand(CommandField::AddParameter) => {
                Prompt::confirm("Add a parameter to this command?")
            }
            BuilderState::CollectingCommand(CommandField::AddAnother) => Prompt::confirm("Add another command?"),
            BuilderState::CollectingParameter(ParameterField::Name) => {
                Prompt::text("Parameter name", "e.g. filePath, query")
            }
            BuilderState::CollectingParameter(ParameterField::Description) => {
                Prompt::text("Parameter description", "e.g. Path of the file")
            }
            BuilderState::CollectingParameter(ParameterField::Type) => Prompt {
                kind: InputKind::Choice,
                choices: ParameterType::ALL.iter().map(|t| t.as_str()).collect(),
                ..Prompt::text("Parameter type", "")
            },
            BuilderState::CollectingParameter(ParameterField::Required) => {
                Prompt::confirm("Is this parameter required?")
            }
            BuilderState::CollectingParameter(ParameterField::AddAnother) => {
                Prompt::confirm("Add another parameter?")
            }
            BuilderState::Done | BuilderState::Cancelled => return None,
        };
        Some(prompt)
    }

    /// Apply an answer and advance.
    ///
    /// An answer of the wrong kind, an unknown parameter type or a duplicate
    /// name is refused with an error and leaves the state unchanged.
    pub fn handle(&mut self, event: BuilderEvent) -> Result<BuilderState> {
        if self.state.is_terminal() {
            return Err(ToolregError::InvalidState(format!(
                "builder already finished ({:?})",
                self.state
            )));
        }

        match event {
            BuilderEvent::Cancel => self.cancel(),
            BuilderEvent::Text(text) if text.trim().is_empty() => self.cancel(),
            BuilderEvent::Text(text) => self.handle_text(text.trim().to_string())?,
            BuilderEvent::Confirm(yes) => self.handle_confirm(yes)?,
        }
        Ok(self.state)
    }

    /// The finished definition, `None` unless the flow reached `Done`
    pub fn finish(self) -> Option<ToolDefinition> {
        if self.state != BuilderState::Done {
            return None;
        }
        Some(ToolDefinition {
            name: self.name,
            description: self.description,
            version: self.version,
            commands: self.commands,
        })
    }

    fn handle_text(&mut self, text: String) -> Result<()> {
        match self.state {
            BuilderState::CollectingToolMeta(MetaField::Name) => {
                self.name = text;
                self.state = BuilderState::CollectingToolMeta(MetaField::Description);
            }
            BuilderState::CollectingToolMeta(MetaField::Description) => {
                self.description = text;
                self.state = BuilderState::CollectingToolMeta(MetaField::Version);
            }
            BuilderState::CollectingToolMeta(MetaField::Version) => {
                self.version = text;
                self.state = BuilderState::CollectingCommand(CommandField::Name);
            }
            BuilderState::CollectingCommand(CommandField::Name) => {
                if self.commands.iter().any(|c| c.name == text) {
                    return Err(ToolregError::Validation(format!("duplicate command name '{}'", text)));
                }
                self.command = Some(CommandDefinition::new(text, ""));
                self.state = BuilderState::CollectingCommand(CommandField::Description);
            }
            BuilderState::CollectingCommand(CommandField::Description) => {
                self.current_command()?.description = text;
                self.state = BuilderState::CollectingCommand(CommandField::AddParameter);
            }
            BuilderState::CollectingParameter(ParameterField::Name) => {
                if self.current_command()?.parameter(&text).is_some() {
                    return Err(ToolregError::Validation(format!("duplicate parameter name '{}'", text)));
                }
                self.parameter = PendingParameter {
                    name: text,
                    ..Default::default()
                };
                self.state = BuilderState::CollectingParameter(ParameterField::Description);
            }
            BuilderState::CollectingParameter(ParameterField::Description) => {
                self.parameter.description = text;
                self.state = BuilderState::CollectingParameter(ParameterField::Type);
            }
            BuilderState::CollectingParameter(ParameterField::Type) => {
                let param_type = text
                    .parse::<ParameterType>()
                    .map_err(|e| ToolregError::Validation(e.to_string()))?;
                self.parameter.param_type = Some(param_type);
                self.state = BuilderState::CollectingParameter(ParameterField::Required);
            }
            state => {
                return Err(ToolregError::InvalidState(format!("expected a yes/no answer in {:?}", state)));
            }
        }
        Ok(())
    }

    fn handle_confirm(&mut self, yes: bool) -> Result<()> {
        match self.state {
            BuilderState::CollectingCommand(CommandField::AddParameter) => {
                if yes {
                    self.state = BuilderState::CollectingParameter(ParameterField::Name);
                } else {
                    self.finish_command()?;
                }
            }
            BuilderState::CollectingParameter(ParameterField::Required) => {
                self.parameter.required = yes;
                self.state = BuilderState::CollectingParameter(ParameterField::AddAnother);
            }
            BuilderState::CollectingParameter(ParameterField::AddAnother) => {
                self.finish_parameter()?;
                if yes {
                    self.state = BuilderState::CollectingParameter(ParameterField::Name);
                } else {
                    self.finish_command()?;
                }
            }
            BuilderState::CollectingCommand(CommandField::AddAnother) => {
                self.state = if yes {
                    BuilderState::CollectingCommand(CommandField::Name)
                } else {
                    BuilderState::Done
                };
            }
            state => {
                return Err(ToolregError::InvalidState(format!("expected a text answer in {:?}", state)));
            }
        }
        Ok(())
    }

    fn current_command(&mut self) -> Result<&mut CommandDefinition> {
        self.command
            .as_mut()
            .ok_or_else(|| ToolregError::InvalidState("no command in progress".to_string()))
    }

    fn finish_parameter(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.parameter);
        let param_type = pending
            .param_type
            .ok_or_else(|| ToolregError::InvalidState("parameter type not chosen".to_string()))?;
        let mut parameter = ParameterDefinition::new(pending.name, pending.description, param_type);
        parameter.required = pending.required;
        self.current_command()?.parameters.push(parameter);
        Ok(())
    }

    fn finish_command(&mut self) -> Result<()> {
        let command = self
            .command
            .take()
            .ok_or_else(|| ToolregError::InvalidState("no command in progress".to_string()))?;
        self.commands.push(command);
        self.state = BuilderState::CollectingCommand(CommandField::AddAnother);
        Ok(())
    }

    fn cancel(&mut self) {
        log::debug!("Tool builder cancelled in {:?}", self.state);
        self.name.clear();
        self.description.clear();
        self.version.clear();
        self.commands.clear();
        self.command = None;
        self.parameter = PendingParameter::default();
        self.state = BuilderState::Cancelled;
    }
}

impl Default for ToolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> BuilderEvent {
        BuilderEvent::Text(s.to_string())
    }

    fn feed(builder: &mut ToolBuilder, events: Vec<BuilderEvent>) {
        for event in events {
            builder.handle(event).unwrap();
        }
    }

    fn tool_meta() -> Vec<BuilderEvent> {
        vec![text("Files"), text("File operations"), text("1.0.0")]
    }

    #[test]
    fn test_initial_state() {
        let builder = ToolBuilder::new();
        assert_eq!(builder.state(), BuilderState::CollectingToolMeta(MetaField::Name));
        let prompt = builder.prompt().unwrap();
        assert_eq!(prompt.kind, InputKind::Text);
        assert_eq!(prompt.message, "Tool name");
    }

    #[test]
    fn test_version_prompt_has_default() {
        let mut builder = ToolBuilder::new();
        feed(&mut builder, vec![text("Files"), text("File operations")]);
        assert_eq!(builder.prompt().unwrap().default, Some(DEFAULT_VERSION));
    }

    #[test]
    fn test_full_flow() {
        let mut builder = ToolBuilder::new();
        feed(&mut builder, tool_meta());
        assert_eq!(builder.state(), BuilderState::CollectingCommand(CommandField::Name));

        feed(
            &mut builder,
            vec![
                text("read"),
                text("Read a file"),
                BuilderEvent::Confirm(true),
                text("path"),
                text("File path"),
                text("string"),
                BuilderEvent::Confirm(true),
                BuilderEvent::Confirm(true),
                text("limit"),
                text("Max bytes"),
                text("number"),
                BuilderEvent::Confirm(false),
                BuilderEvent::Confirm(false),
                BuilderEvent::Confirm(true),
                text("list"),
                text("List files"),
                BuilderEvent::Confirm(false),
            ],
        );
        assert_eq!(builder.state(), BuilderState::CollectingCommand(CommandField::AddAnother));
        builder.handle(BuilderEvent::Confirm(false)).unwrap();
        assert_eq!(builder.state(), BuilderState::Done);
        assert!(builder.prompt().is_none());

        let tool = builder.finish().unwrap();
        assert_eq!(tool.name, "Files");
        assert_eq!(tool.version, "1.0.0");
        assert_eq!(tool.command_names(), vec!["read", "list"]);

        let read = tool.command("read").unwrap();
        assert_eq!(read.parameters.len(), 2);
        assert_eq!(read.parameters[0].name, "path");
        assert_eq!(read.parameters[0].param_type, ParameterType::String);
        assert!(read.parameters[0].required);
        assert_eq!(read.parameters[1].param_type, ParameterType::Number);
        assert!(!read.parameters[1].required);
        assert!(tool.command("list").unwrap().parameters.is_empty());
    }

    #[test]
    fn test_finished_definition_is_installable() {
        let mut builder = ToolBuilder::new();
        feed(&mut builder, tool_meta());
        feed(
            &mut builder,
            vec![
                text("read"),
                text("Read a file"),
                BuilderEvent::Confirm(false),
                BuilderEvent::Confirm(false),
            ],
        );
        let tool = builder.finish().unwrap();
        let raw = serde_json::to_value(&tool).unwrap();
        assert!(crate::tools::validate(&raw).is_ok());
    }

    #[test]
    fn test_cancel_event_discards_everything() {
        let mut builder = ToolBuilder::new();
        feed(&mut builder, tool_meta());
        feed(&mut builder, vec![text("read"), text("Read"), BuilderEvent::Confirm(true), text("path")]);

        let state = builder.handle(BuilderEvent::Cancel).unwrap();
        assert_eq!(state, BuilderState::Cancelled);
        assert!(builder.prompt().is_none());
        assert!(builder.finish().is_none());
    }

    #[test]
    fn test_empty_answer_cancels() {
        for steps in 0..3 {
            let mut builder = ToolBuilder::new();
            feed(&mut builder, tool_meta().into_iter().take(steps).collect());
            builder.handle(text("   ")).unwrap();
            assert_eq!(builder.state(), BuilderState::Cancelled);
        }
    }

    #[test]
    fn test_cancel_in_parameter_cancels_whole_flow() {
        let mut builder = ToolBuilder::new();
        feed(&mut builder, tool_meta());
        feed(
            &mut builder,
            vec![
                text("read"),
                text("Read"),
                BuilderEvent::Confirm(true),
                text("path"),
                text("File path"),
            ],
        );
        builder.handle(text("")).unwrap();
        assert_eq!(builder.state(), BuilderState::Cancelled);
        assert!(builder.finish().is_none());
    }

    #[test]
    fn test_events_after_terminal_rejected() {
        let mut builder = ToolBuilder::new();
        builder.handle(BuilderEvent::Cancel).unwrap();
        let err = builder.handle(text("Files")).unwrap_err();
        assert!(matches!(err, ToolregError::InvalidState(_)));
    }

    #[test]
    fn test_wrong_answer_kind_keeps_state() {
        let mut builder = ToolBuilder::new();
        assert!(builder.handle(BuilderEvent::Confirm(true)).is_err());
        assert_eq!(builder.state(), BuilderState::CollectingToolMeta(MetaField::Name));

        feed(&mut builder, tool_meta());
        feed(&mut builder, vec![text("read"), text("Read")]);
        assert!(builder.handle(text("yes")).is_err());
        assert_eq!(builder.state(), BuilderState::CollectingCommand(CommandField::AddParameter));
    }

    #[test]
    fn test_unknown_type_keeps_state() {
        let mut builder = ToolBuilder::new();
        feed(&mut builder, tool_meta());
        feed(
            &mut builder,
            vec![
                text("read"),
                text("Read"),
                BuilderEvent::Confirm(true),
                text("path"),
                text("File path"),
            ],
        );

        let prompt = builder.prompt().unwrap();
        assert_eq!(prompt.kind, InputKind::Choice);
        assert_eq!(prompt.choices, vec!["string", "number", "boolean", "object", "array"]);

        let err = builder.handle(text("integer")).unwrap_err();
        assert!(matches!(err, ToolregError::Validation(_)));
        assert_eq!(builder.state(), BuilderState::CollectingParameter(ParameterField::Type));
        builder.handle(text("Array")).unwrap();
        assert_eq!(builder.state(), BuilderState::CollectingParameter(ParameterField::Required));
    }

    #[test]
    fn test_duplicate_command_name_refused() {
        let mut builder = ToolBuilder::new();
        feed(&mut builder, tool_meta());
        feed(
            &mut builder,
            vec![
                text("read"),
                text("Read"),
                BuilderEvent::Confirm(false),
                BuilderEvent::Confirm(true),
            ],
        );
        assert!(builder.handle(text("read")).is_err());
        assert_eq!(builder.state(), BuilderState::CollectingCommand(CommandField::Name));
    }

    #[test]
    fn test_duplicate_parameter_name_refused() {
        let mut builder = ToolBuilder::new();
        feed(&mut builder, tool_meta());
        feed(
            &mut builder,
            vec![
                text("read"),
                text("Read"),
                BuilderEvent::Confirm(true),
                text("path"),
                text("Path"),
                text("string"),
                BuilderEvent::Confirm(true),
                BuilderEvent::Confirm(true),
            ],
        );
        assert!(builder.handle(text("path")).is_err());
        assert_eq!(builder.state(), BuilderState::CollectingParameter(ParameterField::Name));
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&BuilderState::CollectingParameter(ParameterField::Type)).unwrap();
        assert_eq!(json, r#"{"state":"collecting_parameter","field":"type"}"#);
        let json = serde_json::to_string(&BuilderState::Done).unwrap();
        assert_eq!(json, r#"{"state":"done"}"#);
    }
}
