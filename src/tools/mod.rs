//! Tool System - definitions, validation, registry, dispatch and the interactive builder

mod builder;
mod definition;
mod dispatcher;
mod registry;
mod validator;

pub use builder::{
    BuilderEvent, BuilderState, CommandField, DEFAULT_VERSION, InputKind, MetaField, ParameterField, Prompt,
    ToolBuilder,
};
pub use definition::{CommandDefinition, ParameterDefinition, ParameterType, ToolDefinition, UnknownParameterType};
pub use dispatcher::{CallOptions, CommandDispatcher, DispatchPolicy, check_parameters};
pub use registry::ToolRegistry;
pub use validator::{Rejection, parse_definition, validate};
