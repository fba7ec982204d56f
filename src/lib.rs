//! Toolreg - a registry and dispatcher for remotely executed tools
//!
//! Tools are declared as JSON documents describing named commands and their
//! typed parameters. The registry validates and persists them; the dispatcher
//! resolves `tool.command` calls against the registry and forwards them to a
//! remote execution endpoint.

pub mod error;
pub mod host;
pub mod remote;
pub mod storage;
pub mod tools;

pub use error::{ErrorKind, Result, ToolregError};
pub use host::ToolHost;
