//! CLI module for toolreg - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for managing the tool
//! registry, dispatching commands and building definitions interactively.

pub mod commands;
pub mod wizard;

pub use commands::Cli;
