//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - install/remove: manage the registry
//! - list/show/export: inspect installed tools
//! - exec: dispatch a command to the execution endpoint
//! - create: build a definition interactively

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Toolreg - install tools and dispatch their commands to a remote endpoint
#[derive(Parser, Debug)]
#[command(name = "toolreg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a tool definition from a JSON file ("-" reads stdin)
    Install {
        /// Path to the definition
        file: PathBuf,
    },

    /// List installed tools
    List,

    /// Show the commands and parameters of a tool
    Show {
        /// Tool name
        tool: String,
    },

    /// Remove a tool from the registry
    Remove {
        /// Tool name
        tool: String,

        /// Also write the removal through to storage
        #[arg(short, long)]
        persist: bool,
    },

    /// Execute a tool command on the remote endpoint
    Exec {
        /// Tool name
        tool: String,

        /// Command name
        command: String,

        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,

        /// Override the configured timeout for this call
        #[arg(short, long)]
        timeout_ms: Option<u64>,
    },

    /// Build a tool definition interactively
    Create {
        /// Install the result instead of only printing it
        #[arg(short, long)]
        install: bool,
    },

    /// Print a tool definition as JSON
    Export {
        /// Tool name
        tool: String,
    },
}
