//! Command-line parser and subcommand definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Claudekit hooks engine CLI
#[derive(Parser, Debug)]
#[command(name = "claudekit-hooks")]
#[command(about = "Embedded hooks engine for claudekit")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
///
/// `run` is the host entry point; everything else is the read-mostly
/// interface the surrounding claudekit CLI consumes.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Execute a hook against the event payload on stdin
    Run {
        /// Hook id to execute (see `list`)
        hook_id: String,

        /// Use this file as the project config layer
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the hook's child-process timeout in milliseconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Enumerate available hooks
    List {
        /// Emit machine-readable descriptors
        #[arg(long)]
        json: bool,
    },

    /// Run a hook against a synthesized payload for local debugging
    Test {
        /// Hook id to test
        hook_id: String,

        /// Affected file for PostToolUse-style hooks
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print aggregated metrics from the session store
    Stats {
        /// Restrict to one session id
        #[arg(long)]
        session: Option<String>,
    },

    /// Turn a hook on in the project config
    Enable {
        /// Hook id to enable
        hook_id: String,
    },

    /// Turn a hook off in the project config
    Disable {
        /// Hook id to disable
        hook_id: String,
    },
}
