// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "sfs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first sync client for the storefront data backend")]
#[command(
    long_about = "Offline-first sync client for the storefront data backend.\n\n\
    Writes are recorded in a durable local queue and replayed in order once the\n\
    backend is reachable. Reads fall back to the last fetched value while offline."
)]
pub struct Cli {
    /// Directory holding the local store and config.toml
    #[arg(long, global = true, value_name = "path")]
    pub state_dir: Option<PathBuf>,

    /// Treat the backend as unreachable (never probe)
    #[arg(long, global = true)]
    pub offline: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// A mutation given on the command line.
#[derive(Args, Debug, Clone)]
pub struct MutationArgs {
    /// Mutation kind: create, update or delete
    pub kind: String,

    /// Key of the remote entity
    #[arg(value_parser = non_empty_string)]
    pub key: String,

    /// JSON payload (defaults to null)
    pub payload: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show connectivity, pending and failed counts
    Status {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Record a mutation in the queue without contacting the backend
    Enqueue {
        #[command(flatten)]
        mutation: MutationArgs,
    },

    /// Apply a mutation now, or queue it when the backend is unreachable
    Submit {
        #[command(flatten)]
        mutation: MutationArgs,
    },

    /// Replay queued mutations against the backend
    Drain {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Read a value, falling back to the local cache when offline
    Fetch {
        #[arg(value_parser = non_empty_string)]
        key: String,

        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// List operations that need manual resolution
    Failed {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Put failed operations back in the queue
    Retry {
        /// Operation id (as shown by 'sfs failed')
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// Retry every failed operation
        #[arg(long)]
        all: bool,
    },

    /// Drop failed operations for good
    Discard {
        /// Operation id (as shown by 'sfs failed')
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,

        /// Discard every failed operation
        #[arg(long)]
        all: bool,
    },

    /// Inspect or reset the local queue
    #[command(subcommand)]
    Queue(QueueCommand),

    /// Show or initialize configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Keep running: watch connectivity and drain whenever the backend returns
    Run,
}

#[derive(Subcommand, Debug)]
pub enum QueueCommand {
    /// List pending operations in drain order
    List {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Discard the stored queue, including failed operations
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a config.toml with default settings
    Init {
        /// Remote backend URL
        #[arg(long)]
        url: Option<String>,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
