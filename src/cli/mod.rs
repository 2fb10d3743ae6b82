//! Command-line surface for the `gh-aw` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compiler and runtime orchestrator for agentic CI workflows.
#[derive(Parser, Debug)]
#[command(name = "gh-aw", version, about = "Compile and run agentic CI workflows")]
pub struct Cli {
    /// Increase log verbosity; repeat for more (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Explicit config file, overriding the workspace `gh-aw.toml` layer.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a workflow Markdown file into its lock-file YAML.
    Compile {
        /// Path to the workflow's root Markdown file.
        file: PathBuf,
        /// Write the lock file here instead of `<file>.lock.yml`.
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Compile a workflow and print the lock file without writing it.
    Run {
        /// Path to the workflow's root Markdown file.
        file: PathBuf,
    },
    /// Fetch a remote tool/MCP bundle and record it under imports.
    Add {
        /// Import reference, e.g. `owner/repo/path@ref`.
        id: String,
    },
    /// Re-fetch an already-imported bundle at its pinned or latest ref.
    Update {
        /// Import reference, e.g. `owner/repo/path@ref`.
        id: String,
    },
    /// Summarize a saved agent run log.
    Logs {
        /// Path to the saved run log (JSONL).
        run: PathBuf,
        /// Engine that produced the log, for framing-specific parsing.
        #[arg(long, default_value = "claude")]
        engine: String,
    },
    /// Inspect the MCP tool catalog a workflow would expose.
    Mcp {
        #[command(subcommand)]
        action: McpAction,
    },
    /// Reprocess every saved run log under a directory for cross-run analysis.
    Audit {
        /// Directory containing `*.log`/`*.jsonl` run artifacts.
        dir: PathBuf,
        /// Engine that produced the logs, for framing-specific parsing.
        #[arg(long, default_value = "claude")]
        engine: String,
    },
    /// Sanitize agent-produced text for a human-facing surface, reading
    /// from stdin and writing the sanitized text to stdout.
    Sanitize {
        /// Domains exempt from URL redaction, in addition to github.com.
        #[arg(long = "allowed-domain")]
        allowed_domains: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum McpAction {
    /// List the tools and MCP servers a compiled workflow would resolve.
    Inspect {
        /// Path to the workflow's root Markdown file.
        file: PathBuf,
    },
}
