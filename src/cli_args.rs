use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{GenerationMethod, ModelTier};
use crate::git::DiffSource;
use crate::prompts::Language;

/// CLI options
#[derive(Parser, Debug)]
#[command(
    name = "claude-commit",
    version,
    about = "Conventional commit messages generated by the Claude CLI or the Anthropic API"
)]
pub struct Cli {
    /// Repository to operate on
    #[arg(long, default_value = ".", global = true)]
    pub repo: PathBuf,

    /// Preferred backend: try the CLI first, the API only, or fall back automatically
    #[arg(long, value_enum, global = true)]
    pub method: Option<GenerationMethod>,

    /// Model tier passed to the Claude CLI
    #[arg(long, value_enum, global = true)]
    pub model: Option<ModelTier>,

    /// Prompt localization
    #[arg(long, value_enum, global = true)]
    pub language: Option<Language>,

    /// Request a subject + body + footer block instead of a single line
    #[arg(long, global = true)]
    pub multi_line: bool,

    /// Which change set to describe
    #[arg(long, value_enum, global = true)]
    pub diff_source: Option<DiffSource>,

    /// Managed mode: let the Claude CLI inspect the repository itself (CLI method only)
    #[arg(long, global = true)]
    pub managed: bool,

    /// Ask for the Claude attribution trailer to be preserved (managed mode)
    #[arg(long, global = true)]
    pub keep_co_authored_by: bool,

    /// Explicit path to the Claude CLI executable
    #[arg(long, global = true)]
    pub cli_path: Option<PathBuf>,

    /// API key (otherwise uses the ANTHROPIC_API_KEY env var)
    #[arg(long, env = "ANTHROPIC_API_KEY", global = true)]
    pub api_key: Option<String>,

    /// Write the generated message into .git/COMMIT_EDITMSG (no commit is created)
    #[arg(long, global = true)]
    pub apply: bool,

    /// Verbosity: -v info, -vv debug, -vvv trace
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand (default: generate a message)
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Regenerate the current COMMIT_EDITMSG message honoring free-text feedback
    Edit {
        /// What should change about the current message
        feedback: String,
    },

    /// Managed delegation with a custom instruction (requires the Claude CLI)
    Prompt {
        /// Extra instruction handed to the backend
        instruction: String,
    },
}
