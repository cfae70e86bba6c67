//! CLI command definitions.
//!
//! This module defines the command structure for the Vitrine CLI.
//! Each subcommand drives the project chat assistant from a terminal.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use vitrine_chat::{ChatError, JsonProjects};

pub mod chat;
pub mod context;

/// Vitrine - project showcase chat assistant
#[derive(Parser)]
#[command(name = "vitrine")]
#[command(version, about = "Vitrine - ask the project assistant about a showcased project")]
#[command(long_about = r#"
Vitrine's project assistant answers questions about a showcased project,
using the project's title, description, creator and tags as context.

COMMANDS:
  chat     → Ask one question, or start an interactive conversation
  context  → Print the project context sent with every question

CONFIGURATION:
  .vitrine/settings.json    endpoint, apiKeyEnv, requestTimeoutSecs, welcome
  VITRINE_CHAT_ENDPOINT     assistant endpoint URL
  VITRINE_CHAT_API_KEY      bearer token for the endpoint
  VITRINE_CHAT_TIMEOUT_SECS transport timeout per attempt

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Assistant not configured
  4 - Daily chat limit reached
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with the project assistant
    Chat(chat::ChatArgs),

    /// Print the context string for a project
    Context(context::ContextArgs),
}

/// A chat error the user has already seen as a notice
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Reported(pub ChatError);

/// Project selection shared by every command
#[derive(Args, Clone)]
pub struct ProjectArgs {
    /// JSON file with one project record or an array of them
    #[arg(short = 'f', long)]
    pub project_file: PathBuf,

    /// Project id within the file (defaults to the first record)
    #[arg(short, long)]
    pub project: Option<String>,
}

impl ProjectArgs {
    /// Load the project file and resolve which project to use
    pub fn load(&self) -> Result<(JsonProjects, String)> {
        let projects = JsonProjects::load(&self.project_file).with_context(|| {
            format!("Failed to read project file {}", self.project_file.display())
        })?;

        let project_id = self
            .project
            .clone()
            .or_else(|| projects.default_id().map(str::to_string))
            .unwrap_or_default();

        Ok((projects, project_id))
    }
}
