//! Context command - Show what the assistant is told about a project.

use anyhow::Result;
use clap::Args;
use tracing::warn;

use vitrine_chat::{build_context, ProjectProvider};

use super::ProjectArgs;

#[derive(Args)]
pub struct ContextArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Print as a JSON string
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: ContextArgs) -> Result<()> {
    let (projects, project_id) = args.project.load()?;

    let record = projects.project(&project_id).await?;
    if record.is_none() {
        warn!("Project '{}' not found in file, showing empty context", project_id);
    }

    let context = build_context(record.as_ref());
    if args.json {
        println!("{}", serde_json::to_string(&context)?);
    } else {
        println!("{}", context);
    }

    Ok(())
}
