//! Chat command - Talk to the project assistant.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use vitrine_chat::{
    ChatConfig, ChatError, ChatOrchestrator, ChatTurn, Notice, NoticeLevel, NotificationSink,
    SendOutcome,
};

use super::{ProjectArgs, Reported};

#[derive(Args)]
pub struct ChatArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Ask a single question and exit
    #[arg(short, long)]
    message: Option<String>,

    /// Assistant endpoint (overrides settings and environment)
    #[arg(long)]
    endpoint: Option<String>,

    /// Workspace holding .vitrine/settings.json (defaults to current directory)
    #[arg(short, long)]
    workspace: Option<PathBuf>,
}

/// Prints notices to stderr
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Warning => eprintln!("⚠️  {}", notice.message),
            NoticeLevel::Error => eprintln!("❌ {}", notice.message),
        }
    }
}

pub async fn execute(args: ChatArgs) -> Result<()> {
    let (projects, project_id) = args.project.load()?;
    let config = resolve_config(&args)?;

    info!("Chatting about project '{}' via {}", project_id, config.endpoint);

    let chat = ChatOrchestrator::from_config(&config, Arc::new(projects), project_id)?
        .sink(Arc::new(ConsoleSink))
        .welcome(config.welcome && args.message.is_none())
        .build();

    match args.message {
        Some(message) => ask_once(&chat, &message).await,
        None => interactive(&chat).await,
    }
}

fn resolve_config(args: &ChatArgs) -> Result<ChatConfig> {
    let root = match args.workspace {
        Some(ref path) => path.clone(),
        None => std::env::current_dir()?,
    };
    Ok(ChatConfig::resolve(&root, args.endpoint.as_deref())?)
}

async fn ask_once(chat: &ChatOrchestrator, message: &str) -> Result<()> {
    match chat.send_message(message).await {
        SendOutcome::Replied(turn) => {
            println!("{}", turn.content);
            Ok(())
        }
        SendOutcome::LimitReached => Err(Reported(ChatError::QuotaExceeded).into()),
        SendOutcome::Failed(e) => Err(Reported(e).into()),
        SendOutcome::Ignored | SendOutcome::Abandoned => {
            anyhow::bail!("Empty message, nothing to ask (invalid argument)")
        }
    }
}

async fn interactive(chat: &ChatOrchestrator) -> Result<()> {
    for turn in chat.state().messages {
        print_turn(&turn);
    }
    println!("(type /project <id> to switch project, /quit to leave)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        if line == "/quit" || line == "/exit" {
            break;
        }
        if let Some(id) = line.strip_prefix("/project ") {
            chat.switch_project(id.trim());
            println!("📁 Now chatting about '{}'", chat.project_id());
            for turn in chat.state().messages {
                print_turn(&turn);
            }
            continue;
        }

        match chat.send_message(line).await {
            SendOutcome::Replied(turn) => print_turn(&turn),
            SendOutcome::LimitReached => return Err(Reported(ChatError::QuotaExceeded).into()),
            SendOutcome::Failed(e) if e.is_recoverable() => {
                debug!("Send failed, waiting for next input: {}", e)
            }
            SendOutcome::Failed(e) => return Err(Reported(e).into()),
            SendOutcome::Ignored | SendOutcome::Abandoned => {}
        }
    }

    Ok(())
}

fn print_turn(turn: &ChatTurn) {
    println!("🤖 {}", turn.content);
    println!();
}
