//! Vitrine CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Assistant not configured
//! - 4: Daily chat limit reached

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands, Reported};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const NOT_CONFIGURED: u8 = 3;
    pub const LIMIT_REACHED: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "vitrine=debug"
    } else if cli.quiet {
        "vitrine=error"
    } else {
        "vitrine=info"
    };

    let mut filter = EnvFilter::from_default_env();
    for directive in [default_level, "warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Chat(args) => commands::chat::execute(args).await,
        Commands::Context(args) => commands::context::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            if e.downcast_ref::<Reported>().is_none() {
                eprintln!("❌ Error: {:#}", e);
            }
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let chat_err = e
        .downcast_ref::<vitrine_chat::ChatError>()
        .or_else(|| e.downcast_ref::<Reported>().map(|r| &r.0));
    if let Some(chat_err) = chat_err {
        return match chat_err {
            vitrine_chat::ChatError::NotConfigured => ExitCodes::NOT_CONFIGURED,
            vitrine_chat::ChatError::QuotaExceeded => ExitCodes::LIMIT_REACHED,
            _ => ExitCodes::GENERAL_ERROR,
        };
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_chat_errors() {
        let err = anyhow::Error::new(vitrine_chat::ChatError::NotConfigured);
        assert_eq!(categorize_error(&err), ExitCodes::NOT_CONFIGURED);

        let err = anyhow::Error::new(vitrine_chat::ChatError::QuotaExceeded);
        assert_eq!(categorize_error(&err), ExitCodes::LIMIT_REACHED);

        let err = anyhow::Error::new(Reported(vitrine_chat::ChatError::QuotaExceeded));
        assert_eq!(categorize_error(&err), ExitCodes::LIMIT_REACHED);

        let err = anyhow::anyhow!("Project not found: beacon");
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_ARGS);

        let err = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }
}
