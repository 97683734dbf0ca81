//! Tally CLI - AI-assisted bank statement analyzer
//!
//! Usage:
//!   tally serve --port 5000              Start web server
//!   tally analyze --file CSV [--json]    Categorize and analyze a statement
//!   tally categorize --file CSV          Keyword categorization (no AI)
//!   tally ask --file CSV --question Q    Ask a question about a statement

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Serve {
            port,
            host,
            static_dir,
            upload_dir,
            allow_any_origin,
        } => {
            commands::cmd_serve(
                &host,
                port,
                static_dir.as_deref(),
                upload_dir,
                allow_any_origin,
            )
            .await
        }
        Commands::Analyze { file, json, model } => {
            let ai = commands::require_ai(model.as_deref())?;
            let output = commands::cmd_analyze(&ai, &file, json).await?;
            println!("{}", output);
            Ok(())
        }
        Commands::Categorize { file } => {
            println!("{}", commands::cmd_categorize(&file)?);
            Ok(())
        }
        Commands::Ask {
            file,
            question,
            model,
        } => {
            let ai = commands::require_ai(model.as_deref())?;
            println!("{}", commands::cmd_ask(&ai, &file, &question).await?);
            Ok(())
        }
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { id }) => commands::cmd_prompts_show(&id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
    }
}
