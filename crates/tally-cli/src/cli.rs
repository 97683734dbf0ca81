//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Categorize and analyze bank statements
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "AI-assisted bank statement analyzer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Directory where uploads are spooled during analysis
        ///
        /// Defaults to TALLY_UPLOAD_DIR, then a `tally-uploads` folder in the
        /// system temp directory.
        #[arg(long)]
        upload_dir: Option<PathBuf>,

        /// Allow cross-origin requests from any origin
        ///
        /// WARNING: Only for local development with the UI on another port.
        #[arg(long)]
        allow_any_origin: bool,
    },

    /// Categorize a CSV statement with the AI backend and print analytics
    Analyze {
        /// CSV file to analyze
        #[arg(short, long)]
        file: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Override the model configured in the environment
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Categorize a CSV statement with local keyword rules (no AI)
    Categorize {
        /// CSV file to categorize
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Analyze a CSV statement, then ask a question about it
    Ask {
        /// CSV file to analyze
        #[arg(short, long)]
        file: PathBuf,

        /// Question to ask
        #[arg(short, long)]
        question: String,

        /// Override the model configured in the environment
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Manage AI prompts
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,
    /// Show the content of a prompt
    Show {
        /// Prompt ID (e.g., categorize_transactions)
        id: String,
    },
    /// Print the override directory
    Path,
}
