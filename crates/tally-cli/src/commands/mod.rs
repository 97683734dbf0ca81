//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Statement commands (analyze, categorize, ask)
//! - `prompts` - Prompt library management commands
//! - `serve` - Web server command

pub mod analyze;
pub mod prompts;
pub mod serve;

// Re-export command functions for main.rs
pub use analyze::*;
pub use prompts::*;
pub use serve::*;

use anyhow::{bail, Result};
use tally_core::ai::AIClient;

/// AI client from the environment, or an error explaining what to set
pub fn require_ai(model: Option<&str>) -> Result<AIClient> {
    match AIClient::from_env() {
        Some(ai) => Ok(with_model_override(ai, model)),
        None => bail!(
            "AI backend not configured. Set GEMINI_API_KEY, or AI_BACKEND=openai_compatible \
             with OPENAI_COMPATIBLE_HOST, or AI_BACKEND=mock"
        ),
    }
}

/// Apply a `--model` flag, keeping the configured model when absent
pub fn with_model_override(ai: AIClient, model: Option<&str>) -> AIClient {
    match model.map(str::trim).filter(|m| !m.is_empty()) {
        Some(model) => ai.with_model(model),
        None => ai,
    }
}

/// Truncate a string for table output, respecting char boundaries
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
