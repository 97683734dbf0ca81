//! Pluggable generative-language backend abstraction
//!
//! # Architecture
//!
//! - `AIBackend` trait: one required `complete` call plus prompt-driven
//!   operations (categorize, tip, answer) built on top of it
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let ai = AIClient::from_env().expect("AI backend configured");
//! let categorized = ai.categorize_transactions(&transactions).await?;
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (gemini, openai_compatible, mock). Default: gemini
//! - `GEMINI_API_KEY`: API key (required for gemini backend)
//! - `GEMINI_MODEL`: Model name (default: gemini-1.5-flash)
//! - `GEMINI_BASE_URL`: API root (default: https://generativelanguage.googleapis.com)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)
//! - `AI_TIMEOUT_SECS`: Per-request timeout (default: 30)

mod gemini;
mod mock;
mod openai_compatible;
pub mod parsing;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::advisor::{QuestionContext, ANSWER_FALLBACK};
use crate::analytics::CategoryTotal;
use crate::error::{Error, Result};
use crate::models::{CategorizedTransaction, Category, Transaction};
use crate::prompts::{PromptId, PromptLibrary};

use parsing::{parse_categorizations, reconcile};

/// Default per-request timeout for outbound AI calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read `AI_TIMEOUT_SECS`, falling back to `DEFAULT_TIMEOUT`
pub fn timeout_from_env() -> Duration {
    std::env::var("AI_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT)
}

/// Trait defining the interface for all AI backends
///
/// Backends only need to send a single prompt and return the model's text;
/// the prompt-driven operations have default implementations.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send one user prompt and return the model's text reply
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Prompt templates used by the default operations
    fn prompts(&self) -> &RwLock<PromptLibrary>;

    /// Render a prompt template with the given variables
    fn render_prompt(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<String> {
        let mut prompts = self
            .prompts()
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        prompts.render(id, vars)
    }

    /// Categorize every transaction in one batch request
    async fn categorize_transactions(
        &self,
        transactions: &[Transaction],
    ) -> Result<Vec<CategorizedTransaction>> {
        if transactions.is_empty() {
            return Ok(Vec::new());
        }

        let categories = Category::all()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let listing = format_transaction_list(transactions);

        let mut vars = HashMap::new();
        vars.insert("categories", categories.as_str());
        vars.insert("transactions", listing.as_str());
        let prompt = self.render_prompt(PromptId::CategorizeTransactions, &vars)?;

        let response = self.complete(&prompt).await?;
        debug!("Categorization response: {}", response);

        let records = parse_categorizations(&response)?;
        reconcile(transactions, records)
    }

    /// One short saving tip for the given totals
    async fn spending_tip(
        &self,
        inflow: f64,
        outflow: f64,
        categories: &[CategoryTotal],
    ) -> Result<String> {
        let inflow = format!("{:.2}", inflow);
        let outflow = format!("{:.2}", outflow);
        let categories = if categories.is_empty() {
            "none".to_string()
        } else {
            categories
                .iter()
                .map(|c| format!("{} (₹{:.2})", c.category, c.total))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut vars = HashMap::new();
        vars.insert("inflow", inflow.as_str());
        vars.insert("outflow", outflow.as_str());
        vars.insert("categories", categories.as_str());
        let prompt = self.render_prompt(PromptId::SpendingTip, &vars)?;

        let response = self.complete(&prompt).await?;
        debug!("Spending tip response: {}", response);
        Ok(response.trim().to_string())
    }

    /// Answer a free-text question using the statement summary as context
    async fn answer_question(&self, context: &QuestionContext, question: &str) -> Result<String> {
        let summary = context.summary();
        let mut vars = HashMap::new();
        vars.insert("summary", summary.as_str());
        vars.insert("question", question);
        let prompt = self.render_prompt(PromptId::AnswerQuestion, &vars)?;

        let response = self.complete(&prompt).await?;
        if response.trim().is_empty() {
            return Ok(ANSWER_FALLBACK.to_string());
        }
        Ok(response)
    }

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// `N. description | amount | date | DR/CR`, one line per transaction
fn format_transaction_list(transactions: &[Transaction]) -> String {
    transactions
        .iter()
        .enumerate()
        .map(|(i, tx)| {
            format!(
                "{}. {} | {:.2} | {} | {}",
                i + 1,
                tx.description_or_empty(),
                tx.amount,
                tx.date,
                tx.drcr
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google generative-language API
    Gemini(GeminiBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `gemini` (default): Uses GEMINI_API_KEY, GEMINI_MODEL and GEMINI_BASE_URL
    /// - `openai_compatible`: Uses OPENAI_COMPATIBLE_HOST and OPENAI_COMPATIBLE_MODEL
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" | "google" => GeminiBackend::from_env().map(AIClient::Gemini),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to gemini");
                GeminiBackend::from_env().map(AIClient::Gemini)
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model (`--model` override)
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Gemini(b) => AIClient::Gemini(b.with_model(model)),
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }
}

// Delegate everything to the inner backend so backend overrides are honored
#[async_trait]
impl AIBackend for AIClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.complete(prompt).await,
            AIClient::OpenAICompatible(b) => b.complete(prompt).await,
            AIClient::Mock(b) => b.complete(prompt).await,
        }
    }

    fn prompts(&self) -> &RwLock<PromptLibrary> {
        match self {
            AIClient::Gemini(b) => b.prompts(),
            AIClient::OpenAICompatible(b) => b.prompts(),
            AIClient::Mock(b) => b.prompts(),
        }
    }

    async fn categorize_transactions(
        &self,
        transactions: &[Transaction],
    ) -> Result<Vec<CategorizedTransaction>> {
        match self {
            AIClient::Gemini(b) => b.categorize_transactions(transactions).await,
            AIClient::OpenAICompatible(b) => b.categorize_transactions(transactions).await,
            AIClient::Mock(b) => b.categorize_transactions(transactions).await,
        }
    }

    async fn spending_tip(
        &self,
        inflow: f64,
        outflow: f64,
        categories: &[CategoryTotal],
    ) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.spending_tip(inflow, outflow, categories).await,
            AIClient::OpenAICompatible(b) => b.spending_tip(inflow, outflow, categories).await,
            AIClient::Mock(b) => b.spending_tip(inflow, outflow, categories).await,
        }
    }

    async fn answer_question(&self, context: &QuestionContext, question: &str) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.answer_question(context, question).await,
            AIClient::OpenAICompatible(b) => b.answer_question(context, question).await,
            AIClient::Mock(b) => b.answer_question(context, question).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DrCr, DEFAULT_BALANCE};

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[test]
    fn test_ai_client_with_model() {
        let client = AIClient::mock();
        let other = client.with_model("gemini-1.5-pro");
        assert_eq!(other.model(), "gemini-1.5-pro");
        assert_eq!(client.model(), "mock");

        let gemini = AIClient::Gemini(GeminiBackend::new("http://localhost:1", "a", "key"));
        assert_eq!(gemini.with_model("b").model(), "b");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = AIClient::mock();
        assert!(client.health_check().await);
    }

    #[test]
    fn test_format_transaction_list() {
        let txs = vec![
            Transaction {
                description: Some("Swiggy Order".into()),
                amount: 250.0,
                date: "2024-01-05".into(),
                drcr: DrCr::Debit,
                balance: DEFAULT_BALANCE,
            },
            Transaction {
                description: None,
                amount: 50000.0,
                date: "2024-01-01".into(),
                drcr: DrCr::Credit,
                balance: DEFAULT_BALANCE,
            },
        ];
        assert_eq!(
            format_transaction_list(&txs),
            "1. Swiggy Order | 250.00 | 2024-01-05 | DR\n2.  | 50000.00 | 2024-01-01 | CR"
        );
    }

    #[tokio::test]
    async fn test_client_delegates_mock_overrides() {
        let client = AIClient::Mock(MockBackend::new().with_tip("Cook at home."));
        let tip = client.spending_tip(100.0, 50.0, &[]).await.unwrap();
        assert_eq!(tip, "Cook at home.");
    }
}
