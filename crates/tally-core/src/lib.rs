//! Tally Core Library
//!
//! Shared functionality for the Tally transaction analyzer:
//! - CSV import with tolerant column aliases
//! - Keyword categorization for quick previews
//! - Pluggable generative-language backends (Gemini, OpenAI-compatible, mock)
//! - Prompt library for customizable AI prompts
//! - Spending analytics and the end-to-end analysis pipeline
//! - Question answering over an analyzed statement

pub mod advisor;
pub mod ai;
pub mod analytics;
pub mod categorize;
pub mod error;
pub mod import;
pub mod models;
pub mod pipeline;
pub mod prompts;

/// Test utilities including a mock Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advisor::{answer_question, QuestionContext, ANSWER_FALLBACK};
pub use ai::{AIBackend, AIClient, GeminiBackend, MockBackend, OpenAICompatibleBackend};
pub use analytics::{
    AnalyticsSnapshot, BillEntry, CategoryTotal, HalfMonthComparison, SpendingAnalytics,
    DEFAULT_AI_TIP,
};
pub use categorize::categorize;
pub use error::{Error, Result};
pub use import::{annotate_rows, parse_transactions};
pub use models::{
    AnnotatedRow, CategorizedTransaction, Category, DrCr, LocalCategory, RawRow, Transaction,
};
pub use pipeline::{analyze, AnalysisReport};
pub use prompts::{Prompt, PromptId, PromptLibrary};
