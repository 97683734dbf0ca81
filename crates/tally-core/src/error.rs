//! Error types for Tally

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Prompt frontmatter error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("AI API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The categorized records could not be matched back to the uploaded rows
    #[error("Categorization mismatch: {0}")]
    Reconciliation(String),

    #[error("No transactions available. Upload CSV first.")]
    NoTransactions,

    #[error("AI backend not configured: {0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, Error>;
