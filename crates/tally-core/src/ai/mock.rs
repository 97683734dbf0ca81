//! Mock backend for testing
//!
//! Categorizes with keyword rules instead of a model, and can be told to fail
//! individual operations. Useful for unit tests and for running the server
//! without an API key (`AI_BACKEND=mock`).

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::analytics::CategoryTotal;
use crate::error::{Error, Result};
use crate::models::{CategorizedTransaction, Category, Transaction};
use crate::prompts::PromptLibrary;

use super::AIBackend;

/// Mock AI backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Make `categorize_transactions` fail with an API error
    pub fail_categorization: bool,
    /// Make `spending_tip` fail with an API error
    pub fail_tip: bool,
    tip: String,
    answer: String,
    model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            fail_categorization: false,
            fail_tip: false,
            tip: "Cook at home twice a week to cut food delivery costs.".to_string(),
            answer: "Your biggest expense category is a good place to start saving.".to_string(),
            model: "mock".to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::embedded_only())),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Mock whose categorization call always fails
    pub fn failing_categorization() -> Self {
        Self {
            fail_categorization: true,
            ..Self::new()
        }
    }

    /// Mock whose tip call always fails
    pub fn failing_tip() -> Self {
        Self {
            fail_tip: true,
            ..Self::new()
        }
    }

    pub fn with_tip(mut self, tip: &str) -> Self {
        self.tip = tip.to_string();
        self
    }

    /// Text returned by `complete`, and therefore by `answer_question`
    pub fn with_answer(mut self, answer: &str) -> Self {
        self.answer = answer.to_string();
        self
    }

    /// Create a new instance reporting a different model name
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    fn mock_failure(operation: &str) -> Error {
        Error::Api {
            status: 503,
            body: format!("mock {} failure", operation),
        }
    }
}

/// Keyword guess at a category; credits are always income
fn mock_category(tx: &Transaction) -> Category {
    if tx.is_credit() {
        return Category::Income;
    }
    let d = tx.description_or_empty().to_lowercase();
    match d.as_str() {
        d if d.contains("swiggy") || d.contains("zomato") || d.contains("restaurant") => {
            Category::Food
        }
        d if d.contains("uber") || d.contains("ola") || d.contains("flight") => Category::Travel,
        d if d.contains("electricity") || d.contains("bill") || d.contains("rent") => {
            Category::Bills
        }
        d if d.contains("pharmacy") || d.contains("hospital") => Category::Health,
        d if d.contains("bigbasket") || d.contains("grocery") || d.contains("mart") => {
            Category::Groceries
        }
        _ => Category::Shopping,
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.answer.clone())
    }

    fn prompts(&self) -> &RwLock<PromptLibrary> {
        &self.prompts
    }

    async fn categorize_transactions(
        &self,
        transactions: &[Transaction],
    ) -> Result<Vec<CategorizedTransaction>> {
        if self.fail_categorization {
            return Err(Self::mock_failure("categorization"));
        }
        Ok(transactions
            .iter()
            .map(|tx| CategorizedTransaction {
                description: tx.description.clone(),
                category: mock_category(tx),
                amount: tx.amount,
                date: tx.date.clone(),
            })
            .collect())
    }

    async fn spending_tip(
        &self,
        _inflow: f64,
        _outflow: f64,
        _categories: &[CategoryTotal],
    ) -> Result<String> {
        if self.fail_tip {
            return Err(Self::mock_failure("tip"));
        }
        Ok(self.tip.clone())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DrCr, DEFAULT_BALANCE};

    fn tx(description: &str, drcr: DrCr) -> Transaction {
        Transaction {
            description: Some(description.to_string()),
            amount: 10.0,
            date: "2024-01-01".to_string(),
            drcr,
            balance: DEFAULT_BALANCE,
        }
    }

    #[tokio::test]
    async fn test_mock_categorize() {
        let mock = MockBackend::new();
        let out = mock
            .categorize_transactions(&[
                tx("Swiggy Order", DrCr::Debit),
                tx("Refund from Swiggy", DrCr::Credit),
                tx("Apollo Pharmacy", DrCr::Debit),
            ])
            .await
            .unwrap();
        let cats: Vec<_> = out.iter().map(|c| c.category).collect();
        assert_eq!(cats, vec![Category::Food, Category::Income, Category::Health]);
    }

    #[tokio::test]
    async fn test_mock_failures() {
        let mock = MockBackend::failing_categorization();
        assert!(mock.categorize_transactions(&[]).await.is_err());
        assert!(mock.spending_tip(1.0, 1.0, &[]).await.is_ok());

        let mock = MockBackend::failing_tip();
        assert!(mock.spending_tip(1.0, 1.0, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let healthy = MockBackend::new();
        assert!(healthy.health_check().await);

        let unhealthy = MockBackend::unhealthy();
        assert!(!unhealthy.health_check().await);
    }
}
