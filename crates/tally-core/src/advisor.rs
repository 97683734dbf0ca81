//! Free-text questions about an analyzed statement

use std::fmt::Write as _;

use serde::Serialize;

use crate::ai::AIBackend;
use crate::analytics::CategoryTotal;
use crate::error::{Error, Result};
use crate::models::CategorizedTransaction;

/// Returned when the model answers with empty text
pub const ANSWER_FALLBACK: &str =
    "Sorry, I couldn't generate an answer right now. Please try again.";

/// Income/expense digest of a categorized statement, fed to the model as context
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionContext {
    pub total_income: f64,
    pub total_expenses: f64,
    /// Non-income categories in first-seen order
    pub expenses_by_category: Vec<CategoryTotal>,
    pub transaction_count: usize,
}

impl QuestionContext {
    pub fn from_transactions(transactions: &[CategorizedTransaction]) -> Self {
        let mut total_income = 0.0;
        let mut total_expenses = 0.0;
        let mut expenses_by_category: Vec<CategoryTotal> = Vec::new();

        for tx in transactions {
            if tx.category.is_income() {
                total_income += tx.amount;
                continue;
            }
            total_expenses += tx.amount;
            match expenses_by_category
                .iter_mut()
                .find(|t| t.category == tx.category)
            {
                Some(existing) => existing.total += tx.amount,
                None => expenses_by_category.push(CategoryTotal {
                    category: tx.category,
                    total: tx.amount,
                }),
            }
        }

        Self {
            total_income,
            total_expenses,
            expenses_by_category,
            transaction_count: transactions.len(),
        }
    }

    /// Plain-text summary embedded in the question prompt
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Number of transactions: {}", self.transaction_count);
        let _ = writeln!(out, "Total income: ₹{:.2}", self.total_income);
        let _ = writeln!(out, "Total expenses: ₹{:.2}", self.total_expenses);
        let _ = writeln!(out, "Expenses by category:");
        if self.expenses_by_category.is_empty() {
            let _ = writeln!(out, "- none");
        }
        for entry in &self.expenses_by_category {
            let _ = writeln!(out, "- {}: ₹{:.2}", entry.category, entry.total);
        }
        out.trim_end().to_string()
    }
}

/// Answer a question about the given transactions
///
/// Fails with `Error::NoTransactions` before contacting the model when there is
/// nothing to talk about.
pub async fn answer_question<B>(
    ai: &B,
    transactions: &[CategorizedTransaction],
    question: &str,
) -> Result<String>
where
    B: AIBackend + ?Sized,
{
    if transactions.is_empty() {
        return Err(Error::NoTransactions);
    }
    let context = QuestionContext::from_transactions(transactions);
    ai.answer_question(&context, question).await
}
