//! Spending analytics over one uploaded statement
//!
//! `SpendingAnalytics::compute` is a pure function of the normalized rows and
//! their categorized counterparts. The AI tip is attached afterwards by the
//! pipeline, which is why it lives on `AnalyticsSnapshot` instead.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::{CategorizedTransaction, Category, Transaction};

/// Category spend above this produces a reduction suggestion
pub const REDUCE_ADVICE_THRESHOLD: f64 = 1000.0;

/// Suggested target as a share of current category spend
pub const REDUCE_TARGET_RATIO: f64 = 0.7;

/// Any balance below this is a cash crunch
pub const CASH_CRUNCH_FLOOR: f64 = 1000.0;

/// Simulated annual return applied to the top three spends
pub const SIMULATED_GROWTH_FACTOR: f64 = 1.07;

pub const BASE_HEALTH_SCORE: i32 = 100;
pub const OVERSPEND_PENALTY: i32 = 20;
pub const CASH_CRUNCH_PENALTY: i32 = 15;
pub const ADVICE_PENALTY: i32 = 10;

/// Number of reduction suggestions that triggers `ADVICE_PENALTY`
pub const ADVICE_PENALTY_MIN_ENTRIES: usize = 3;

/// Tip used whenever the AI tip cannot be generated
pub const DEFAULT_AI_TIP: &str = "Track your daily expenses and set a monthly budget to save more.";

static BILL_KEYWORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)electricity|mobile|netflix|bill").expect("valid bill regex"));

/// A recurring-bill style payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillEntry {
    pub description: Option<String>,
    pub date: String,
    pub amount: f64,
}

/// Total spend for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
}

/// Debit totals for days 1-15 vs 16-31
///
/// Both halves are NaN (JSON `null`) when any debit has an unreadable day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HalfMonthComparison {
    pub first_half: f64,
    pub second_half: f64,
}

/// Derived statistics for one statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingAnalytics {
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub one_time_expenses: Vec<Transaction>,
    pub bill_calendar: Vec<BillEntry>,
    pub category_totals: Vec<CategoryTotal>,
    pub reduce_advice: Vec<String>,
    pub half_month_comparison: HalfMonthComparison,
    pub cash_crunch: bool,
    pub financial_health_score: i32,
    pub top3_spends: Vec<f64>,
    pub simulated_saved_amount: f64,
}

/// Analytics plus the AI-generated tip, as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    #[serde(flatten)]
    pub analytics: SpendingAnalytics,
    /// `financialHealthScore` again, under the name the web client reads
    pub score: i32,
    pub ai_tip: String,
}

impl SpendingAnalytics {
    pub fn compute(transactions: &[Transaction], categorized: &[CategorizedTransaction]) -> Self {
        let total_inflow: f64 = transactions
            .iter()
            .filter(|t| t.is_credit())
            .map(|t| t.amount)
            .sum();
        let total_outflow: f64 = transactions
            .iter()
            .filter(|t| t.is_debit())
            .map(|t| t.amount)
            .sum();

        let one_time_expenses = one_time_expenses(transactions);

        let bill_calendar = transactions
            .iter()
            .filter(|t| {
                t.description
                    .as_deref()
                    .is_some_and(|d| BILL_KEYWORDS.is_match(d))
            })
            .map(|t| BillEntry {
                description: t.description.clone(),
                date: t.date.clone(),
                amount: t.amount,
            })
            .collect();

        let category_totals = category_totals(categorized);
        let reduce_advice = reduce_advice(&category_totals);

        let half_month_comparison = half_month_comparison(transactions);

        let cash_crunch = transactions.iter().any(|t| t.balance < CASH_CRUNCH_FLOOR);

        let financial_health_score =
            health_score(total_outflow > total_inflow, cash_crunch, reduce_advice.len());

        let mut debit_amounts: Vec<f64> = transactions
            .iter()
            .filter(|t| t.is_debit())
            .map(|t| t.amount)
            .collect();
        debit_amounts.sort_by(|a, b| b.total_cmp(a));
        let top3_spends: Vec<f64> = debit_amounts.into_iter().take(3).collect();
        let simulated_saved_amount = top3_spends.iter().sum::<f64>() * SIMULATED_GROWTH_FACTOR;

        Self {
            total_inflow,
            total_outflow,
            one_time_expenses,
            bill_calendar,
            category_totals,
            reduce_advice,
            half_month_comparison,
            cash_crunch,
            financial_health_score,
            top3_spends,
            simulated_saved_amount,
        }
    }

    pub fn with_tip(self, ai_tip: impl Into<String>) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            score: self.financial_health_score,
            analytics: self,
            ai_tip: ai_tip.into(),
        }
    }
}

/// Score starting at 100, minus fixed penalties. Not clamped at zero.
pub fn health_score(outflow_exceeds_inflow: bool, cash_crunch: bool, advice_count: usize) -> i32 {
    let mut score = BASE_HEALTH_SCORE;
    if outflow_exceeds_inflow {
        score -= OVERSPEND_PENALTY;
    }
    if cash_crunch {
        score -= CASH_CRUNCH_PENALTY;
    }
    if advice_count >= ADVICE_PENALTY_MIN_ENTRIES {
        score -= ADVICE_PENALTY;
    }
    score
}

/// Debits whose description appears exactly once in the whole statement
///
/// Credits count toward the multiplicity: a debit sharing its description with
/// a refund is not one-time.
fn one_time_expenses(transactions: &[Transaction]) -> Vec<Transaction> {
    let mut counts: HashMap<Option<&str>, usize> = HashMap::new();
    for t in transactions {
        *counts.entry(t.description.as_deref()).or_default() += 1;
    }

    transactions
        .iter()
        .filter(|t| t.is_debit() && counts.get(&t.description.as_deref()) == Some(&1))
        .cloned()
        .collect()
}

/// Per-category sums over the categorized list, in first-seen order
fn category_totals(categorized: &[CategorizedTransaction]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for c in categorized {
        match totals.iter_mut().find(|t| t.category == c.category) {
            Some(existing) => existing.total += c.amount,
            None => totals.push(CategoryTotal {
                category: c.category,
                total: c.amount,
            }),
        }
    }
    totals
}

fn reduce_advice(totals: &[CategoryTotal]) -> Vec<String> {
    totals
        .iter()
        .filter(|t| !t.category.is_income() && t.total > REDUCE_ADVICE_THRESHOLD)
        .map(|t| {
            format!(
                "Reduce {} spending: you spent ₹{:.2}, try to keep it under ₹{:.2} next month.",
                t.category,
                t.total,
                t.total * REDUCE_TARGET_RATIO
            )
        })
        .collect()
}

fn half_month_comparison(transactions: &[Transaction]) -> HalfMonthComparison {
    let mut first_half = 0.0;
    let mut second_half = 0.0;

    for t in transactions.iter().filter(|t| t.is_debit()) {
        match day_of_month(&t.date) {
            Some(day) if day <= 15 => first_half += t.amount,
            Some(_) => second_half += t.amount,
            None => {
                first_half = f64::NAN;
                second_half = f64::NAN;
            }
        }
    }

    HalfMonthComparison {
        first_half,
        second_half,
    }
}

/// Leading integer of the third `-`-separated component (`2024-01-05` -> 5)
fn day_of_month(date: &str) -> Option<u32> {
    let part = date.split('-').nth(2)?.trim_start();
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
