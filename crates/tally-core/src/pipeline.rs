//! End-to-end analysis of one uploaded statement

use std::io::Read;

use serde::Serialize;
use tracing::{info, warn};

use crate::ai::AIBackend;
use crate::analytics::{AnalyticsSnapshot, SpendingAnalytics, DEFAULT_AI_TIP};
use crate::error::Result;
use crate::import::parse_transactions;
use crate::models::CategorizedTransaction;

/// Categorized rows plus analytics for one statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub categorized: Vec<CategorizedTransaction>,
    pub analytics: AnalyticsSnapshot,
}

/// Parse, categorize and analyze a CSV statement
///
/// A categorization failure aborts the analysis. A tip failure only replaces
/// the tip with `DEFAULT_AI_TIP`.
pub async fn analyze<B, R>(ai: &B, reader: R) -> Result<AnalysisReport>
where
    B: AIBackend + ?Sized,
    R: Read,
{
    let transactions = parse_transactions(reader)?;
    info!(count = transactions.len(), "Parsed transactions");

    let categorized = ai.categorize_transactions(&transactions).await?;
    info!(count = categorized.len(), model = %ai.model(), "Categorized transactions");

    let analytics = SpendingAnalytics::compute(&transactions, &categorized);

    let tip = match ai
        .spending_tip(
            analytics.total_inflow,
            analytics.total_outflow,
            &analytics.category_totals,
        )
        .await
    {
        Ok(tip) if !tip.trim().is_empty() => tip,
        Ok(_) => {
            warn!("AI returned an empty tip, using default");
            DEFAULT_AI_TIP.to_string()
        }
        Err(e) => {
            warn!("Failed to generate spending tip: {}", e);
            DEFAULT_AI_TIP.to_string()
        }
    };

    Ok(AnalysisReport {
        categorized,
        analytics: analytics.with_tip(tip),
    })
}
