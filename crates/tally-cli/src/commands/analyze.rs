//! Statement command implementations

use std::fmt::Write as _;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tally_core::analytics::CASH_CRUNCH_FLOOR;
use tally_core::{annotate_rows, answer_question, AIBackend, AIClient, AnalysisReport};
use tracing::{debug, info};

use super::truncate;

fn open_statement(file: &Path) -> Result<File> {
    debug!(file = %file.display(), "Opening statement");
    File::open(file).with_context(|| format!("Failed to open {}", file.display()))
}

/// Categorize and analyze a statement, rendered as text or JSON
pub async fn cmd_analyze(ai: &AIClient, file: &Path, json: bool) -> Result<String> {
    let report = tally_core::analyze(ai, open_statement(file)?)
        .await
        .with_context(|| format!("Failed to analyze {}", file.display()))?;

    if json {
        return Ok(serde_json::to_string_pretty(&report)?);
    }
    Ok(format_report(&report))
}

/// Tag every row with the keyword categorizer
pub fn cmd_categorize(file: &Path) -> Result<String> {
    let rows = annotate_rows(open_statement(file)?)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let mut out = String::new();
    let _ = writeln!(out, "{:<40} {:<10}", "DESCRIPTION", "CATEGORY");
    let _ = writeln!(out, "{}", "-".repeat(51));
    for row in &rows {
        let description = row.row.get(&["Description"]).unwrap_or("");
        let _ = writeln!(
            out,
            "{:<40} {:<10}",
            truncate(description, 40),
            row.category.as_str()
        );
    }
    let _ = write!(out, "\n{} rows", rows.len());
    Ok(out)
}

/// Analyze a statement, then answer a question about it
pub async fn cmd_ask(ai: &AIClient, file: &Path, question: &str) -> Result<String> {
    let question = question.trim();
    anyhow::ensure!(!question.is_empty(), "Question is required");

    let report = tally_core::analyze(ai, open_statement(file)?)
        .await
        .with_context(|| format!("Failed to analyze {}", file.display()))?;

    info!(
        count = report.categorized.len(),
        model = %ai.model(),
        "Answering question"
    );
    let answer = answer_question(ai, &report.categorized, question)
        .await
        .context("Failed to answer question")?;
    Ok(answer)
}

/// Human-readable summary of an analysis
pub fn format_report(report: &AnalysisReport) -> String {
    let analytics = &report.analytics.analytics;
    let mut out = String::new();

    let _ = writeln!(out, "Transactions ({})", report.categorized.len());
    let _ = writeln!(
        out,
        "{:<12} {:<32} {:>12}  {}",
        "DATE", "DESCRIPTION", "AMOUNT", "CATEGORY"
    );
    let _ = writeln!(out, "{}", "-".repeat(72));
    for tx in &report.categorized {
        let _ = writeln!(
            out,
            "{:<12} {:<32} {:>12.2}  {}",
            truncate(&tx.date, 12),
            truncate(tx.description.as_deref().unwrap_or(""), 32),
            tx.amount,
            tx.category
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Total inflow:   ₹{:.2}", analytics.total_inflow);
    let _ = writeln!(out, "Total outflow:  ₹{:.2}", analytics.total_outflow);
    let _ = writeln!(out, "Health score:   {}", analytics.financial_health_score);
    if analytics.cash_crunch {
        let _ = writeln!(
            out,
            "⚠️  Cash crunch: balance fell below ₹{:.0}",
            CASH_CRUNCH_FLOOR
        );
    }

    if !analytics.category_totals.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "By category:");
        for total in &analytics.category_totals {
            let _ = writeln!(out, "  {:<14} ₹{:.2}", total.category.as_str(), total.total);
        }
    }

    if !analytics.bill_calendar.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Bills:");
        for bill in &analytics.bill_calendar {
            let _ = writeln!(
                out,
                "  {:<12} {:<30} ₹{:.2}",
                bill.date,
                truncate(bill.description.as_deref().unwrap_or(""), 30),
                bill.amount
            );
        }
    }

    if !analytics.reduce_advice.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Advice:");
        for advice in &analytics.reduce_advice {
            let _ = writeln!(out, "  - {}", advice);
        }
    }

    let _ = writeln!(out);
    let _ = write!(out, "💡 {}", report.analytics.ai_tip);
    out
}
