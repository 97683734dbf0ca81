//! Statement analysis handler

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use tracing::info;

use tally_core::pipeline::{analyze, AnalysisReport};
use tally_core::Error;

use super::session_from_headers;
use crate::upload::{read_file_field, spool_to_disk};
use crate::{AppError, AppState};

/// Multipart field carrying the statement
const FILE_FIELD: &str = "csvFile";

const ANALYZE_FAILED: &str = "Failed to analyze transactions";

/// Analysis response: the report plus the session it was stored under
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub session_id: String,
}

/// POST /analyze-transactions - Categorize and analyze an uploaded CSV statement
///
/// Expects multipart form with a `csvFile` field. The categorized list replaces
/// the caller's session data for later questions.
pub async fn analyze_transactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let session_id = session_from_headers(&headers)?;

    let file = read_file_field(&mut multipart, FILE_FIELD)
        .await?
        .ok_or_else(|| AppError::bad_request("No file uploaded"))?;

    if !file.looks_like_csv() {
        return Err(AppError::bad_request("Only CSV files are allowed"));
    }

    let ai = state.ai.as_ref().ok_or_else(|| {
        AppError::internal(ANALYZE_FAILED)
            .with_source(Error::NotConfigured("set GEMINI_API_KEY or AI_BACKEND".into()))
    })?;

    info!(
        session = %session_id,
        bytes = file.data.len(),
        file = file.file_name.as_deref().unwrap_or("-"),
        "Analyzing uploaded statement"
    );

    // Removed from disk when `spooled` drops, on every path out of this handler
    let spooled = spool_to_disk(&state.config.upload_dir, &file.data)
        .map_err(|e| AppError::internal(ANALYZE_FAILED).with_source(e))?;
    let reader = spooled
        .reopen()
        .map_err(|e| AppError::internal(ANALYZE_FAILED).with_source(e))?;

    let report = analyze(ai, reader)
        .await
        .map_err(|e| AppError::internal(ANALYZE_FAILED).with_source(e))?;

    state
        .sessions
        .store(&session_id, report.categorized.clone())
        .await;

    info!(
        session = %session_id,
        transactions = report.categorized.len(),
        score = report.analytics.analytics.financial_health_score,
        "Analysis complete"
    );

    Ok(Json(AnalyzeResponse { report, session_id }))
}
