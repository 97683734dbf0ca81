//! Question answering over the session's last analysis

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use tally_core::advisor::answer_question;
use tally_core::Error;

use super::session_from_headers;
use crate::{AppError, AppState};

const ANSWER_FAILED: &str = "Failed to answer question";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// POST /ask-question - Answer a question about the uploaded transactions
pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let session_id = session_from_headers(&headers)?;

    let question = req.question.trim();
    if question.is_empty() {
        return Err(AppError::bad_request("Question is required"));
    }

    let transactions = state.sessions.get(&session_id).await.unwrap_or_default();
    if transactions.is_empty() {
        return Err(AppError::bad_request(&Error::NoTransactions.to_string()));
    }

    let ai = state.ai.as_ref().ok_or_else(|| {
        AppError::internal(ANSWER_FAILED)
            .with_source(Error::NotConfigured("set GEMINI_API_KEY or AI_BACKEND".into()))
    })?;

    info!(session = %session_id, transactions = transactions.len(), "Answering question");

    let answer = answer_question(ai, &transactions, question)
        .await
        .map_err(|err| match err {
            Error::NoTransactions => AppError::bad_request(&Error::NoTransactions.to_string()),
            other => AppError::internal(ANSWER_FAILED).with_source(other),
        })?;

    Ok(Json(AskResponse { answer }))
}
