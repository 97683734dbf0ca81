//! Greeting, AI backend status and session info

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use tally_core::ai::AIBackend;

use super::session_from_headers;
use crate::{AppError, AppState, SessionInfo};

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub message: &'static str,
}

/// GET /api/hello - Liveness greeting
pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello from server!",
    })
}

/// AI backend status
#[derive(Debug, Serialize)]
pub struct AiStatus {
    pub configured: bool,
    pub host: Option<String>,
    pub model: Option<String>,
    pub healthy: bool,
}

/// GET /api/ai/status - Whether the AI backend is configured and reachable
pub async fn ai_status(State(state): State<Arc<AppState>>) -> Json<AiStatus> {
    match state.ai {
        Some(ref ai) => Json(AiStatus {
            configured: true,
            host: Some(ai.host().to_string()),
            model: Some(ai.model().to_string()),
            healthy: ai.health_check().await,
        }),
        None => Json(AiStatus {
            configured: false,
            host: None,
            model: None,
            healthy: false,
        }),
    }
}

/// GET /api/session - Summary of the caller's stored analysis
pub async fn session_info(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SessionInfo>, AppError> {
    let session_id = session_from_headers(&headers)?;
    state
        .sessions
        .info(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("No active session"))
}
