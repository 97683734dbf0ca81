//! Test utilities for tally-core
//!
//! This module provides a mock generative-language server speaking the
//! `generateContent` protocol, for backend and pipeline tests.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// A scripted reply for the next `generateContent` call
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 200 with this text as the first candidate part
    Text(String),
    /// 200 with no candidates at all
    NoCandidates,
    /// Non-2xx status with a plain body
    Status(u16, String),
}

/// A request the server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub api_key: Option<String>,
    pub prompt: String,
}

#[derive(Default)]
struct MockState {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock Gemini server for testing and development
///
/// Scripted replies are consumed in order. Once the script runs out, the server
/// answers categorization prompts with keyword-based categories and anything
/// else with a fixed sentence.
pub struct MockGeminiServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/v1/models/:model", get(handle_model).post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue a reply for the next generate call
    pub fn push_reply(&self, reply: MockReply) {
        self.state.replies.lock().unwrap().push_back(reply);
    }

    /// Queue a plain text reply
    pub fn push_text(&self, text: impl Into<String>) {
        self.push_reply(MockReply::Text(text.into()));
    }

    /// Every generate request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Model metadata endpoint (health check)
async fn handle_model(Path(model): Path<String>) -> Json<Value> {
    Json(json!({
        "name": format!("models/{}", model),
        "displayName": "Mock Gemini",
    }))
}

/// `POST /v1/models/{model}:generateContent`
async fn handle_generate(
    State(state): State<Arc<MockState>>,
    Path(model): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(model) = model.strip_suffix(":generateContent") else {
        return (StatusCode::NOT_FOUND, "unknown method").into_response();
    };

    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        model: model.to_string(),
        api_key,
        prompt: prompt.clone(),
    });

    let scripted = state.replies.lock().unwrap().pop_front();
    let reply = scripted.unwrap_or_else(|| MockReply::Text(default_reply(&prompt)));

    match reply {
        MockReply::Text(text) => Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP",
            }]
        }))
        .into_response(),
        MockReply::NoCandidates => Json(json!({ "candidates": [] })).into_response(),
        MockReply::Status(code, body) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
    }
}

/// Unscripted reply, chosen by prompt content (matches prompts/*.md)
fn default_reply(prompt: &str) -> String {
    if prompt.contains("Categorize the following bank transactions") {
        categorize_listing(prompt)
    } else {
        "Set aside a fixed amount every payday before you spend.".to_string()
    }
}

/// Build a categorization array from `N. description | amount | date | DR/CR` lines
fn categorize_listing(prompt: &str) -> String {
    let records: Vec<Value> = prompt
        .lines()
        .filter_map(|line| {
            let (number, rest) = line.split_once(". ")?;
            let index: usize = number.trim().parse().ok()?;
            let fields: Vec<&str> = rest.split(" | ").collect();
            let description = fields.first().copied().unwrap_or_default();
            let is_credit = fields.get(3).is_some_and(|f| f.trim() == "CR");
            Some(json!({
                "index": index,
                "description": description,
                "category": mock_category(description, is_credit),
                "amount": fields.get(1).and_then(|a| a.trim().parse::<f64>().ok()).unwrap_or(0.0),
                "date": fields.get(2).copied().unwrap_or_default(),
            }))
        })
        .collect();

    format!(
        "Here is the categorization:\n```json\n{}\n```",
        serde_json::to_string_pretty(&records).unwrap()
    )
}

fn mock_category(description: &str, is_credit: bool) -> &'static str {
    let d = description.to_lowercase();
    if is_credit || d.contains("salary") || d.contains("refund") {
        "Income"
    } else if d.contains("swiggy") || d.contains("zomato") || d.contains("restaurant") {
        "Food"
    } else if d.contains("uber") || d.contains("ola") || d.contains("flight") {
        "Travel"
    } else if d.contains("electricity") || d.contains("bill") || d.contains("rent") {
        "Bills"
    } else if d.contains("pharmacy") || d.contains("hospital") {
        "Health"
    } else if d.contains("bigbasket") || d.contains("grocery") || d.contains("mart") {
        "Groceries"
    } else {
        "Shopping"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_listing_reads_prompt_lines() {
        let prompt = "Categorize the following bank transactions.\n\
                      Transactions (number. description | amount | date | DR/CR):\n\
                      1. Swiggy Order | 250.00 | 2024-01-05 | DR\n\
                      2. Salary | 50000.00 | 2024-01-01 | CR";
        let reply = categorize_listing(prompt);
        let start = reply.find('[').unwrap();
        let end = reply.rfind(']').unwrap();
        let records: Vec<Value> = serde_json::from_str(&reply[start..=end]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["category"], "Food");
        assert_eq!(records[1]["index"], 2);
        assert_eq!(records[1]["category"], "Income");
    }
}
