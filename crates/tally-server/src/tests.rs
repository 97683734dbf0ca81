//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::path::Path;
use tally_core::ai::MockBackend;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "tally-test-boundary";

const STATEMENT: &str = "Description,Amount,Date,DR/CR,Balance\n\
                         Swiggy Order,250,2024-01-05,DR,49750\n\
                         Salary,50000,2024-01-01,CR,50000\n";

fn setup_test_app(ai: Option<AIClient>, upload_dir: &Path) -> Router {
    let config = ServerConfig {
        upload_dir: upload_dir.to_path_buf(),
        ..Default::default()
    };
    create_router_with_ai(ai, None, config)
}

fn mock_app(upload_dir: &Path) -> Router {
    setup_test_app(Some(AIClient::mock()), upload_dir)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, field, filename, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session);
    }
    builder.body(Body::from(body)).unwrap()
}

fn statement_upload(session: Option<&str>) -> Request<Body> {
    multipart_request(
        "/analyze-transactions",
        multipart_body("csvFile", "statement.csv", "text/csv", STATEMENT.as_bytes()),
        session,
    )
}

fn ask_request(question: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/ask-question")
        .header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session);
    }
    builder
        .body(Body::from(
            serde_json::json!({ "question": question }).to_string(),
        ))
        .unwrap()
}

// ========== Greeting & Status ==========

#[tokio::test]
async fn test_hello() {
    let dir = TempDir::new().unwrap();
    let response = mock_app(dir.path())
        .oneshot(
            Request::builder()
                .uri("/api/hello")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");

    let json = get_body_json(response).await;
    assert_eq!(json["message"], "Hello from server!");
}

#[tokio::test]
async fn test_ai_status_with_mock() {
    let dir = TempDir::new().unwrap();
    let response = mock_app(dir.path())
        .oneshot(
            Request::builder()
                .uri("/api/ai/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["configured"], true);
    assert_eq!(json["model"], "mock");
    assert_eq!(json["healthy"], true);
}

#[tokio::test]
async fn test_ai_status_unconfigured() {
    let dir = TempDir::new().unwrap();
    let response = setup_test_app(None, dir.path())
        .oneshot(
            Request::builder()
                .uri("/api/ai/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["configured"], false);
    assert!(json["host"].is_null());
    assert_eq!(json["healthy"], false);
}

// ========== Analyze ==========

#[tokio::test]
async fn test_analyze_transactions() {
    let dir = TempDir::new().unwrap();
    let response = mock_app(dir.path())
        .oneshot(statement_upload(None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;

    let categorized = json["categorized"].as_array().unwrap();
    assert_eq!(categorized.len(), 2);
    assert_eq!(categorized[0]["category"], "Food");
    assert_eq!(categorized[1]["category"], "Income");

    let analytics = &json["analytics"];
    assert_eq!(analytics["totalInflow"], 50000.0);
    assert_eq!(analytics["totalOutflow"], 250.0);
    assert_eq!(analytics["financialHealthScore"], 100);
    assert_eq!(analytics["score"], 100);
    assert_eq!(analytics["halfMonthComparison"]["firstHalf"], 250.0);
    assert!(analytics["aiTip"].is_string());
    assert_eq!(json["sessionId"], "default");
}

#[tokio::test]
async fn test_analyze_removes_spooled_file() {
    let dir = TempDir::new().unwrap();
    let uploads = dir.path().join("uploads");
    let response = mock_app(&uploads)
        .oneshot(statement_upload(None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let leftover = std::fs::read_dir(&uploads).unwrap().count();
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn test_analyze_without_file() {
    let dir = TempDir::new().unwrap();
    let body = multipart_body("other", "statement.csv", "text/csv", STATEMENT.as_bytes());
    let response = mock_app(dir.path())
        .oneshot(multipart_request("/analyze-transactions", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No file uploaded");
}

#[tokio::test]
async fn test_analyze_rejects_non_csv() {
    let dir = TempDir::new().unwrap();
    let body = multipart_body("csvFile", "photo.png", "image/png", b"\x89PNG");
    let response = mock_app(dir.path())
        .oneshot(multipart_request("/analyze-transactions", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_rejects_oversized_file() {
    let dir = TempDir::new().unwrap();
    let data = vec![b'a'; MAX_UPLOAD_SIZE + 1];
    let body = multipart_body("csvFile", "big.csv", "text/csv", &data);
    let response = mock_app(dir.path())
        .oneshot(multipart_request("/analyze-transactions", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("File too large"));
}

#[tokio::test]
async fn test_analyze_categorization_failure_is_500() {
    let dir = TempDir::new().unwrap();
    let ai = AIClient::Mock(MockBackend::failing_categorization());
    let response = setup_test_app(Some(ai), dir.path())
        .oneshot(statement_upload(None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Failed to analyze transactions");
}

#[tokio::test]
async fn test_analyze_failure_removes_spooled_file() {
    let dir = TempDir::new().unwrap();
    let uploads = dir.path().join("nested").join("uploads");
    let ai = AIClient::Mock(MockBackend::failing_categorization());
    let response = setup_test_app(Some(ai), &uploads)
        .oneshot(statement_upload(None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let leftover = std::fs::read_dir(&uploads).unwrap().count();
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn test_analyze_tip_failure_still_succeeds() {
    let dir = TempDir::new().unwrap();
    let ai = AIClient::Mock(MockBackend::failing_tip());
    let response = setup_test_app(Some(ai), dir.path())
        .oneshot(statement_upload(None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["analytics"]["aiTip"], tally_core::DEFAULT_AI_TIP);
}

#[tokio::test]
async fn test_analyze_without_ai_backend() {
    let dir = TempDir::new().unwrap();
    let response = setup_test_app(None, dir.path())
        .oneshot(statement_upload(None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Failed to analyze transactions");
}

#[tokio::test]
async fn test_analyze_rejects_bad_session_header() {
    let dir = TempDir::new().unwrap();
    let response = mock_app(dir.path())
        .oneshot(statement_upload(Some("../../etc")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Ask ==========

#[tokio::test]
async fn test_ask_before_upload() {
    let dir = TempDir::new().unwrap();
    let response = mock_app(dir.path())
        .oneshot(ask_request("How much did I spend?", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No transactions available. Upload CSV first.");
}

#[tokio::test]
async fn test_ask_empty_question() {
    let dir = TempDir::new().unwrap();
    let response = mock_app(dir.path())
        .oneshot(ask_request("   ", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ask_after_upload() {
    let dir = TempDir::new().unwrap();
    let ai = AIClient::Mock(MockBackend::new().with_answer("You spent ₹250 on food."));
    let app = setup_test_app(Some(ai), dir.path());

    let response = app.clone().oneshot(statement_upload(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(ask_request("How much did I spend on food?", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["answer"], "You spent ₹250 on food.");
}

#[tokio::test]
async fn test_ask_empty_model_answer_uses_fallback() {
    let dir = TempDir::new().unwrap();
    let ai = AIClient::Mock(MockBackend::new().with_answer(""));
    let app = setup_test_app(Some(ai), dir.path());

    app.clone().oneshot(statement_upload(None)).await.unwrap();
    let response = app.oneshot(ask_request("Tips?", None)).await.unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["answer"], tally_core::ANSWER_FALLBACK);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let dir = TempDir::new().unwrap();
    let app = mock_app(dir.path());

    let response = app
        .clone()
        .oneshot(statement_upload(Some("tab-a")))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["sessionId"], "tab-a");

    let other = app
        .clone()
        .oneshot(ask_request("Anything?", Some("tab-b")))
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::BAD_REQUEST);

    let same = app
        .oneshot(ask_request("Anything?", Some("tab-a")))
        .await
        .unwrap();
    assert_eq!(same.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_session_info() {
    let dir = TempDir::new().unwrap();
    let app = mock_app(dir.path());

    let missing = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    app.clone().oneshot(statement_upload(None)).await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["sessionId"], "default");
    assert_eq!(json["transactionCount"], 2);
    assert!(json["updatedAt"].is_string());
}

// ========== Upload preview ==========

#[tokio::test]
async fn test_upload_preview() {
    let dir = TempDir::new().unwrap();
    let csv = "Date,Description,Amount\n2024-01-02,Zomato dinner,400\n2024-01-03,Gym,1500\n";
    let body = multipart_body("csv", "preview.csv", "text/csv", csv.as_bytes());
    let response = mock_app(dir.path())
        .oneshot(multipart_request("/api/upload", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["Description"], "Zomato dinner");
    assert_eq!(rows[0]["Category"], "Food");
    assert_eq!(rows[1]["Category"], "Other");
}

#[tokio::test]
async fn test_upload_preview_works_without_ai() {
    let dir = TempDir::new().unwrap();
    let body = multipart_body("csv", "p.csv", "text/csv", b"Description\nUber\n");
    let response = setup_test_app(None, dir.path())
        .oneshot(multipart_request("/api/upload", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json[0]["Category"], "Travel");
}

#[tokio::test]
async fn test_upload_preview_parse_error() {
    let dir = TempDir::new().unwrap();
    let body = multipart_body("csv", "bad.csv", "text/csv", b"Description\n\xff\xfe\n");
    let response = mock_app(dir.path())
        .oneshot(multipart_request("/api/upload", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Error parsing CSV");
}

// ========== Configuration ==========

#[test]
fn test_parse_origins() {
    assert_eq!(
        parse_origins("http://localhost:5173/, https://app.example.com ,,"),
        vec!["http://localhost:5173", "https://app.example.com"]
    );
    assert!(parse_origins("").is_empty());
}

#[tokio::test]
async fn test_cors_any_origin() {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        allow_any_origin: true,
        upload_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let response = create_router_with_ai(None, None, config)
        .oneshot(
            Request::builder()
                .uri("/api/hello")
                .header("origin", "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
