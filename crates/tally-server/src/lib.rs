//! Tally Web Server
//!
//! Axum-based REST API for the Tally transaction analyzer.
//!
//! Security features:
//! - Restrictive CORS policy (explicit origins, or any origin only when asked)
//! - Input validation (file size and type limits on uploads)
//! - Sanitized error responses

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use tally_core::ai::{AIBackend, AIClient};

mod handlers;
mod session;
mod upload;

pub use session::{SessionInfo, SessionStore, DEFAULT_SESSION, SESSION_TIMEOUT};

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Request header carrying the caller's session identity
pub const SESSION_HEADER: &str = "x-session-id";

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Allow any origin (local development with the SPA on another port)
    pub allow_any_origin: bool,
    /// Directory where uploads are spooled while being analyzed
    pub upload_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allow_any_origin: false,
            upload_dir: std::env::temp_dir().join("tally-uploads"),
        }
    }
}

impl ServerConfig {
    /// Read `TALLY_ALLOWED_ORIGINS` and `TALLY_UPLOAD_DIR`
    ///
    /// `TALLY_ALLOWED_ORIGINS` is comma separated; `*` allows any origin.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(origins) = std::env::var("TALLY_ALLOWED_ORIGINS") {
            let origins = parse_origins(&origins);
            config.allow_any_origin = origins.iter().any(|o| o == "*");
            config.allowed_origins = origins.into_iter().filter(|o| o != "*").collect();
        }

        if let Ok(dir) = std::env::var("TALLY_UPLOAD_DIR") {
            if !dir.trim().is_empty() {
                config.upload_dir = PathBuf::from(dir);
            }
        }

        config
    }
}

/// Split a comma separated origin list, dropping blanks
pub fn parse_origins(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub ai: Option<AIClient>,
    /// Categorized transactions of the latest analysis, per session
    pub sessions: SessionStore,
}

/// Create the application router, with the AI backend taken from the environment
pub fn create_router(static_dir: Option<&str>, config: ServerConfig) -> Router {
    let ai = AIClient::from_env();
    match ai {
        Some(ref client) => info!(
            "AI backend configured: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => info!("ℹ️  AI backend not configured (set GEMINI_API_KEY to enable analysis)"),
    }
    create_router_with_ai(ai, static_dir, config)
}

/// Create the application router with an explicit AI backend (for testing)
pub fn create_router_with_ai(
    ai: Option<AIClient>,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> Router {
    let state = Arc::new(AppState {
        config: config.clone(),
        ai,
        sessions: SessionStore::new(),
    });

    let api_routes = Router::new()
        .route("/hello", get(handlers::hello))
        .route("/upload", post(handlers::upload_preview))
        .route("/ai/status", get(handlers::ai_status))
        .route("/session", get(handlers::session_info));

    let session_header = HeaderName::from_static(SESSION_HEADER);

    let cors = if config.allow_any_origin {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, session_header])
    } else {
        // Empty list = restrictive default (same-origin only)
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, session_header])
    };

    let mut app = Router::new()
        .route("/analyze-transactions", post(handlers::analyze_transactions))
        .route("/ask-question", post(handlers::ask_question))
        .nest("/api", api_routes)
        .with_state(state)
        // Multipart bodies carry some framing on top of the file itself
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.allow_any_origin {
        warn!("⚠️  CORS allows any origin - do not expose to network!");
    }

    std::fs::create_dir_all(&config.upload_dir)?;
    info!("Upload directory: {}", config.upload_dir.display());

    check_ai_connection().await;

    let app = create_router(static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection() {
    match AIClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured (set GEMINI_API_KEY to enable analysis)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Attach the underlying cause; it is logged, never sent to the client
    pub fn with_source(mut self, err: impl Into<anyhow::Error>) -> Self {
        self.internal = Some(err.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, status = %self.status, "{}", self.message);
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
