//! Per-session storage of the latest categorized upload
//!
//! Each session holds exactly one list: a new analysis replaces the previous
//! one. Sessions idle for longer than `SESSION_TIMEOUT` are dropped on the next
//! write.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use tally_core::models::CategorizedTransaction;

/// Session timeout (2 hours of inactivity)
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Session used when a request carries no session header
pub const DEFAULT_SESSION: &str = "default";

/// Longest accepted session identifier
const MAX_SESSION_ID_LEN: usize = 64;

#[derive(Debug, Clone)]
struct Session {
    transactions: Vec<CategorizedTransaction>,
    updated_at: DateTime<Utc>,
    last_activity: Instant,
}

impl Session {
    fn is_expired(&self) -> bool {
        self.last_activity.elapsed() > SESSION_TIMEOUT
    }
}

/// Session summary reported by the API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub transaction_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// In-memory session store
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Replace a session's transactions
    pub async fn store(&self, session_id: &str, transactions: Vec<CategorizedTransaction>) {
        let mut sessions = self.sessions.write().await;

        // Clean up expired sessions while we're here
        sessions.retain(|_, s| !s.is_expired());

        sessions.insert(
            session_id.to_string(),
            Session {
                transactions,
                updated_at: Utc::now(),
                last_activity: Instant::now(),
            },
        );
    }

    /// Get a session's transactions (None if not found or expired)
    pub async fn get(&self, session_id: &str) -> Option<Vec<CategorizedTransaction>> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_id).filter(|s| !s.is_expired())?;
        session.last_activity = Instant::now();
        Some(session.transactions.clone())
    }

    /// Get session info
    pub async fn info(&self, session_id: &str) -> Option<SessionInfo> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .filter(|s| !s.is_expired())
            .map(|s| SessionInfo {
                session_id: session_id.to_string(),
                transaction_count: s.transactions.len(),
                updated_at: s.updated_at,
            })
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.values().filter(|s| !s.is_expired()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    #[cfg(test)]
    async fn expire(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            if let Some(past) = Instant::now().checked_sub(SESSION_TIMEOUT + Duration::from_secs(1))
            {
                session.last_activity = past;
            }
        }
    }
}

/// Resolve the session identity from a raw header value
///
/// A missing or blank header means the shared default session. Returns None
/// for identifiers that are too long or contain anything outside
/// `[A-Za-z0-9_-]`.
pub fn resolve_session_id(header: Option<&str>) -> Option<String> {
    let value = match header.map(str::trim) {
        None | Some("") => return Some(DEFAULT_SESSION.to_string()),
        Some(v) => v,
    };
    let valid = value.len() <= MAX_SESSION_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| value.to_string())
}
