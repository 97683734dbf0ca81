//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analyze;
pub mod ask;
pub mod preview;
pub mod status;

// Re-export all handlers for use in router
pub use analyze::*;
pub use ask::*;
pub use preview::*;
pub use status::*;

use axum::http::HeaderMap;

use crate::session::resolve_session_id;
use crate::{AppError, SESSION_HEADER};

/// Session identity for a request (`default` when no header is sent)
pub(crate) fn session_from_headers(headers: &HeaderMap) -> Result<String, AppError> {
    let raw = match headers.get(SESSION_HEADER) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AppError::bad_request("Invalid session id"))?,
        ),
        None => None,
    };
    resolve_session_id(raw).ok_or_else(|| AppError::bad_request("Invalid session id"))
}
