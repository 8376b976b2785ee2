//! Error taxonomy for backend calls
//!
//! Every failure is caught at the call site and turned into a message or an
//! inert default. Nothing here is retried automatically.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Call needs a token and none is held. Raised before any network I/O.
    #[error("authentication required")]
    AuthRequired,

    /// Backend answered 401 to an authenticated call
    #[error("session expired")]
    SessionExpired,

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Whether a manual re-trigger may succeed (network trouble or 5xx)
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// Text shown to the user
    pub fn user_message(&self) -> String {
        match self {
            ApiError::AuthRequired => "Log in to continue.".to_string(),
            ApiError::SessionExpired => "Session expired, please log in again.".to_string(),
            ApiError::Transport(e) if e.is_timeout() => {
                "The server took too long to respond. Try again.".to_string()
            }
            ApiError::Transport(_) => "Could not reach the server. Try again.".to_string(),
            ApiError::Status { status, message } => match status.as_u16() {
                400 if !message.is_empty() => message.clone(),
                400 => "The request was rejected.".to_string(),
                404 => "Not found.".to_string(),
                409 if !message.is_empty() => message.clone(),
                409 => "Already exists.".to_string(),
                s if s >= 500 => "Server error. Try again later.".to_string(),
                _ if !message.is_empty() => message.clone(),
                _ => format!("Request failed ({status})."),
            },
            ApiError::Malformed(_) => "Unexpected response from the server.".to_string(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }
}

/// Pull a human message out of an error body.
///
/// The backend answers with `{"error": "..."}`, `{"error": {"message": ...}}`,
/// or `{"message": ...}`; anything else falls back to the raw text.
pub(crate) fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidate = value
            .get("error")
            .and_then(|e| e.as_str().or_else(|| e.get("message").and_then(|m| m.as_str())))
            .or_else(|| value.get("message").and_then(|m| m.as_str()));
        if let Some(msg) = candidate {
            return msg.to_string();
        }
    }
    body.trim().chars().take(200).collect()
}
