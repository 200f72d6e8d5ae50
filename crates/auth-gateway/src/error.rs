//! Error types surfaced by the gateway.

use reqwest::StatusCode;
use thiserror::Error;

/// Gateway error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Rejected {
        status: StatusCode,
        /// `message` field of the backend's JSON error body, when present
        message: Option<String>,
        body: String,
    },

    /// Token refresh could not be attempted
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Token cannot be used as a header value
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// HTTP client error (connect, timeout, body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure with no response
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] catalog_config_and_utils::CoreError),
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl AuthError {
    /// Build a rejection from a response status and raw body.
    pub fn rejected(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());

        AuthError::Rejected {
            status,
            message,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AuthError::Rejected { status, .. } => Some(*status),
            AuthError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Returns true for a `401 Unauthorized` rejection.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::Rejected { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }

    /// Returns true if no response was received at all.
    pub fn is_transport(&self) -> bool {
        match self {
            AuthError::Transport(_) => true,
            AuthError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    /// Whether the error should be shown to the user as a notification.
    ///
    /// Unauthorized rejections are left to the refresh path and the
    /// signed-out event.
    pub fn should_notify(&self) -> bool {
        !self.is_unauthorized()
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            AuthError::Rejected { status, .. } => status_message(*status).to_string(),
            AuthError::TokenRefresh(_) => status_message(StatusCode::UNAUTHORIZED).to_string(),
            e if e.is_transport() => "Could not connect to the server".to_string(),
            e => match e.status() {
                Some(status) => status_message(status).to_string(),
                None => GENERIC_MESSAGE.to_string(),
            },
        }
    }
}

const GENERIC_MESSAGE: &str = "An unexpected error occurred";

fn status_message(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Invalid request",
        401 => "Session expired. Please log in again",
        403 => "You do not have permission for this action",
        404 => "Resource not found",
        409 => "Conflict: operation already in progress",
        429 => "Too many requests. Please wait a moment",
        500 => "Internal server error",
        _ => GENERIC_MESSAGE,
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
