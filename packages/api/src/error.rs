// ABOUTME: Error types for Spotify Web API calls
// ABOUTME: Typed failures for auth, throttling, server and request errors plus user-facing messages

use cadenza_auth::AuthError;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Spotify player reason codes that get their own user message
pub const REASON_NO_ACTIVE_DEVICE: &str = "NO_ACTIVE_DEVICE";
pub const REASON_PREMIUM_REQUIRED: &str = "PREMIUM_REQUIRED";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Spotify rejected the access token after a refresh")]
    Unauthorized,

    #[error("Rate limited by Spotify{}", retry_after_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Spotify server error (status {status})")]
    ServerError { status: u16 },

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: ErrorBody },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => format!(", retry after {}s", wait.as_secs()),
        None => String::new(),
    }
}

/// The useful part of a failed response body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorBody {
    pub message: String,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl ErrorBody {
    /// Parse Spotify's `{"error": {"status", "message", "reason"}}` shape,
    /// falling back to the raw text
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(raw) {
            Ok(envelope) => Self {
                message: envelope.error.message.unwrap_or_default(),
                reason: envelope.error.reason,
            },
            Err(_) => Self {
                message: raw.trim().to_string(),
                reason: None,
            },
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} ({})", self.message, reason),
            None => write!(f, "{}", self.message),
        }
    }
}

impl ApiError {
    /// True when the user has to sign in again before anything will work
    pub fn requires_login(&self) -> bool {
        match self {
            ApiError::Unauthorized => true,
            ApiError::Auth(e) => e.requires_login(),
            _ => false,
        }
    }

    pub fn is_no_active_device(&self) -> bool {
        match self {
            ApiError::RequestFailed { status, body } => {
                body.reason.as_deref() == Some(REASON_NO_ACTIVE_DEVICE)
                    || (*status == 404 && body.message.to_lowercase().contains("active device"))
            }
            _ => false,
        }
    }

    pub fn is_premium_required(&self) -> bool {
        match self {
            ApiError::RequestFailed { status, body } => {
                body.reason.as_deref() == Some(REASON_PREMIUM_REQUIRED)
                    || (*status == 403 && body.message.to_lowercase().contains("premium"))
            }
            _ => false,
        }
    }

    /// Short message suitable for showing to the user
    pub fn user_message(&self) -> String {
        if self.is_no_active_device() {
            return "No active Spotify device. Start playback on a device, or transfer playback to one."
                .to_string();
        }
        if self.is_premium_required() {
            return "This action requires a Spotify Premium account.".to_string();
        }
        if let ApiError::Auth(AuthError::AuthDenied(reason)) = self {
            return format!("Spotify sign-in was denied ({}). Sign in again.", reason);
        }
        if self.requires_login() {
            return "Your Spotify session has expired. Sign in again.".to_string();
        }

        match self {
            ApiError::RateLimited { .. } => {
                "Spotify is rate limiting requests. Try again in a moment.".to_string()
            }
            ApiError::Network(_) => {
                "Could not reach Spotify. Check your network connection.".to_string()
            }
            other => format!("Spotify request failed: {}", other),
        }
    }
}
