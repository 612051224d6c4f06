// ABOUTME: Core type definitions for Spotify OAuth authentication
// ABOUTME: Token record, token endpoint payloads, PKCE challenge, callbacks, and flow state

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens are refreshed when they expire within this many milliseconds
pub const EXPIRY_MARGIN_MS: i64 = 60_000;

/// Persisted token record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp in milliseconds
    pub expires_at: i64,
}

impl TokenRecord {
    /// Build a record from a token endpoint response received now
    pub fn from_response(response: &TokenResponse) -> Self {
        Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            expires_at: Utc::now()
                .timestamp_millis()
                .saturating_add(response.expires_in.saturating_mul(1000)),
        }
    }

    /// Check if the token expires within the safety margin (or already has)
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now().timestamp_millis())
    }

    pub fn needs_refresh_at(&self, now_ms: i64) -> bool {
        self.expires_at - now_ms <= EXPIRY_MARGIN_MS
    }

    /// Seconds until expiry; negative once expired
    pub fn expires_in_secs(&self) -> i64 {
        (self.expires_at - Utc::now().timestamp_millis()) / 1000
    }
}

/// PKCE challenge for OAuth flow
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: String, // Always "S256"
}

/// OAuth token response from the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub scope: Option<String>,
    pub expires_in: i64, // Seconds
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Error body returned by the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for TokenErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {}", self.error, description),
            None => write!(f, "{}", self.error),
        }
    }
}

/// What an authorization redirect carries, regardless of who delivered it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthCallback {
    Code {
        code: String,
        state: Option<String>,
    },
    Error {
        error: String,
        state: Option<String>,
    },
}

/// Authentication flow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    /// PKCE generated, verifier stored
    Authenticating,
    AwaitingCallback,
    Exchanging,
    Authenticated,
    RefreshPending,
}

impl AuthState {
    /// True while a full authentication attempt owns the state
    pub fn is_authenticating(&self) -> bool {
        matches!(
            self,
            Self::Authenticating | Self::AwaitingCallback | Self::Exchanging
        )
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::AwaitingCallback => "awaiting callback",
            Self::Exchanging => "exchanging code",
            Self::Authenticated => "authenticated",
            Self::RefreshPending => "refreshing",
        };
        write!(f, "{}", label)
    }
}
