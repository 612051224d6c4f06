// ABOUTME: Error types for authentication and OAuth operations
// ABOUTME: Clone-able so one authentication outcome can be handed to every joined caller

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization denied: {0}")]
    AuthDenied(String),

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("State mismatch: CSRF protection failed")]
    StateMismatch,

    #[error("Authentication was cancelled")]
    Cancelled,

    #[error("No authentication in progress")]
    NoPendingAuthentication,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Callback error: {0}")]
    Callback(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("PKCE error: {0}")]
    Pkce(String),

    #[error("Failed to open browser: {0}")]
    BrowserOpen(String),
}

impl AuthError {
    /// True when the user has to run a fresh authentication
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            AuthError::AuthRequired(_) | AuthError::AuthDenied(_) | AuthError::StateMismatch
        )
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<keyring::Error> for AuthError {
    fn from(err: keyring::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
