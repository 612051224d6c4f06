// ABOUTME: Spotify accounts-service configuration for the PKCE flow
// ABOUTME: Client id, redirect URI, scopes, and authorize/token endpoint URL construction

use url::Url;

use crate::{
    error::{AuthError, AuthResult},
    oauth::types::PkceChallenge,
};

pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// OAuth application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Base of the accounts service; `/authorize` and `/api/token` hang off it
    pub accounts_url: String,
}

impl OAuthConfig {
    /// Configuration against the real Spotify accounts service
    pub fn spotify(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes,
            accounts_url: SPOTIFY_ACCOUNTS_URL.to_string(),
        }
    }

    pub fn with_accounts_url(mut self, accounts_url: impl Into<String>) -> Self {
        self.accounts_url = accounts_url.into();
        self
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.accounts_url.trim_end_matches('/'))
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_url.trim_end_matches('/'))
    }

    pub fn validate(&self) -> AuthResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::Configuration(
                "Spotify client id is empty".to_string(),
            ));
        }
        Url::parse(&self.redirect_uri)
            .map_err(|e| AuthError::Configuration(format!("Invalid redirect URI: {}", e)))?;
        Url::parse(&self.accounts_url)
            .map_err(|e| AuthError::Configuration(format!("Invalid accounts URL: {}", e)))?;
        Ok(())
    }

    /// Build authorization URL with PKCE challenge and state parameter
    pub fn build_authorization_url(&self, pkce: &PkceChallenge, state: &str) -> AuthResult<String> {
        let mut url = Url::parse(&self.authorize_url())
            .map_err(|e| AuthError::Configuration(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("code_challenge_method", &pkce.code_challenge_method)
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("state", state);

        Ok(url.to_string())
    }
}
