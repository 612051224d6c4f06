// ABOUTME: Source of bearer tokens for API requests
// ABOUTME: Implemented for the auth controller; tests substitute fixed tokens

use async_trait::async_trait;
use cadenza_auth::{AuthController, AuthResult};

#[async_trait]
pub trait TokenSource: Send + Sync {
    /// A token believed to be valid, refreshed first when close to expiry
    async fn access_token(&self) -> AuthResult<String>;

    /// A new token, obtained even if the current one looks valid
    async fn refresh(&self) -> AuthResult<String>;
}

#[async_trait]
impl TokenSource for AuthController {
    async fn access_token(&self) -> AuthResult<String> {
        self.get_access_token().await
    }

    async fn refresh(&self) -> AuthResult<String> {
        self.force_refresh().await
    }
}
