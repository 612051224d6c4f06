// ABOUTME: Cadenza authentication library providing the Spotify OAuth flow
// ABOUTME: PKCE, a unified callback channel, secret-store backed tokens and refresh-on-expiry

pub mod error;
pub mod oauth;

// Re-export main types
pub use error::{AuthError, AuthResult};
pub use oauth::{
    AuthCallback, AuthController, AuthControllerBuilder, AuthState, CallbackRegistration,
    CallbackSource, KeyringStore, LoopbackCallbackServer, ManualCallbackSource, MemoryStore,
    OAuthConfig, PkceChallenge, SecretStore, SystemBrowser, TokenRecord, TokenResponse,
    TokenStore, UrlOpener,
};
