// ABOUTME: OAuth module providing the Spotify authorization-code-with-PKCE flow
// ABOUTME: Includes PKCE, callback producers, token storage, and the flow controller

pub mod browser;
pub mod manager;
pub mod pkce;
pub mod provider;
pub mod server;
pub mod storage;
pub mod types;

pub use browser::{SystemBrowser, UrlOpener};
pub use manager::{AuthController, AuthControllerBuilder};
pub use provider::OAuthConfig;
pub use server::{
    parse_callback_query, parse_manual_input, CallbackRegistration, CallbackSender,
    CallbackSource, LoopbackCallbackServer, ManualCallbackSource,
};
pub use storage::{KeyringStore, MemoryStore, SecretStore, TokenStore};
pub use types::{AuthCallback, AuthState, PkceChallenge, TokenRecord, TokenResponse};
