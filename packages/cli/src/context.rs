// ABOUTME: Application context built once at startup and handed to every command
// ABOUTME: Wires settings into the secret store, auth controller and API client

use anyhow::{Context, Result};
use cadenza_api::{ClientConfig, RetryPolicy, SpotifyClient};
use cadenza_auth::{
    AuthController, AuthResult, CallbackSource, KeyringStore, LoopbackCallbackServer,
    ManualCallbackSource, MemoryStore, OAuthConfig, SecretStore, SystemBrowser, TokenStore,
    UrlOpener,
};
use cadenza_config::{CallbackMode, SecretBackend, Settings};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Namespace of the token entries inside the secret store service
pub const TOKEN_NAMESPACE: &str = "spotify";

/// Command-line switches that change how the context is wired
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextOptions {
    /// Keep secrets in memory only, for this process
    pub ephemeral: bool,
    /// Force manual code entry even if the config asks for a loopback listener
    pub manual: bool,
    /// Never launch a browser; the URL is printed instead
    pub no_browser: bool,
}

/// Leaves the authorization URL for the caller to print
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBrowser;

impl UrlOpener for NoBrowser {
    fn open(&self, _url: &str) -> AuthResult<()> {
        debug!("Browser launch disabled");
        Ok(())
    }
}

pub struct AppContext {
    pub settings: Settings,
    pub auth: AuthController,
    pub client: SpotifyClient,
    pub callback_mode: CallbackMode,
}

impl AppContext {
    pub fn build(settings: Settings, options: ContextOptions) -> Result<Self> {
        let secrets: Arc<dyn SecretStore> =
            match (options.ephemeral, settings.storage.backend) {
                (true, _) | (false, SecretBackend::Memory) => Arc::new(MemoryStore::new()),
                (false, SecretBackend::Keyring) => {
                    Arc::new(KeyringStore::new(settings.storage.service.clone()))
                }
            };
        let tokens = TokenStore::new(secrets, TOKEN_NAMESPACE);

        let oauth = OAuthConfig::spotify(
            settings.auth.client_id.clone(),
            settings.auth.redirect_uri.clone(),
            settings.auth.scopes.clone(),
        )
        .with_accounts_url(settings.auth.accounts_url.clone());

        let callback_mode = if options.manual {
            CallbackMode::Manual
        } else {
            settings.auth.callback_mode
        };
        let callbacks: Arc<dyn CallbackSource> = match callback_mode {
            CallbackMode::Loopback => Arc::new(
                LoopbackCallbackServer::from_redirect_uri(&settings.auth.redirect_uri)
                    .context("Cannot listen on the configured redirect URI")?,
            ),
            CallbackMode::Manual => Arc::new(ManualCallbackSource),
        };
        let opener: Arc<dyn UrlOpener> = if options.no_browser {
            Arc::new(NoBrowser)
        } else {
            Arc::new(SystemBrowser)
        };

        let auth = AuthController::builder(oauth, tokens)
            .callback_source(callbacks)
            .url_opener(opener)
            .build()
            .context("Invalid Spotify OAuth configuration")?;

        let client = SpotifyClient::new(client_config(&settings), Arc::new(auth.clone()))
            .context("Invalid Spotify API configuration")?;

        Ok(Self {
            settings,
            auth,
            client,
            callback_mode,
        })
    }
}

/// API client configuration from settings
pub fn client_config(settings: &Settings) -> ClientConfig {
    ClientConfig {
        base_url: settings.api.base_url.clone(),
        timeout: Duration::from_secs(settings.api.timeout_secs),
        page_limit: settings.api.page_limit,
        market: settings.api.market.clone(),
        retry: RetryPolicy {
            max_attempts: settings.retry.max_attempts,
            base_delay: Duration::from_millis(settings.retry.base_delay_ms),
            max_delay: Duration::from_millis(settings.retry.max_delay_ms),
        },
    }
}
