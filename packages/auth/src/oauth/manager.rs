// ABOUTME: Auth flow controller orchestrating the Spotify PKCE authentication flow
// ABOUTME: Single in-flight attempt, code exchange, refresh-on-expiry, cancellation, and logout

use reqwest::Client;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::{
    sync::{mpsc, watch, Mutex, RwLock},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    error::{AuthError, AuthResult},
    oauth::{
        browser::{SystemBrowser, UrlOpener},
        pkce::{generate_pkce_challenge, generate_state},
        provider::OAuthConfig,
        server::{
            parse_manual_input, CallbackRegistration, CallbackSender, CallbackSource,
            ManualCallbackSource,
        },
        storage::TokenStore,
        types::{AuthCallback, AuthState, TokenErrorResponse, TokenRecord, TokenResponse},
    },
};

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

type Outcome = Option<AuthResult<()>>;

/// The one pending authentication attempt
struct InFlight {
    id: u64,
    outcome: watch::Receiver<Outcome>,
    callback_tx: CallbackSender,
    authorization_url: String,
    task: JoinHandle<()>,
}

struct Inner {
    config: OAuthConfig,
    tokens: TokenStore,
    http: Client,
    opener: Arc<dyn UrlOpener>,
    callbacks: Arc<dyn CallbackSource>,
    state: RwLock<AuthState>,
    in_flight: Mutex<Option<InFlight>>,
    attempts: AtomicU64,
}

/// Owns authentication for one Spotify account
///
/// Cheap to clone; clones share the in-flight attempt and token store.
#[derive(Clone)]
pub struct AuthController {
    inner: Arc<Inner>,
}

/// Builder for [`AuthController`]
pub struct AuthControllerBuilder {
    config: OAuthConfig,
    tokens: TokenStore,
    http: Option<Client>,
    opener: Arc<dyn UrlOpener>,
    callbacks: Arc<dyn CallbackSource>,
}

impl AuthControllerBuilder {
    pub fn http_client(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn url_opener(mut self, opener: Arc<dyn UrlOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn callback_source(mut self, callbacks: Arc<dyn CallbackSource>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn build(self) -> AuthResult<AuthController> {
        self.config.validate()?;

        let http = match self.http {
            Some(client) => client,
            None => Client::builder()
                .timeout(DEFAULT_HTTP_TIMEOUT)
                .build()
                .map_err(|e| AuthError::Configuration(format!("Failed to build HTTP client: {}", e)))?,
        };

        Ok(AuthController {
            inner: Arc::new(Inner {
                config: self.config,
                tokens: self.tokens,
                http,
                opener: self.opener,
                callbacks: self.callbacks,
                state: RwLock::new(AuthState::Unauthenticated),
                in_flight: Mutex::new(None),
                attempts: AtomicU64::new(0),
            }),
        })
    }
}

impl AuthController {
    /// Start building a controller; defaults to the system browser and manual callbacks
    pub fn builder(config: OAuthConfig, tokens: TokenStore) -> AuthControllerBuilder {
        AuthControllerBuilder {
            config,
            tokens,
            http: None,
            opener: Arc::new(SystemBrowser),
            callbacks: Arc::new(ManualCallbackSource),
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.inner.config
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub async fn state(&self) -> AuthState {
        *self.inner.state.read().await
    }

    /// Authenticate with Spotify
    ///
    /// If an attempt is already pending this joins it and returns its
    /// outcome. Otherwise:
    /// 1. Generate and store a PKCE verifier
    /// 2. Generate CSRF state parameter
    /// 3. Register the callback listener
    /// 4. Open the authorization URL
    /// 5. Wait for one callback (redirect or manual code)
    /// 6. Validate state, exchange the code, store the tokens
    ///
    /// Any failure clears every stored field.
    pub async fn authenticate(&self) -> AuthResult<()> {
        let mut outcome = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.as_ref() {
                Some(pending) if !pending.task.is_finished() => {
                    debug!("Authentication attempt {} already pending, joining", pending.id);
                    pending.outcome.clone()
                }
                _ => {
                    let pending = match self.start_attempt().await {
                        Ok(pending) => pending,
                        Err(e) => {
                            error!("Failed to start authentication: {}", e);
                            self.inner.reset().await;
                            return Err(e);
                        }
                    };
                    let outcome = pending.outcome.clone();
                    *in_flight = Some(pending);
                    outcome
                }
            }
        };

        wait_for_outcome(&mut outcome).await
    }

    async fn start_attempt(&self) -> AuthResult<InFlight> {
        let id = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Starting Spotify authentication (attempt {})", id);
        self.inner.set_state(AuthState::Authenticating).await;

        let pkce = generate_pkce_challenge()?;
        self.inner.tokens.save_verifier(&pkce.code_verifier).await?;
        debug!("Generated and stored PKCE verifier");

        let expected_state = generate_state();
        let authorization_url = self
            .inner
            .config
            .build_authorization_url(&pkce, &expected_state)?;

        let (callback_tx, callback_rx) = mpsc::channel(4);
        let registration = self.inner.callbacks.register(callback_tx.clone()).await?;

        let (outcome_tx, outcome_rx) = watch::channel(None);
        let inner = Arc::clone(&self.inner);
        let url = authorization_url.clone();

        let task = tokio::spawn(async move {
            let result = inner
                .run_attempt(&url, &expected_state, callback_rx, registration)
                .await;

            match &result {
                Ok(()) => info!("Authenticated with Spotify"),
                Err(e) => {
                    warn!("Authentication attempt {} failed: {}", id, e);
                    inner.reset().await;
                }
            }

            inner.release(id).await;
            let _ = outcome_tx.send(Some(result));
        });

        Ok(InFlight {
            id,
            outcome: outcome_rx,
            callback_tx,
            authorization_url,
            task,
        })
    }

    /// Deliver a manually pasted code (or full redirect URL) to the pending attempt
    pub async fn submit_manual_code(&self, input: &str) -> AuthResult<()> {
        let callback = parse_manual_input(input)?;

        let sender = {
            let in_flight = self.inner.in_flight.lock().await;
            match in_flight.as_ref() {
                Some(pending) if !pending.task.is_finished() => pending.callback_tx.clone(),
                _ => return Err(AuthError::NoPendingAuthentication),
            }
        };

        sender
            .send(callback)
            .await
            .map_err(|_| AuthError::Callback("Authentication attempt is no longer waiting".to_string()))
    }

    /// Authorization URL of the pending attempt, if any
    pub async fn pending_authorization_url(&self) -> Option<String> {
        let in_flight = self.inner.in_flight.lock().await;
        in_flight
            .as_ref()
            .filter(|pending| !pending.task.is_finished())
            .map(|pending| pending.authorization_url.clone())
    }

    /// Abort the pending attempt, dispose its listener and clear stored fields
    pub async fn cancel_authentication(&self) -> AuthResult<()> {
        let pending = self.inner.in_flight.lock().await.take();

        let Some(pending) = pending else {
            debug!("No authentication in progress to cancel");
            return Ok(());
        };

        info!("Cancelling authentication attempt {}", pending.id);
        pending.task.abort();
        // Wait for the task to unwind so nothing writes after the clear below
        let _ = pending.task.await;

        let result = self.inner.tokens.clear_all().await;
        self.inner.set_state(AuthState::Unauthenticated).await;
        result
    }

    /// Return a valid access token, refreshing it when it is absent or about to expire
    pub async fn get_access_token(&self) -> AuthResult<String> {
        match self.inner.tokens.load().await? {
            Some(record) if !record.needs_refresh() => Ok(record.access_token),
            Some(record) => {
                debug!("Access token expires within margin, refreshing");
                self.refresh_or_reset(record.refresh_token).await
            }
            None => {
                let refresh_token = self.inner.tokens.refresh_token().await?;
                self.refresh_or_reset(refresh_token).await
            }
        }
    }

    /// Refresh with the stored refresh token regardless of the stored expiry
    ///
    /// Used when the API rejected a token that looked valid locally.
    pub async fn force_refresh(&self) -> AuthResult<String> {
        let refresh_token = self.inner.tokens.refresh_token().await?;
        self.refresh_or_reset(refresh_token).await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.get_access_token().await.is_ok()
    }

    /// Exchange a refresh token for a new access token and persist it
    pub async fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<TokenRecord> {
        info!("Refreshing Spotify access token");

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.inner.config.client_id.as_str()),
        ];
        let response = self.inner.post_token_request(&form).await?;

        let record = TokenRecord::from_response(&response);
        self.inner.tokens.save(&record).await?;

        if record.refresh_token.is_some() {
            debug!("Provider rotated the refresh token");
        }

        Ok(TokenRecord {
            refresh_token: record
                .refresh_token
                .or_else(|| Some(refresh_token.to_string())),
            ..record
        })
    }

    /// Remove the stored token fields and any leftover verifier (logout)
    pub async fn clear_tokens(&self) -> AuthResult<()> {
        info!("Clearing stored Spotify tokens");
        self.inner.tokens.clear_all().await?;
        self.inner
            .set_state_unless_authenticating(AuthState::Unauthenticated)
            .await;
        Ok(())
    }

    async fn refresh_or_reset(&self, refresh_token: Option<String>) -> AuthResult<String> {
        let Some(refresh_token) = refresh_token else {
            return Err(AuthError::AuthRequired(
                "Not signed in to Spotify".to_string(),
            ));
        };

        self.inner
            .set_state_unless_authenticating(AuthState::RefreshPending)
            .await;

        match self.refresh_access_token(&refresh_token).await {
            Ok(record) => {
                self.inner
                    .set_state_unless_authenticating(AuthState::Authenticated)
                    .await;
                Ok(record.access_token)
            }
            Err(e) => {
                warn!("Token refresh failed, clearing stored tokens: {}", e);
                if let Err(clear_err) = self.inner.tokens.clear_tokens().await {
                    error!("Failed to clear tokens after refresh failure: {}", clear_err);
                }
                self.inner
                    .set_state_unless_authenticating(AuthState::Unauthenticated)
                    .await;
                Err(AuthError::AuthRequired(format!(
                    "Spotify session expired, sign in again ({})",
                    e
                )))
            }
        }
    }
}

impl Inner {
    async fn set_state(&self, state: AuthState) {
        let mut current = self.state.write().await;
        if *current != state {
            debug!("Auth state: {} -> {}", *current, state);
            *current = state;
        }
    }

    /// Refresh and logout transitions must not clobber a running attempt
    async fn set_state_unless_authenticating(&self, state: AuthState) {
        let mut current = self.state.write().await;
        if !current.is_authenticating() && *current != state {
            debug!("Auth state: {} -> {}", *current, state);
            *current = state;
        }
    }

    /// Back to a clean unauthenticated slate
    async fn reset(&self) {
        if let Err(e) = self.tokens.clear_all().await {
            error!("Failed to clear stored tokens: {}", e);
        }
        self.set_state(AuthState::Unauthenticated).await;
    }

    /// Clear the in-flight marker if it still points at this attempt
    async fn release(&self, id: u64) {
        let mut in_flight = self.in_flight.lock().await;
        if in_flight.as_ref().is_some_and(|pending| pending.id == id) {
            *in_flight = None;
        }
    }

    async fn run_attempt(
        &self,
        authorization_url: &str,
        expected_state: &str,
        mut callbacks: mpsc::Receiver<AuthCallback>,
        registration: CallbackRegistration,
    ) -> AuthResult<()> {
        if let Err(e) = self.opener.open(authorization_url) {
            warn!("{}. Visit the authorization URL manually", e);
        }
        self.set_state(AuthState::AwaitingCallback).await;

        let callback = callbacks
            .recv()
            .await
            .ok_or_else(|| AuthError::Callback("Callback channel closed".to_string()))?;
        drop(registration);

        let code = match callback {
            AuthCallback::Error { error, .. } => {
                error!("Authorization was rejected: {}", error);
                return Err(AuthError::AuthDenied(error));
            }
            AuthCallback::Code { code, state } => {
                // Manually pasted bare codes carry no state to compare
                if let Some(returned_state) = state {
                    if returned_state != expected_state {
                        error!("State mismatch in authorization callback");
                        return Err(AuthError::StateMismatch);
                    }
                    debug!("State validated");
                }
                code
            }
        };

        self.set_state(AuthState::Exchanging).await;
        let verifier = self
            .tokens
            .verifier()
            .await?
            .ok_or_else(|| AuthError::Pkce("PKCE verifier missing from storage".to_string()))?;

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", verifier.as_str()),
            ("client_id", self.config.client_id.as_str()),
        ];
        let response = self.post_token_request(&form).await?;

        let record = TokenRecord::from_response(&response);
        self.tokens.save(&record).await?;
        self.tokens.clear_verifier().await?;
        self.set_state(AuthState::Authenticated).await;
        Ok(())
    }

    async fn post_token_request(&self, form: &[(&str, &str)]) -> AuthResult<TokenResponse> {
        let response = self
            .http
            .post(self.config.token_url())
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            // Don't leak the raw body - only the provider's error code and description
            let detail = response
                .json::<TokenErrorResponse>()
                .await
                .map(|body| body.to_string())
                .unwrap_or_else(|_| status.to_string());
            error!("Token request failed with status {}", status);
            return Err(AuthError::TokenExchange(format!(
                "Token endpoint returned {}: {}",
                status.as_u16(),
                detail
            )));
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            AuthError::TokenExchange(format!("Failed to parse token response: {}", e))
        })
    }
}

async fn wait_for_outcome(outcome: &mut watch::Receiver<Outcome>) -> AuthResult<()> {
    loop {
        if let Some(result) = Option::clone(&outcome.borrow_and_update()) {
            return result;
        }
        if outcome.changed().await.is_err() {
            // Sender dropped without a result: the attempt was aborted
            return Option::clone(&outcome.borrow()).unwrap_or(Err(AuthError::Cancelled));
        }
    }
}
