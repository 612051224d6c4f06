// ABOUTME: Authenticated HTTP wrapper around the Spotify Web API
// ABOUTME: Bearer tokens, one refresh on 401, bounded retries with backoff for 429, 5xx and transport errors

use backoff::{future::retry_notify, ExponentialBackoff, ExponentialBackoffBuilder};
use reqwest::{
    header::{CONTENT_LENGTH, RETRY_AFTER},
    Client, Method, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::{
    error::{ApiError, ApiResult, ErrorBody},
    token::TokenSource,
};

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Largest page size Spotify accepts on most list endpoints
pub const MAX_PAGE_LIMIT: u32 = 50;

/// How often and how patiently to retry throttled or failed requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Wait before retrying after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.base_delay)
            .with_randomization_factor(0.0)
            .with_multiplier(2.0)
            .with_max_interval(self.max_delay)
            .with_max_elapsed_time(None)
            .build()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub page_limit: u32,
    /// Market for market-scoped lookups; `from_token` uses the account's country
    pub market: String,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            page_limit: MAX_PAGE_LIMIT,
            market: "from_token".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn validate(&self) -> ApiResult<()> {
        Url::parse(&self.base_url).map_err(|e| {
            ApiError::Configuration(format!("Invalid API base URL {}: {}", self.base_url, e))
        })?;
        if self.retry.max_attempts == 0 {
            return Err(ApiError::Configuration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.page_limit == 0 || self.page_limit > MAX_PAGE_LIMIT {
            return Err(ApiError::Configuration(format!(
                "page_limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        Ok(())
    }
}

/// Spotify Web API client
///
/// Cheap to clone; clones share the connection pool and token source.
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    config: ClientConfig,
    tokens: Arc<dyn TokenSource>,
}

impl SpotifyClient {
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenSource>) -> ApiResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for an API path; absolute URLs (pagination links) pass through
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
    }

    /// True when `url` has the same scheme, host and port as the configured base URL
    pub fn is_api_origin(&self, url: &str) -> bool {
        match (Url::parse(url), Url::parse(&self.config.base_url)) {
            (Ok(url), Ok(base)) => url.origin() == base.origin(),
            _ => false,
        }
    }

    /// Send an authenticated request and decode the JSON body
    ///
    /// Returns `None` for 204 or an empty body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> ApiResult<Option<T>> {
        let url = self.url_for(path);
        match self.execute(&method, &url, query, body).await? {
            None => Ok(None),
            Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
                error!("Failed to decode response from {}: {}", url, e);
                ApiError::InvalidResponse(format!("{} {}: {}", method, url, e))
            }),
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        self.get_optional(path, query).await?.ok_or_else(|| {
            ApiError::InvalidResponse(format!("Empty response from {}", self.url_for(path)))
        })
    }

    pub(crate) async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<Option<T>> {
        self.request(Method::GET, path, query, None).await
    }

    /// Send a command whose response body, if any, is ignored
    pub(crate) async fn command(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> ApiResult<()> {
        let url = self.url_for(path);
        self.execute(&method, &url, query, body).await?;
        Ok(())
    }

    async fn execute(
        &self,
        method: &Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> ApiResult<Option<String>> {
        let attempts = AtomicU32::new(0);
        let refreshed = AtomicBool::new(false);
        let (attempts, refreshed) = (&attempts, &refreshed);

        retry_notify(
            self.config.retry.backoff(),
            || async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                self.attempt(method, url, query, body, attempt, refreshed)
                    .await
            },
            |err: ApiError, wait: Duration| {
                warn!("{} {} failed: {}. Retrying in {:?}", method, url, err, wait);
            },
        )
        .await
    }

    /// One attempt, including the single refresh-and-resend on 401
    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        attempt: u32,
        refreshed: &AtomicBool,
    ) -> Result<Option<String>, backoff::Error<ApiError>> {
        debug!("{} {} (attempt {})", method, url, attempt);

        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| backoff::Error::permanent(ApiError::Auth(e)))?;

        let mut response = self
            .send(method, url, query, body, &token)
            .await
            .map_err(|e| self.retryable(e, attempt))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if refreshed.swap(true, Ordering::SeqCst) {
                return Err(backoff::Error::permanent(ApiError::Unauthorized));
            }

            debug!("Access token rejected, refreshing once");
            let token = self
                .tokens
                .refresh()
                .await
                .map_err(|e| backoff::Error::permanent(ApiError::Auth(e)))?;

            response = self
                .send(method, url, query, body, &token)
                .await
                .map_err(|e| self.retryable(e, attempt))?;

            if response.status() == StatusCode::UNAUTHORIZED {
                error!("Access token rejected again after refresh");
                return Err(backoff::Error::permanent(ApiError::Unauthorized));
            }
        }

        self.read_response(response, attempt).await
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        token: &str,
    ) -> ApiResult<Response> {
        let mut request = self.http.request(method.clone(), url).bearer_auth(token);

        if !query.is_empty() {
            request = request.query(query);
        }
        request = match body {
            Some(body) => request.json(body),
            // Spotify answers 411 to body-less PUT/POST without a length
            None if *method != Method::GET => request.header(CONTENT_LENGTH, 0),
            None => request,
        };

        request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn read_response(
        &self,
        response: Response,
        attempt: u32,
    ) -> Result<Option<String>, backoff::Error<ApiError>> {
        let status = response.status();

        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| self.retryable(ApiError::Network(e.to_string()), attempt))?;
            let empty = status == StatusCode::NO_CONTENT || text.trim().is_empty();
            return Ok((!empty).then_some(text));
        }

        let retry_after = parse_retry_after(&response);
        let raw = response.text().await.unwrap_or_default();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(self.retryable(ApiError::RateLimited { retry_after }, attempt));
        }
        if status.is_server_error() {
            return Err(self.retryable(
                ApiError::ServerError {
                    status: status.as_u16(),
                },
                attempt,
            ));
        }

        let body = ErrorBody::parse(&raw);
        debug!("Request failed with {}: {}", status, body);
        Err(backoff::Error::permanent(ApiError::RequestFailed {
            status: status.as_u16(),
            body,
        }))
    }

    /// Retry unless the attempt budget is spent; honour Retry-After up to `max_delay`
    fn retryable(&self, err: ApiError, attempt: u32) -> backoff::Error<ApiError> {
        let policy = &self.config.retry;
        if attempt >= policy.max_attempts {
            error!("Giving up after {} attempt(s): {}", attempt, err);
            return backoff::Error::permanent(err);
        }

        let requested_wait = match &err {
            ApiError::RateLimited {
                retry_after: Some(wait),
            } => Some(*wait),
            _ => None,
        };

        match requested_wait {
            Some(wait) => backoff::Error::retry_after(err, wait.min(policy.max_delay)),
            None => backoff::Error::transient(err),
        }
    }
}

fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
