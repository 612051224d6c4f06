// ABOUTME: User settings loaded from config.toml with environment overrides
// ABOUTME: Covers the Spotify application, endpoints, retry budget and secret storage backend

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::constants::*;
use crate::error::{ConfigError, ConfigResult};

/// How the authorization redirect reaches us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CallbackMode {
    /// Listen on the redirect URI's loopback address
    #[default]
    Loopback,
    /// The user pastes the code (or the full redirect URL) by hand
    Manual,
}

impl fmt::Display for CallbackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loopback => write!(f, "loopback"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

impl FromStr for CallbackMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "loopback" => Ok(Self::Loopback),
            "manual" => Ok(Self::Manual),
            _ => Err(ConfigError::Invalid(format!(
                "Unknown callback mode: {}. Supported: loopback, manual",
                s
            ))),
        }
    }
}

/// Where tokens are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    /// OS keychain
    #[default]
    Keyring,
    /// Process memory only; tokens are gone when the process exits
    Memory,
}

impl fmt::Display for SecretBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyring => write!(f, "keyring"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for SecretBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid(format!(
                "Unknown secret backend: {}. Supported: keyring, memory",
                s
            ))),
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub auth: AuthSettings,
    pub api: ApiSettings,
    pub retry: RetrySettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Spotify application client id (PKCE needs no secret)
    pub client_id: String,
    pub redirect_uri: String,
    pub accounts_url: String,
    pub scopes: Vec<String>,
    pub callback_mode: CallbackMode,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            callback_mode: CallbackMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Page size requested from list endpoints
    pub page_limit: u32,
    /// Market used for artist top tracks when none is given
    pub market: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
            page_limit: 50,
            market: "from_token".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts for 429 / 5xx / transport failures, first try included
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: SecretBackend,
    /// Keyring service name, also used to namespace the entries
    pub service: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: SecretBackend::default(),
            service: DEFAULT_KEYRING_SERVICE.to_string(),
        }
    }
}

impl Settings {
    /// Default location: `<config_dir>/cadenza/config.toml`, or `CADENZA_CONFIG_PATH`
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CADENZA_CONFIG_PATH) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cadenza")
            .join("config.toml")
    }

    /// Load from the default location, apply environment overrides and validate
    pub fn load() -> ConfigResult<Self> {
        let mut settings = Self::load_from(&Self::default_path())?;
        settings.apply_overrides(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Write the settings as TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(client_id) = lookup(CADENZA_CLIENT_ID) {
            self.auth.client_id = client_id;
        }
        if let Some(redirect_uri) = lookup(CADENZA_REDIRECT_URI) {
            self.auth.redirect_uri = redirect_uri;
        }
        if let Some(accounts_url) = lookup(CADENZA_ACCOUNTS_URL) {
            self.auth.accounts_url = accounts_url;
        }
        if let Some(mode) = lookup(CADENZA_CALLBACK_MODE) {
            self.auth.callback_mode = mode.parse()?;
        }
        if let Some(base_url) = lookup(CADENZA_API_BASE_URL) {
            self.api.base_url = base_url;
        }
        if let Some(backend) = lookup(CADENZA_SECRET_BACKEND) {
            self.storage.backend = backend.parse()?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.auth.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Spotify client id is required (set auth.client_id or {})",
                CADENZA_CLIENT_ID
            )));
        }
        if !self.auth.redirect_uri.starts_with("http://")
            && !self.auth.redirect_uri.starts_with("https://")
        {
            return Err(ConfigError::Invalid(
                "Redirect URI must be an http(s) URL".to_string(),
            ));
        }
        if self.auth.scopes.is_empty() {
            return Err(ConfigError::Invalid(
                "At least one scope is required".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Invalid(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }
        if self.api.page_limit == 0 || self.api.page_limit > 50 {
            return Err(ConfigError::Invalid(
                "api.page_limit must be between 1 and 50".to_string(),
            ));
        }
        Ok(())
    }
}
