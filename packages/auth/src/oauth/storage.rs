// ABOUTME: Secret storage for OAuth tokens and the transient PKCE verifier
// ABOUTME: Opaque string secret stores (OS keyring, memory) under a typed token store

use async_trait::async_trait;
use keyring::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::{
    error::{AuthError, AuthResult},
    oauth::types::TokenRecord,
};

/// Opaque key/value secret storage
///
/// Deleting a key that does not exist is not an error.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> AuthResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> AuthResult<()>;
    async fn delete(&self, key: &str) -> AuthResult<()>;
}

/// Secrets in the OS keyring, one entry per key under a service name
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Run a keyring call for `key` on the blocking pool
    async fn with_entry<T, F>(&self, key: &str, call: F) -> AuthResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Entry) -> AuthResult<T> + Send + 'static,
    {
        let service = self.service.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &key)
                .map_err(|e| AuthError::Storage(format!("Failed to access keyring: {}", e)))?;
            call(&entry)
        })
        .await
        .map_err(|e| AuthError::Storage(format!("Keyring task failed: {}", e)))?
    }
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let name = key.to_string();
        self.with_entry(key, move |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => {
                error!("Failed to read keyring entry {}: {}", name, e);
                Err(AuthError::Storage(format!("Failed to read {}: {}", name, e)))
            }
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        let name = key.to_string();
        let value = value.to_string();
        self.with_entry(key, move |entry| {
            entry.set_password(&value).map_err(|e| {
                error!("Failed to write keyring entry {}: {}", name, e);
                AuthError::Storage(format!("Failed to store {}: {}", name, e))
            })
        })
        .await
    }

    async fn delete(&self, key: &str) -> AuthResult<()> {
        let name = key.to_string();
        self.with_entry(key, move |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AuthError::Storage(format!("Failed to remove {}: {}", name, e))),
        })
        .await
    }
}

/// Secrets kept in process memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AuthResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Typed view of the token record and PKCE verifier in a secret store
#[derive(Clone)]
pub struct TokenStore {
    secrets: Arc<dyn SecretStore>,
    namespace: String,
}

impl TokenStore {
    pub fn new(secrets: Arc<dyn SecretStore>, namespace: impl Into<String>) -> Self {
        Self {
            secrets,
            namespace: namespace.into(),
        }
    }

    fn key(&self, field: &str) -> String {
        format!("{}.{}", self.namespace, field)
    }

    pub fn access_token_key(&self) -> String {
        self.key("access_token")
    }

    pub fn refresh_token_key(&self) -> String {
        self.key("refresh_token")
    }

    pub fn expires_at_key(&self) -> String {
        self.key("expires_at")
    }

    pub fn verifier_key(&self) -> String {
        self.key("pkce_verifier")
    }

    /// Load the token record; `None` when no access token is stored
    pub async fn load(&self) -> AuthResult<Option<TokenRecord>> {
        let Some(access_token) = self.secrets.get(&self.access_token_key()).await? else {
            debug!("No access token stored");
            return Ok(None);
        };

        let refresh_token = self.secrets.get(&self.refresh_token_key()).await?;

        // A missing or corrupt expiry is treated as already expired
        let expires_at = self
            .secrets
            .get(&self.expires_at_key())
            .await?
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or(0);

        Ok(Some(TokenRecord {
            access_token,
            refresh_token,
            expires_at,
        }))
    }

    /// Persist a token record
    ///
    /// The refresh token is only written when the record carries one, so a
    /// provider that does not rotate it never erases the stored value.
    pub async fn save(&self, record: &TokenRecord) -> AuthResult<()> {
        self.secrets
            .set(&self.access_token_key(), &record.access_token)
            .await?;
        self.secrets
            .set(&self.expires_at_key(), &record.expires_at.to_string())
            .await?;
        if let Some(refresh_token) = &record.refresh_token {
            self.secrets
                .set(&self.refresh_token_key(), refresh_token)
                .await?;
        }
        debug!("Stored token record");
        Ok(())
    }

    pub async fn refresh_token(&self) -> AuthResult<Option<String>> {
        self.secrets.get(&self.refresh_token_key()).await
    }

    pub async fn save_verifier(&self, verifier: &str) -> AuthResult<()> {
        self.secrets.set(&self.verifier_key(), verifier).await
    }

    pub async fn verifier(&self) -> AuthResult<Option<String>> {
        self.secrets.get(&self.verifier_key()).await
    }

    pub async fn clear_verifier(&self) -> AuthResult<()> {
        self.secrets.delete(&self.verifier_key()).await
    }

    /// Remove the three token fields
    pub async fn clear_tokens(&self) -> AuthResult<()> {
        self.secrets.delete(&self.access_token_key()).await?;
        self.secrets.delete(&self.refresh_token_key()).await?;
        self.secrets.delete(&self.expires_at_key()).await?;
        debug!("Cleared stored tokens");
        Ok(())
    }

    /// Remove the token fields and any PKCE verifier
    pub async fn clear_all(&self) -> AuthResult<()> {
        self.clear_tokens().await?;
        self.clear_verifier().await
    }
}
