// ABOUTME: Common test utilities for API client integration tests
// ABOUTME: Provides a scripted token source, client setup against a mock server, and JSON fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use cadenza_api::{ClientConfig, RetryPolicy, SpotifyClient, TokenSource};
use cadenza_auth::{AuthError, AuthResult};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use wiremock::MockServer;

/// Token source that hands out `stale-token` until refreshed, then `fresh-token`
#[derive(Default)]
pub struct ScriptedTokens {
    refreshed: Mutex<bool>,
    pub refreshes: AtomicUsize,
    pub fail_with: Option<AuthError>,
}

impl ScriptedTokens {
    pub fn failing(error: AuthError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    fn current(&self) -> String {
        if *self.refreshed.lock().unwrap() {
            "fresh-token".to_string()
        } else {
            "stale-token".to_string()
        }
    }
}

#[async_trait]
impl TokenSource for ScriptedTokens {
    async fn access_token(&self) -> AuthResult<String> {
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(self.current()),
        }
    }

    async fn refresh(&self) -> AuthResult<String> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        *self.refreshed.lock().unwrap() = true;
        Ok(self.current())
    }
}

/// Short delays so retry tests stay fast
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
    }
}

pub fn client_for(server: &MockServer, tokens: Arc<ScriptedTokens>) -> SpotifyClient {
    client_with(server, tokens, |config| config)
}

pub fn client_with(
    server: &MockServer,
    tokens: Arc<ScriptedTokens>,
    customize: impl FnOnce(ClientConfig) -> ClientConfig,
) -> SpotifyClient {
    let config = customize(ClientConfig::new(server.uri()).with_retry(fast_retry()));
    SpotifyClient::new(config, tokens).unwrap()
}

pub fn user_json() -> Value {
    json!({
        "id": "listener",
        "display_name": "Test Listener",
        "email": "listener@example.com",
        "country": "SE",
        "product": "premium",
        "followers": {"total": 3},
        "images": [],
        "uri": "spotify:user:listener"
    })
}

pub fn track_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Track {}", id),
        "uri": format!("spotify:track:{}", id),
        "duration_ms": 200000,
        "explicit": false,
        "popularity": 50,
        "artists": [{"id": "a1", "name": "Artist One", "uri": "spotify:artist:a1"}],
        "album": {
            "id": "al1",
            "name": "Album One",
            "uri": "spotify:album:al1",
            "album_type": "album",
            "release_date": "2020-01-01",
            "artists": [],
            "images": []
        },
        "is_local": false
    })
}

pub fn playlist_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Playlist {}", id),
        "description": null,
        "uri": format!("spotify:playlist:{}", id),
        "public": true,
        "collaborative": false,
        "owner": {"id": "listener", "display_name": "Test Listener"},
        "tracks": {"href": null, "total": 10},
        "snapshot_id": "snap"
    })
}

pub fn artist_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Artist {}", id),
        "uri": format!("spotify:artist:{}", id),
        "genres": ["indie"],
        "popularity": 70,
        "followers": {"total": 1000}
    })
}

pub fn device_json(id: &str, active: bool) -> Value {
    json!({
        "id": id,
        "name": format!("Device {}", id),
        "type": "Computer",
        "is_active": active,
        "is_restricted": false,
        "volume_percent": 60
    })
}
