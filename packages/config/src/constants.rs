// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Cadenza

// Spotify application
pub const CADENZA_CLIENT_ID: &str = "CADENZA_CLIENT_ID";
pub const CADENZA_REDIRECT_URI: &str = "CADENZA_REDIRECT_URI";
pub const CADENZA_CALLBACK_MODE: &str = "CADENZA_CALLBACK_MODE";

// Endpoints (overridable for local testing)
pub const CADENZA_ACCOUNTS_URL: &str = "CADENZA_ACCOUNTS_URL";
pub const CADENZA_API_BASE_URL: &str = "CADENZA_API_BASE_URL";

// Secret storage
pub const CADENZA_SECRET_BACKEND: &str = "CADENZA_SECRET_BACKEND";

// Config file location override
pub const CADENZA_CONFIG_PATH: &str = "CADENZA_CONFIG_PATH";

// Logging
pub const CADENZA_LOG: &str = "CADENZA_LOG";
pub const RUST_LOG: &str = "RUST_LOG"; // Fallback

// Defaults
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_KEYRING_SERVICE: &str = "cadenza";

/// Scopes needed for playlists, library browsing and playback control
pub const DEFAULT_SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "playlist-read-private",
    "playlist-read-collaborative",
    "user-follow-read",
    "user-read-recently-played",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
];
