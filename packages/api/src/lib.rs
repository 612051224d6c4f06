// ABOUTME: Cadenza's Spotify Web API client
// ABOUTME: Authenticated requests with retry and backoff, pagination, typed models and domain operations

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod pagination;
pub mod token;

pub use client::{ClientConfig, RetryPolicy, SpotifyClient, DEFAULT_API_BASE_URL};
pub use endpoints::parse_id;
pub use error::{ApiError, ApiResult, ErrorBody};
pub use models::{
    Album, Artist, Device, PlayHistory, PlayOffset, PlayRequest, PlaybackContext, PlaybackState,
    Playlist, PlaylistItem, SearchResults, SearchType, SimplifiedArtist, Track, User,
};
pub use pagination::{CursorPage, Page, Paged};
pub use reqwest::Method;
pub use token::TokenSource;
