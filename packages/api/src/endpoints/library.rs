// ABOUTME: Profile and library operations for the signed-in user
// ABOUTME: Profile, playlists with their tracks, listening history and followed artists

use tracing::info;

use crate::{
    client::{SpotifyClient, MAX_PAGE_LIMIT},
    endpoints::parse_id,
    error::ApiResult,
    models::{Artist, PlayHistory, Playlist, PlaylistItem, User},
    pagination::{CursorPage, FollowedArtists, Page},
};

impl SpotifyClient {
    /// The signed-in user's profile
    pub async fn current_user(&self) -> ApiResult<User> {
        self.get("/me", &[]).await
    }

    /// Every playlist the user owns or follows
    pub async fn current_user_playlists(&self) -> ApiResult<Vec<Playlist>> {
        let first: Page<Playlist> = self
            .get("/me/playlists", &[("limit", self.config().page_limit.to_string())])
            .await?;
        let playlists = self.collect_pages(first).await;
        info!("Fetched {} playlists", playlists.len());
        Ok(playlists)
    }

    /// Every item of a playlist, in playlist order
    pub async fn playlist_tracks(&self, playlist: &str) -> ApiResult<Vec<PlaylistItem>> {
        let id = parse_id("playlist", playlist)?;
        let first: Page<PlaylistItem> = self
            .get(
                &format!("/playlists/{}/tracks", id),
                &[("limit", self.config().page_limit.to_string())],
            )
            .await?;
        Ok(self.collect_pages(first).await)
    }

    /// The most recently played tracks, newest first
    ///
    /// Spotify keeps a short history, so a single page of at most 50 is returned.
    pub async fn recently_played(&self, limit: u32) -> ApiResult<Vec<PlayHistory>> {
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        let page: CursorPage<PlayHistory> = self
            .get("/me/player/recently-played", &[("limit", limit.to_string())])
            .await?;
        Ok(page.items)
    }

    /// Every artist the user follows
    pub async fn followed_artists(&self) -> ApiResult<Vec<Artist>> {
        let first: FollowedArtists<Artist> = self
            .get(
                "/me/following",
                &[
                    ("type", "artist".to_string()),
                    ("limit", self.config().page_limit.to_string()),
                ],
            )
            .await?;
        Ok(self.collect_pages(first).await)
    }
}
