// ABOUTME: Catalog lookups: tracks, artist top tracks and search

use crate::{
    client::{SpotifyClient, MAX_PAGE_LIMIT},
    endpoints::parse_id,
    error::{ApiError, ApiResult},
    models::{SearchResults, SearchType, TopTracks, Track},
};

impl SpotifyClient {
    pub async fn track(&self, track: &str) -> ApiResult<Track> {
        let id = parse_id("track", track)?;
        self.get(&format!("/tracks/{}", id), &[]).await
    }

    /// An artist's most popular tracks; `market` defaults to the configured one
    pub async fn artist_top_tracks(
        &self,
        artist: &str,
        market: Option<&str>,
    ) -> ApiResult<Vec<Track>> {
        let id = parse_id("artist", artist)?;
        let market = market.unwrap_or(&self.config().market).to_string();
        let top: TopTracks = self
            .get(&format!("/artists/{}/top-tracks", id), &[("market", market)])
            .await?;
        Ok(top.tracks)
    }

    /// Search the catalog; only the first page of each requested type is returned
    pub async fn search(
        &self,
        query: &str,
        types: &[SearchType],
        limit: u32,
    ) -> ApiResult<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidInput("Search query is empty".to_string()));
        }

        let types = if types.is_empty() {
            vec![SearchType::Track]
        } else {
            types.to_vec()
        };
        let type_list = types
            .iter()
            .map(SearchType::as_str)
            .collect::<Vec<_>>()
            .join(",");

        self.get(
            "/search",
            &[
                ("q", query.to_string()),
                ("type", type_list),
                ("limit", limit.clamp(1, MAX_PAGE_LIMIT).to_string()),
            ],
        )
        .await
    }
}
