// ABOUTME: Typed Spotify Web API response and request models
// ABOUTME: Nullable and sometimes-missing fields are Options or defaulted collections

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pagination::Page;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followers {
    pub total: u64,
}

/// The signed-in user's profile (`GET /me`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    /// `premium`, `free` or `open`
    pub product: Option<String>,
    pub followers: Option<Followers>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub uri: Option<String>,
}

impl User {
    pub fn is_premium(&self) -> bool {
        self.product.as_deref() == Some("premium")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    pub id: Option<String>,
    pub name: String,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
    pub followers: Option<Followers>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: Option<String>,
    pub name: String,
    pub uri: Option<String>,
    pub album_type: Option<String>,
    pub release_date: Option<String>,
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// A track; local files have no id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub explicit: bool,
    pub popularity: Option<u32>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    pub album: Option<Album>,
    #[serde(default)]
    pub is_local: bool,
}

impl Track {
    /// Artist names joined for display
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Duration as `m:ss`
    pub fn duration_display(&self) -> String {
        let seconds = self.duration_ms / 1000;
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    pub display_name: Option<String>,
}

/// Reference to a playlist's tracks collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTracksRef {
    pub href: Option<String>,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub uri: String,
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
    pub owner: PlaylistOwner,
    pub tracks: Option<PlaylistTracksRef>,
    pub snapshot_id: Option<String>,
}

/// One entry of a playlist; `track` is null for removed or unavailable items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub added_at: Option<String>,
    pub track: Option<Track>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackContext {
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayHistory {
    pub track: Track,
    pub played_at: String,
    pub context: Option<PlaybackContext>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_restricted: bool,
    pub volume_percent: Option<u32>,
}

/// Current playback (`GET /me/player`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub device: Option<Device>,
    #[serde(default)]
    pub is_playing: bool,
    pub shuffle_state: Option<bool>,
    pub repeat_state: Option<String>,
    pub progress_ms: Option<u64>,
    pub item: Option<Track>,
    pub context: Option<PlaybackContext>,
    pub currently_playing_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct TopTracks {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct DeviceList {
    pub devices: Vec<Device>,
}

/// Item types accepted by `GET /search`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Track,
    Artist,
    Album,
    Playlist,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Track => "track",
            SearchType::Artist => "artist",
            SearchType::Album => "album",
            SearchType::Playlist => "playlist",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "track" | "tracks" => Ok(SearchType::Track),
            "artist" | "artists" => Ok(SearchType::Artist),
            "album" | "albums" => Ok(SearchType::Album),
            "playlist" | "playlists" => Ok(SearchType::Playlist),
            other => Err(format!("Unknown search type: {}", other)),
        }
    }
}

/// Search results; only the requested types are present.
/// Playlist results may contain nulls.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SearchResults {
    pub tracks: Option<Page<Track>>,
    pub artists: Option<Page<Artist>>,
    pub albums: Option<Page<Album>>,
    pub playlists: Option<Page<Option<Playlist>>>,
}

/// Where to start playback within a context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayOffset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Body of `PUT /me/player/play`; an empty request resumes playback
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PlayRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<PlayOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_ms: Option<u64>,
    /// Sent as a query parameter, not in the body
    #[serde(skip)]
    pub device_id: Option<String>,
}

impl PlayRequest {
    pub fn resume() -> Self {
        Self::default()
    }

    pub fn context(uri: impl Into<String>) -> Self {
        Self {
            context_uri: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn tracks(uris: Vec<String>) -> Self {
        Self {
            uris: Some(uris),
            ..Self::default()
        }
    }

    pub fn at_position(mut self, position: u32) -> Self {
        self.offset = Some(PlayOffset {
            position: Some(position),
            uri: None,
        });
        self
    }

    pub fn on_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// True when nothing but resume is requested
    pub fn is_resume(&self) -> bool {
        self.context_uri.is_none()
            && self.uris.is_none()
            && self.offset.is_none()
            && self.position_ms.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_track_with_nulls() {
        let track: Track = serde_json::from_value(json!({
            "id": null,
            "name": "Local Song",
            "uri": "spotify:local:::Local+Song:180",
            "duration_ms": 185000,
            "is_local": true,
            "album": null
        }))
        .unwrap();

        assert_eq!(track.id, None);
        assert!(track.artists.is_empty());
        assert_eq!(track.duration_display(), "3:05");
    }

    #[test]
    fn test_artist_names() {
        let track: Track = serde_json::from_value(json!({
            "id": "t1",
            "name": "Duet",
            "uri": "spotify:track:t1",
            "duration_ms": 60000,
            "artists": [{"id": "a1", "name": "First"}, {"id": "a2", "name": "Second"}]
        }))
        .unwrap();

        assert_eq!(track.artist_names(), "First, Second");
    }

    #[test]
    fn test_play_request_body() {
        let request = PlayRequest::context("spotify:playlist:p1")
            .at_position(3)
            .on_device("d1");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "context_uri": "spotify:playlist:p1",
                "offset": {"position": 3}
            })
        );
        assert!(!request.is_resume());
        assert!(PlayRequest::resume().is_resume());
    }

    #[test]
    fn test_search_type_parse() {
        assert_eq!("Tracks".parse::<SearchType>(), Ok(SearchType::Track));
        assert_eq!("album".parse::<SearchType>(), Ok(SearchType::Album));
        assert!("podcast".parse::<SearchType>().is_err());
    }

    #[test]
    fn test_search_results_with_null_playlists() {
        let results: SearchResults = serde_json::from_value(json!({
            "playlists": {
                "items": [null, {
                    "id": "p1",
                    "name": "Mix",
                    "description": null,
                    "uri": "spotify:playlist:p1",
                    "public": true,
                    "owner": {"id": "u1", "display_name": null},
                    "tracks": {"href": null, "total": 12},
                    "snapshot_id": "s"
                }],
                "next": null,
                "total": 2
            }
        }))
        .unwrap();

        let playlists = results.playlists.unwrap();
        assert_eq!(playlists.items.len(), 2);
        assert!(playlists.items[0].is_none());
        assert!(results.tracks.is_none());
    }
}
