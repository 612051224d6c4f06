// ABOUTME: Spotify Web API domain operations on SpotifyClient
// ABOUTME: Grouped by area: library, catalog lookups, playback control

use url::Url;

use crate::error::{ApiError, ApiResult};

mod catalog;
mod library;
mod player;

/// Extract a Spotify id from a bare id, a `spotify:{kind}:{id}` URI or an
/// `https://open.spotify.com/{kind}/{id}` link
pub fn parse_id(kind: &str, input: &str) -> ApiResult<String> {
    let input = input.trim();

    let candidate = if let Some(rest) = input.strip_prefix("spotify:") {
        match rest.split_once(':') {
            Some((found, id)) if found == kind => id.to_string(),
            _ => return Err(invalid_id(kind, input)),
        }
    } else if input.starts_with("http://") || input.starts_with("https://") {
        let url = Url::parse(input).map_err(|_| invalid_id(kind, input))?;
        let mut segments = url.path_segments().ok_or_else(|| invalid_id(kind, input))?;
        match (segments.next(), segments.next()) {
            (Some(found), Some(id)) if found == kind => id.to_string(),
            _ => return Err(invalid_id(kind, input)),
        }
    } else {
        input.to_string()
    };

    if candidate.is_empty() || !candidate.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid_id(kind, input));
    }
    Ok(candidate)
}

fn invalid_id(kind: &str, input: &str) -> ApiError {
    ApiError::InvalidInput(format!("Not a Spotify {} id: {}", kind, input))
}
