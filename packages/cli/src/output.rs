// ABOUTME: Plain table rendering for command output
// ABOUTME: Builds comfy-table tables for tracks, playlists, artists and devices

use cadenza_api::{Album, Artist, Device, PlayHistory, Playlist, PlaylistItem, Track};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};

const PLACEHOLDER: &str = "—";

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// `m:ss` from milliseconds
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn tracks_table(tracks: &[Track]) -> Table {
    let mut table = table(vec!["#", "Title", "Artists", "Album", "Length", "ID"]);
    for (index, track) in tracks.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            truncate(&track.name, 40),
            truncate(&track.artist_names(), 30),
            track
                .album
                .as_ref()
                .map(|album| truncate(&album.name, 30))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            track.duration_display(),
            track.id.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
        ]);
    }
    table
}

pub fn playlist_items_table(items: &[PlaylistItem]) -> Table {
    let mut table = table(vec!["#", "Title", "Artists", "Length", "Added"]);
    for (index, item) in items.iter().enumerate() {
        let (title, artists, length) = match &item.track {
            Some(track) => (
                truncate(&track.name, 40),
                truncate(&track.artist_names(), 30),
                track.duration_display(),
            ),
            None => (
                "(unavailable)".to_string(),
                PLACEHOLDER.to_string(),
                PLACEHOLDER.to_string(),
            ),
        };
        table.add_row(vec![
            (index + 1).to_string(),
            title,
            artists,
            length,
            item.added_at
                .as_deref()
                .map(|added| added.chars().take(10).collect())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        ]);
    }
    table
}

pub fn playlists_table(playlists: &[Playlist]) -> Table {
    let mut table = table(vec!["Name", "Owner", "Tracks", "ID"]);
    for playlist in playlists {
        table.add_row(vec![
            truncate(&playlist.name, 40),
            playlist
                .owner
                .display_name
                .clone()
                .unwrap_or_else(|| playlist.owner.id.clone()),
            playlist
                .tracks
                .as_ref()
                .map(|tracks| tracks.total.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            playlist.id.clone(),
        ]);
    }
    table
}

pub fn history_table(history: &[PlayHistory]) -> Table {
    let mut table = table(vec!["Played at", "Title", "Artists"]);
    for entry in history {
        table.add_row(vec![
            entry.played_at.chars().take(19).collect::<String>().replace('T', " "),
            truncate(&entry.track.name, 40),
            truncate(&entry.track.artist_names(), 30),
        ]);
    }
    table
}

pub fn artists_table(artists: &[Artist]) -> Table {
    let mut table = table(vec!["Name", "Genres", "Followers", "ID"]);
    for artist in artists {
        table.add_row(vec![
            truncate(&artist.name, 30),
            if artist.genres.is_empty() {
                PLACEHOLDER.to_string()
            } else {
                truncate(&artist.genres.join(", "), 40)
            },
            artist
                .followers
                .as_ref()
                .map(|followers| followers.total.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            artist.id.clone(),
        ]);
    }
    table
}

pub fn albums_table(albums: &[Album]) -> Table {
    let mut table = table(vec!["Name", "Artists", "Released", "ID"]);
    for album in albums {
        let artists = album
            .artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            truncate(&album.name, 40),
            truncate(&artists, 30),
            album
                .release_date
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            album.id.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
        ]);
    }
    table
}

pub fn devices_table(devices: &[Device]) -> Table {
    let mut table = table(vec!["", "Name", "Type", "Volume", "ID"]);
    for device in devices {
        table.add_row(vec![
            if device.is_active { "▶" } else { "" }.to_string(),
            device.name.clone(),
            device.device_type.clone(),
            device
                .volume_percent
                .map(|volume| format!("{}%", volume))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            device.id.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
        ]);
    }
    table
}
