// ABOUTME: CLI commands for catalog lookups
// ABOUTME: Artist top tracks, single track details and search

use anyhow::{anyhow, Result};
use cadenza_api::{Playlist, SearchType};
use cadenza_cli::{output, AppContext};
use colored::*;

pub async fn top_tracks(context: &AppContext, artist: &str, market: Option<&str>) -> Result<()> {
    let tracks = context.client.artist_top_tracks(artist, market).await?;

    if tracks.is_empty() {
        println!("{}", "No top tracks available in this market.".yellow());
        return Ok(());
    }

    println!("{}", "🔥 Top Tracks".bold().cyan());
    println!("{}", output::tracks_table(&tracks));
    Ok(())
}

pub async fn track(context: &AppContext, track: &str) -> Result<()> {
    let track = context.client.track(track).await?;

    println!("{}", format!("🎵 {}", track.name).bold().cyan());
    println!();
    println!("  {:<10} {}", "Artists:".bold(), track.artist_names());
    if let Some(album) = &track.album {
        let released = album
            .release_date
            .as_deref()
            .map(|date| format!(" ({})", date))
            .unwrap_or_default();
        println!("  {:<10} {}{}", "Album:".bold(), album.name, released);
    }
    println!("  {:<10} {}", "Length:".bold(), track.duration_display());
    if let Some(popularity) = track.popularity {
        println!("  {:<10} {}/100", "Popularity:".bold(), popularity);
    }
    if track.explicit {
        println!("  {:<10} {}", "Explicit:".bold(), "yes".red());
    }
    println!("  {:<10} {}", "URI:".bold(), track.uri);
    Ok(())
}

pub async fn search(context: &AppContext, query: &str, types: &[String], limit: u32) -> Result<()> {
    let types = types
        .iter()
        .map(|value| value.parse::<SearchType>().map_err(|e| anyhow!(e)))
        .collect::<Result<Vec<_>>>()?;

    let results = context.client.search(query, &types, limit).await?;
    let mut found = false;

    if let Some(page) = results.tracks.filter(|page| !page.items.is_empty()) {
        found = true;
        println!("{}", "🎵 Tracks".bold().cyan());
        println!("{}", output::tracks_table(&page.items));
    }
    if let Some(page) = results.artists.filter(|page| !page.items.is_empty()) {
        found = true;
        println!("{}", "🎤 Artists".bold().cyan());
        println!("{}", output::artists_table(&page.items));
    }
    if let Some(page) = results.albums.filter(|page| !page.items.is_empty()) {
        found = true;
        println!("{}", "💿 Albums".bold().cyan());
        println!("{}", output::albums_table(&page.items));
    }
    if let Some(page) = results.playlists {
        let playlists: Vec<Playlist> = page.items.into_iter().flatten().collect();
        if !playlists.is_empty() {
            found = true;
            println!("{}", "📂 Playlists".bold().cyan());
            println!("{}", output::playlists_table(&playlists));
        }
    }

    if !found {
        println!("{} No results for \"{}\"", "ℹ".blue(), query);
    }
    Ok(())
}
