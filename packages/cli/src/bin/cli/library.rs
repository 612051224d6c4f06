// ABOUTME: CLI commands for the signed-in user's library
// ABOUTME: Profile, playlists, playlist tracks, listening history and followed artists

use anyhow::Result;
use cadenza_cli::{output, AppContext};
use colored::*;

pub async fn profile(context: &AppContext) -> Result<()> {
    let user = context.client.current_user().await?;

    println!("{}", "👤 Spotify Profile".bold().cyan());
    println!();
    println!(
        "  {:<10} {}",
        "Name:".bold(),
        user.display_name.as_deref().unwrap_or(&user.id)
    );
    println!("  {:<10} {}", "ID:".bold(), user.id);
    if let Some(email) = &user.email {
        println!("  {:<10} {}", "Email:".bold(), email);
    }
    if let Some(country) = &user.country {
        println!("  {:<10} {}", "Country:".bold(), country);
    }
    println!(
        "  {:<10} {}",
        "Plan:".bold(),
        if user.is_premium() {
            "premium".green().to_string()
        } else {
            user.product.clone().unwrap_or_else(|| "unknown".to_string())
        }
    );
    if let Some(followers) = &user.followers {
        println!("  {:<10} {}", "Followers:".bold(), followers.total);
    }
    Ok(())
}

pub async fn playlists(context: &AppContext) -> Result<()> {
    let playlists = context.client.current_user_playlists().await?;

    if playlists.is_empty() {
        println!("{}", "No playlists found.".yellow());
        return Ok(());
    }

    println!(
        "{} {}",
        "📂 Your Playlists".bold().cyan(),
        format!("({})", playlists.len()).dimmed()
    );
    println!("{}", output::playlists_table(&playlists));
    Ok(())
}

pub async fn playlist_tracks(context: &AppContext, playlist: &str) -> Result<()> {
    let items = context.client.playlist_tracks(playlist).await?;

    if items.is_empty() {
        println!("{}", "This playlist is empty.".yellow());
        return Ok(());
    }

    println!(
        "{} {}",
        "🎶 Playlist Tracks".bold().cyan(),
        format!("({})", items.len()).dimmed()
    );
    println!("{}", output::playlist_items_table(&items));
    Ok(())
}

pub async fn recent(context: &AppContext, limit: u32) -> Result<()> {
    let history = context.client.recently_played(limit).await?;

    if history.is_empty() {
        println!("{}", "No recently played tracks.".yellow());
        return Ok(());
    }

    println!("{}", "🕘 Recently Played".bold().cyan());
    println!("{}", output::history_table(&history));
    Ok(())
}

pub async fn artists(context: &AppContext) -> Result<()> {
    let artists = context.client.followed_artists().await?;

    if artists.is_empty() {
        println!("{}", "You don't follow any artists yet.".yellow());
        return Ok(());
    }

    println!(
        "{} {}",
        "🎤 Followed Artists".bold().cyan(),
        format!("({})", artists.len()).dimmed()
    );
    println!("{}", output::artists_table(&artists));
    Ok(())
}
