// ABOUTME: CLI commands for playback control
// ABOUTME: Now playing, play/pause/skip, device listing and playback transfer

use anyhow::Result;
use cadenza_api::PlayRequest;
use cadenza_cli::{output, AppContext};
use colored::*;

pub async fn now_playing(context: &AppContext) -> Result<()> {
    let Some(state) = context.client.playback_state().await? else {
        println!("{} Nothing playing", "ℹ".blue());
        return Ok(());
    };

    let Some(track) = &state.item else {
        let kind = state
            .currently_playing_type
            .as_deref()
            .unwrap_or("something");
        println!("{} Playing {} (no track details)", "ℹ".blue(), kind);
        return Ok(());
    };

    let icon = if state.is_playing { "▶" } else { "⏸" };
    println!("{} {}", icon.green().bold(), track.name.bold());
    println!("  {}", track.artist_names());
    if let Some(album) = &track.album {
        println!("  {}", album.name.dimmed());
    }
    println!(
        "  {} / {}",
        output::format_duration(state.progress_ms.unwrap_or_default()),
        output::format_duration(track.duration_ms)
    );
    if let Some(device) = &state.device {
        println!("  {} {}", "on".dimmed(), device.name);
    }
    Ok(())
}

pub async fn play(
    context: &AppContext,
    play_context: Option<String>,
    uris: Vec<String>,
    offset: Option<u32>,
    device: Option<String>,
) -> Result<()> {
    let mut request = match play_context {
        Some(uri) => PlayRequest::context(uri),
        None if !uris.is_empty() => PlayRequest::tracks(uris),
        None => PlayRequest::resume(),
    };
    if let Some(position) = offset {
        request = request.at_position(position);
    }
    if let Some(device) = device {
        request = request.on_device(device);
    }

    let resuming = request.is_resume();
    context.client.play(&request).await?;
    println!(
        "{} {}",
        "▶".green().bold(),
        if resuming {
            "Playback resumed"
        } else {
            "Playback started"
        }
    );
    Ok(())
}

pub async fn pause(context: &AppContext) -> Result<()> {
    context.client.pause().await?;
    println!("{} Paused", "⏸".yellow().bold());
    Ok(())
}

pub async fn next(context: &AppContext) -> Result<()> {
    context.client.next().await?;
    println!("{} Skipped to next track", "⏭".green().bold());
    Ok(())
}

pub async fn previous(context: &AppContext) -> Result<()> {
    context.client.previous().await?;
    println!("{} Back to previous track", "⏮".green().bold());
    Ok(())
}

pub async fn devices(context: &AppContext) -> Result<()> {
    let devices = context.client.devices().await?;

    if devices.is_empty() {
        println!("{}", "No devices available.".yellow());
        println!("Open Spotify on a phone, computer or speaker and try again.");
        return Ok(());
    }

    println!("{}", "🔊 Devices".bold().cyan());
    println!("{}", output::devices_table(&devices));
    Ok(())
}

pub async fn transfer(context: &AppContext, device: &str, play: bool) -> Result<()> {
    context.client.transfer_playback(device, play).await?;
    println!(
        "{} Playback moved to {}",
        "✓".green().bold(),
        device.bold()
    );
    Ok(())
}
