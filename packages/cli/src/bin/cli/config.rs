// ABOUTME: CLI commands for the config file
// ABOUTME: Writes a starter config.toml, shows effective settings, and loads settings for other commands

use anyhow::{bail, Context, Result};
use cadenza_config::Settings;
use clap::Subcommand;
use colored::*;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with default settings
    Init {
        /// Spotify application client id
        #[arg(long)]
        client_id: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show the effective settings (file plus environment overrides)
    Show,
    /// Print the config file location
    Path,
}

pub fn handle_config_command(command: &ConfigCommands, path: &Path) -> Result<()> {
    match command {
        ConfigCommands::Init { client_id, force } => init(path, client_id.as_deref(), *force),
        ConfigCommands::Show => show(path),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// Load a config file, apply environment overrides and validate
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings = Settings::load_from(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    settings.apply_overrides(|name| std::env::var(name).ok())?;
    settings
        .validate()
        .context("Run `cadenza config init --client-id <id>` to create a config file")?;
    Ok(settings)
}

fn init(path: &Path, client_id: Option<&str>, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let mut settings = Settings::default();
    if let Some(client_id) = client_id {
        settings.auth.client_id = client_id.to_string();
    }
    settings.save_to(path)?;

    println!(
        "{} Wrote {}",
        "✓".green().bold(),
        path.display().to_string().cyan()
    );
    if settings.auth.client_id.is_empty() {
        println!(
            "{}",
            "Set auth.client_id to your Spotify application's client id before signing in."
                .dimmed()
        );
    }
    Ok(())
}

fn show(path: &Path) -> Result<()> {
    let mut settings = Settings::load_from(path)?;
    settings.apply_overrides(|name| std::env::var(name).ok())?;

    println!("{}", "⚙️  Cadenza Settings".bold().cyan());
    println!("  {:<16} {}", "Config file:".bold(), path.display());
    println!(
        "  {:<16} {}",
        "Client id:".bold(),
        if settings.auth.client_id.is_empty() {
            "(not set)".yellow().to_string()
        } else {
            settings.auth.client_id.clone()
        }
    );
    println!("  {:<16} {}", "Redirect URI:".bold(), settings.auth.redirect_uri);
    println!("  {:<16} {}", "Callback mode:".bold(), settings.auth.callback_mode);
    println!("  {:<16} {}", "Accounts URL:".bold(), settings.auth.accounts_url);
    println!("  {:<16} {}", "API base URL:".bold(), settings.api.base_url);
    println!("  {:<16} {}", "Secret store:".bold(), settings.storage.backend);
    println!(
        "  {:<16} {} attempts, {}ms base, {}ms max",
        "Retry:".bold(),
        settings.retry.max_attempts,
        settings.retry.base_delay_ms,
        settings.retry.max_delay_ms
    );

    if let Err(e) = settings.validate() {
        println!();
        println!("{} {}", "⚠".yellow().bold(), e);
    }
    Ok(())
}
