use anyhow::Result;
use cadenza_api::ApiError;
use cadenza_auth::AuthError;
use cadenza_cli::{logging, AppContext, ContextOptions};
use cadenza_config::Settings;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;

mod cli;

use cli::config::ConfigCommands;

#[derive(Parser)]
#[command(name = "cadenza")]
#[command(about = "Cadenza - control Spotify from your terminal")]
#[command(version)]
struct Cli {
    /// Log progress at info level (CADENZA_LOG or RUST_LOG take precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Keep tokens in memory for this run only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to Spotify
    Login {
        /// Paste the code by hand instead of listening for the redirect
        #[arg(long)]
        manual: bool,
        /// Print the authorization URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Sign in again even if a valid session exists
        #[arg(long)]
        force: bool,
    },
    /// Remove stored Spotify tokens
    Logout,
    /// Show authentication status
    Status,
    /// Show your Spotify profile
    Profile,
    /// List your playlists
    Playlists,
    /// List the tracks of a playlist
    PlaylistTracks {
        /// Playlist id, URI or link
        playlist: String,
    },
    /// Show recently played tracks
    Recent {
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
    /// List artists you follow
    Artists,
    /// Show an artist's top tracks
    TopTracks {
        /// Artist id, URI or link
        artist: String,
        /// Market (ISO country code); defaults to your account's
        #[arg(long)]
        market: Option<String>,
    },
    /// Show details of a track
    Track {
        /// Track id, URI or link
        track: String,
    },
    /// Show what is playing
    NowPlaying,
    /// Start or resume playback
    Play {
        /// Context URI (playlist, album, artist) to play
        #[arg(long, conflicts_with = "uris")]
        context: Option<String>,
        /// Track URIs to play
        #[arg(long, num_args = 1..)]
        uris: Vec<String>,
        /// Start at this position within the context (0-based)
        #[arg(long)]
        offset: Option<u32>,
        /// Device to play on
        #[arg(long)]
        device: Option<String>,
    },
    /// Pause playback
    Pause,
    /// Skip to the next track
    Next,
    /// Go back to the previous track
    Previous,
    /// List available playback devices
    Devices,
    /// Move playback to another device
    Transfer {
        /// Device id (see `cadenza devices`)
        device: String,
        /// Start playing on the new device
        #[arg(long)]
        play: bool,
    },
    /// Search the Spotify catalog
    Search {
        query: String,
        /// Item types: track, artist, album, playlist
        #[arg(short, long, value_delimiter = ',', default_value = "track")]
        types: Vec<String>,
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },
    /// Manage the config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), describe(&e));
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Settings::default_path);

    if let Commands::Config(command) = &cli.command {
        return cli::config::handle_config_command(command, &config_path);
    }

    let settings = cli::config::load_settings(&config_path)?;
    let (manual, no_browser) = match &cli.command {
        Commands::Login {
            manual, no_browser, ..
        } => (*manual, *no_browser),
        _ => (false, false),
    };
    let context = AppContext::build(
        settings,
        ContextOptions {
            ephemeral: cli.ephemeral,
            manual,
            no_browser,
        },
    )?;

    match cli.command {
        Commands::Login { timeout, force, .. } => cli::auth::login(&context, timeout, force).await,
        Commands::Logout => cli::auth::logout(&context).await,
        Commands::Status => cli::auth::status(&context).await,
        Commands::Profile => cli::library::profile(&context).await,
        Commands::Playlists => cli::library::playlists(&context).await,
        Commands::PlaylistTracks { playlist } => {
            cli::library::playlist_tracks(&context, &playlist).await
        }
        Commands::Recent { limit } => cli::library::recent(&context, limit).await,
        Commands::Artists => cli::library::artists(&context).await,
        Commands::TopTracks { artist, market } => {
            cli::catalog::top_tracks(&context, &artist, market.as_deref()).await
        }
        Commands::Track { track } => cli::catalog::track(&context, &track).await,
        Commands::Search {
            query,
            types,
            limit,
        } => cli::catalog::search(&context, &query, &types, limit).await,
        Commands::NowPlaying => cli::player::now_playing(&context).await,
        Commands::Play {
            context: play_context,
            uris,
            offset,
            device,
        } => cli::player::play(&context, play_context, uris, offset, device).await,
        Commands::Pause => cli::player::pause(&context).await,
        Commands::Next => cli::player::next(&context).await,
        Commands::Previous => cli::player::previous(&context).await,
        Commands::Devices => cli::player::devices(&context).await,
        Commands::Transfer { device, play } => {
            cli::player::transfer(&context, &device, play).await
        }
        Commands::Config(_) => Ok(()),
    }
}

/// User-facing text for an error, preferring the typed messages
fn describe(error: &anyhow::Error) -> String {
    if let Some(api) = error.downcast_ref::<ApiError>() {
        return api.user_message();
    }
    if let Some(auth) = error.downcast_ref::<AuthError>() {
        return match auth {
            AuthError::Cancelled => "Sign-in was cancelled.".to_string(),
            AuthError::StateMismatch => {
                "The sign-in response did not match this attempt. Run `cadenza login` again."
                    .to_string()
            }
            other if other.requires_login() => {
                format!("{}. Run `cadenza login` to sign in.", other)
            }
            other => other.to_string(),
        };
    }
    format!("{:#}", error)
}
