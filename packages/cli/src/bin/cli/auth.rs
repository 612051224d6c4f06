// ABOUTME: CLI commands for Spotify authentication
// ABOUTME: Login with browser redirect or pasted code, logout, and session status

use anyhow::{bail, Context, Result};
use cadenza_auth::AuthController;
use cadenza_cli::AppContext;
use cadenza_config::CallbackMode;
use colored::*;
use inquire::Text;
use std::time::Duration;
use tracing::{debug, warn};

/// How long to wait for the attempt to publish its authorization URL
const URL_WAIT: Duration = Duration::from_secs(5);

pub async fn login(context: &AppContext, timeout: Option<u64>, force: bool) -> Result<()> {
    if !force && context.auth.is_authenticated().await {
        println!("{} Already signed in to Spotify", "✓".green().bold());
        println!("{}", "Use --force to sign in again".dimmed());
        return Ok(());
    }

    println!("{}", "🎵 Signing in to Spotify...".bold().cyan());
    println!();

    let mut attempt = {
        let auth = context.auth.clone();
        tokio::spawn(async move { auth.authenticate().await })
    };

    match wait_for_url(&context.auth).await {
        Some(url) => {
            println!("If your browser did not open, visit:");
            println!("  {}", url.underline());
            println!();
        }
        None => debug!("Authorization URL not published yet"),
    }

    match context.callback_mode {
        CallbackMode::Loopback => println!(
            "{}",
            format!(
                "Waiting for Spotify to redirect to {}",
                context.settings.auth.redirect_uri
            )
            .dimmed()
        ),
        CallbackMode::Manual => spawn_code_prompt(context.auth.clone()),
    }

    let watchdog = async move {
        match timeout {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        joined = &mut attempt => {
            joined.context("Sign-in task failed")??;
        }
        _ = watchdog => {
            warn!("Sign-in timed out, cancelling");
            context.auth.cancel_authentication().await?;
            bail!("Sign-in timed out after {}s", timeout.unwrap_or_default());
        }
        _ = tokio::signal::ctrl_c() => {
            context.auth.cancel_authentication().await?;
            bail!("Sign-in cancelled");
        }
    }

    println!("{} Signed in to Spotify", "✓".green().bold());
    match context.client.current_user().await {
        Ok(user) => println!(
            "  Welcome, {}",
            user.display_name.unwrap_or(user.id).bold()
        ),
        Err(e) => debug!("Could not fetch profile after sign-in: {}", e),
    }
    Ok(())
}

async fn wait_for_url(auth: &AuthController) -> Option<String> {
    let deadline = tokio::time::Instant::now() + URL_WAIT;
    while tokio::time::Instant::now() < deadline {
        if let Some(url) = auth.pending_authorization_url().await {
            return Some(url);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    None
}

/// Read the pasted code on a blocking thread and hand it to the pending attempt
fn spawn_code_prompt(auth: AuthController) {
    tokio::spawn(async move {
        let input = tokio::task::spawn_blocking(|| {
            Text::new("Paste the redirect URL or authorization code:").prompt()
        })
        .await;

        match input {
            Ok(Ok(input)) => {
                if let Err(e) = auth.submit_manual_code(&input).await {
                    eprintln!("{} {}", "✗".red().bold(), e);
                    let _ = auth.cancel_authentication().await;
                }
            }
            Ok(Err(e)) => {
                debug!("Code prompt ended: {}", e);
                let _ = auth.cancel_authentication().await;
            }
            Err(e) => {
                warn!("Code prompt failed: {}", e);
                let _ = auth.cancel_authentication().await;
            }
        }
    });
}

pub async fn logout(context: &AppContext) -> Result<()> {
    println!("{}", "🔓 Signing out of Spotify...".bold().cyan());
    context.auth.clear_tokens().await?;
    println!("{} Stored tokens removed", "✓".green().bold());
    Ok(())
}

pub async fn status(context: &AppContext) -> Result<()> {
    println!("{}", "🔐 Spotify Authentication Status".bold().cyan());
    println!();

    let Some(record) = context.auth.token_store().load().await? else {
        println!("  {} Not signed in", "✗".red().bold());
        println!();
        println!("Run {} to sign in.", "cadenza login".cyan());
        return Ok(());
    };

    let remaining = record.expires_in_secs();
    if remaining > 0 {
        println!(
            "  {} Access token valid for {}m {}s",
            "✓".green().bold(),
            remaining / 60,
            remaining % 60
        );
    } else {
        println!("  {} Access token expired", "⚠".yellow().bold());
    }
    println!(
        "  {} Refresh token {}",
        if record.refresh_token.is_some() {
            "✓".green().bold()
        } else {
            "✗".red().bold()
        },
        if record.refresh_token.is_some() {
            "stored"
        } else {
            "missing"
        }
    );

    if !context.auth.is_authenticated().await {
        println!();
        println!(
            "Session can no longer be refreshed. Run {} to sign in again.",
            "cadenza login".cyan()
        );
        return Ok(());
    }

    match context.client.current_user().await {
        Ok(user) => {
            println!(
                "  {} Signed in as {}",
                "✓".green().bold(),
                user.display_name.unwrap_or(user.id).bold()
            );
            if let Some(product) = user.product {
                println!("    Plan: {}", product);
            }
        }
        Err(e) => println!("  {} {}", "⚠".yellow().bold(), e.user_message()),
    }
    Ok(())
}
