// ABOUTME: Opening the authorization URL outside the process
// ABOUTME: The system browser by default; swappable so callers can print or record the URL

use tracing::debug;

use crate::error::{AuthError, AuthResult};

pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> AuthResult<()>;
}

/// Opens URLs with the platform's default handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl UrlOpener for SystemBrowser {
    fn open(&self, url: &str) -> AuthResult<()> {
        debug!("Opening authorization URL in system browser");
        open::that(url).map_err(|e| AuthError::BrowserOpen(e.to_string()))
    }
}
