// ABOUTME: Tracing subscriber setup for the cadenza binary
// ABOUTME: Filter from CADENZA_LOG, then RUST_LOG, then a verbosity default; output goes to stderr

use cadenza_config::constants::{CADENZA_LOG, RUST_LOG};
use tracing_subscriber::EnvFilter;

/// Filter directive from a variable lookup (normally the process environment)
pub fn filter_directive<F>(verbose: bool, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |directive: &String| !directive.trim().is_empty();
    lookup(CADENZA_LOG)
        .filter(non_blank)
        .or_else(|| lookup(RUST_LOG).filter(non_blank))
        .unwrap_or_else(|| if verbose { "info" } else { "warn" }.to_string())
}

pub fn init(verbose: bool) {
    let directive = filter_directive(verbose, |name| std::env::var(name).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadenza_log_wins() {
        let directive = filter_directive(false, |name| match name {
            CADENZA_LOG => Some("cadenza_auth=debug".to_string()),
            RUST_LOG => Some("trace".to_string()),
            _ => None,
        });
        assert_eq!(directive, "cadenza_auth=debug");
    }

    #[test]
    fn test_rust_log_fallback() {
        let directive = filter_directive(false, |name| {
            (name == RUST_LOG).then(|| "debug".to_string())
        });
        assert_eq!(directive, "debug");
    }

    #[test]
    fn test_verbosity_default() {
        assert_eq!(filter_directive(false, |_| None), "warn");
        assert_eq!(filter_directive(true, |_| None), "info");
        assert_eq!(filter_directive(true, |_| Some("  ".to_string())), "info");
    }
}
