// ABOUTME: Library half of the cadenza binary
// ABOUTME: Application context wiring, logging setup and table output shared by the commands

pub mod context;
pub mod logging;
pub mod output;

pub use context::{client_config, AppContext, ContextOptions, NoBrowser};
