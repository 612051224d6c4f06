// ABOUTME: Cadenza configuration library
// ABOUTME: Environment variable names, defaults, and the TOML-backed Settings type

pub mod constants;
pub mod error;
pub mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{
    ApiSettings, AuthSettings, CallbackMode, RetrySettings, SecretBackend, Settings,
    StorageSettings,
};
