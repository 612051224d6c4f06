// ABOUTME: Error types for loading and validating Cadenza settings

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid config format: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
