//! Configuration errors.

use eisv_dynamics::DynamicsError;
use eisv_governor::GovernorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Dynamics(#[from] DynamicsError),

    #[error(transparent)]
    Governor(#[from] GovernorError),

    #[error("invalid config: {0}")]
    Invalid(String),
}
