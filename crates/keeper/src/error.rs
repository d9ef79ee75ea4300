//! Error types for the keeper

use floorlend_core::FloorLendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] FloorLendError),
}

pub type KeeperResult<T> = Result<T, KeeperError>;
