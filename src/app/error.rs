use thiserror::Error;

use crate::channel::ChannelError;
use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Clipboard read access denied: {0}")]
    ClipboardDenied(String),

    #[error("Clipboard error: {0}")]
    Channel(ChannelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unsupported page: {0}")]
    InvalidUrl(String),

    #[error("A harvest is already running")]
    AlreadyRunning,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<ChannelError> for HarvestError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Denied(msg) => HarvestError::ClipboardDenied(msg),
            other => HarvestError::Channel(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
