use thiserror::Error;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Channel value outside `email|slack|webhook|push`
    #[error("Unknown channel: {0}")]
    InvalidChannel(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),
}

impl HubError {
    /// Short machine-readable code, used in structured log fields
    pub fn code(&self) -> &'static str {
        match self {
            HubError::Config(_) => "CONFIG_ERROR",
            HubError::Store(_) => "STORAGE_ERROR",
            HubError::InvalidChannel(_) => "INVALID_CHANNEL",
            HubError::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
        }
    }
}

pub type Result<T> = std::result::Result<T, HubError>;
