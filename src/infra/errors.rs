// src/infra/errors.rs — Error types for taxres

use thiserror::Error;

use crate::core::date::DateError;

#[derive(Error, Debug)]
pub enum TaxResError {
    // Startup
    #[error("Telegram bot token not found. Put it in {file} or set {env}.")]
    MissingToken { file: String, env: &'static str },

    #[error("Invalid bot token: {0}")]
    InvalidToken(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // User input (CLI)
    #[error("Invalid periods file: {0}")]
    Upload(#[from] serde_json::Error),

    #[error(transparent)]
    Date(#[from] DateError),

    // Infra
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaxResError {
    /// Errors that stop the bot from starting at all.
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(
            self,
            TaxResError::MissingToken { .. } | TaxResError::InvalidToken(_) | TaxResError::Config(_)
        )
    }
}
