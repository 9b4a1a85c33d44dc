// src/integrations/credentials.rs — Bot token resolution
//
// The token is read from a secret file (Docker/Kubernetes secret mount)
// first, then from the TELEGRAM_BOT_TOKEN environment variable.

use std::fmt;
use std::path::Path;

use crate::infra::errors::TaxResError;

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    SecretFile,
    Environment,
}

#[derive(Clone)]
pub struct BotCredentials {
    pub bot_token: String,
    pub source: TokenSource,
}

impl fmt::Debug for BotCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotCredentials")
            .field("bot_token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

impl BotCredentials {
    /// Load the token from `token_file`, falling back to the environment.
    pub fn load(token_file: &Path) -> Result<Self, TaxResError> {
        let from_file = match std::fs::read_to_string(token_file) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Cannot read token file {}: {e}", token_file.display());
                None
            }
        };
        let from_env = std::env::var(TOKEN_ENV).ok();

        let creds = Self::resolve(from_file, from_env).ok_or_else(|| TaxResError::MissingToken {
            file: token_file.display().to_string(),
            env: TOKEN_ENV,
        })?;
        tracing::info!(source = ?creds.source, "Bot token loaded");
        Ok(creds)
    }

    /// Pick the first non-blank candidate; the secret file wins.
    pub fn resolve(from_file: Option<String>, from_env: Option<String>) -> Option<Self> {
        let clean = |s: Option<String>| s.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        if let Some(bot_token) = clean(from_file) {
            return Some(Self {
                bot_token,
                source: TokenSource::SecretFile,
            });
        }
        clean(from_env).map(|bot_token| Self {
            bot_token,
            source: TokenSource::Environment,
        })
    }

    pub fn validate(&self) -> Result<(), TaxResError> {
        validate_token_format(&self.bot_token).map_err(TaxResError::InvalidToken)
    }
}

/// Validate the shape of a Telegram bot token.
pub fn validate_token_format(token: &str) -> Result<(), String> {
    // Telegram tokens look like "1234567890:ABCdefGHIjklMNOpqrsTUVwxyz"
    let Some((id, secret)) = token.split_once(':') else {
        return Err("Telegram bot tokens should contain a colon (:)".into());
    };
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err("Telegram bot tokens should start with the numeric bot id".into());
    }
    if secret.len() < 20 {
        return Err("Telegram bot token secret seems too short".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "123456789:AAEhBOweik6ad9r_QXMENQjcrGbqCr4K-ew";

    #[test]
    fn test_file_wins_over_env() {
        let c = BotCredentials::resolve(Some(format!("{TOKEN}\n")), Some("1:other".into())).unwrap();
        assert_eq!(c.bot_token, TOKEN);
        assert_eq!(c.source, TokenSource::SecretFile);
    }

    #[test]
    fn test_blank_file_falls_back_to_env() {
        let c = BotCredentials::resolve(Some("  \n".into()), Some(TOKEN.into())).unwrap();
        assert_eq!(c.source, TokenSource::Environment);
    }

    #[test]
    fn test_nothing_configured() {
        assert!(BotCredentials::resolve(None, None).is_none());
        assert!(BotCredentials::resolve(None, Some(String::new())).is_none());
    }

    #[test]
    fn test_load_from_secret_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telegram_bot_token");
        std::fs::write(&path, TOKEN).unwrap();
        let c = BotCredentials::load(&path).unwrap();
        assert_eq!(c.bot_token, TOKEN);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let c = BotCredentials::resolve(Some(TOKEN.into()), None).unwrap();
        assert!(!format!("{c:?}").contains("AAEh"));
    }

    #[test]
    fn test_validate_token_format() {
        assert!(validate_token_format(TOKEN).is_ok());
        assert!(validate_token_format("no-colon").is_err());
        assert!(validate_token_format("abc:AAEhBOweik6ad9r_QXMENQjcrGbqCr4K-ew").is_err());
        assert!(validate_token_format("123:short").is_err());
    }
}
