// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::errors::TaxResError;
use crate::infra::paths;
use crate::integrations::telegram::TELEGRAM_API_BASE;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the per-user directories. Defaults to `<data dir>/users`.
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Long-poll wait per getUpdates call.
    pub poll_timeout_secs: u64,
    /// Pause after a failed poll before trying again.
    pub retry_delay_secs: u64,
    /// Secret file checked before TELEGRAM_BOT_TOKEN.
    pub token_file: String,
    /// Uploaded documents above this size are refused without downloading.
    pub max_upload_bytes: u64,
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            poll_timeout_secs: 30,
            retry_delay_secs: 5,
            token_file: "/run/secrets/telegram_bot_token".into(),
            max_upload_bytes: 1024 * 1024,
            api_base: TELEGRAM_API_BASE.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| TaxResError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TaxResError> {
        if self.telegram.retry_delay_secs == 0 {
            return Err(TaxResError::Config(
                "telegram.retry_delay_secs must be at least 1".into(),
            ));
        }
        if self.telegram.max_upload_bytes == 0 {
            return Err(TaxResError::Config(
                "telegram.max_upload_bytes must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(paths::users_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.telegram.poll_timeout_secs, 30);
        assert_eq!(c.telegram.retry_delay_secs, 5);
        assert_eq!(c.telegram.token_file, "/run/secrets/telegram_bot_token");
        assert_eq!(c.telegram.max_upload_bytes, 1_048_576);
        assert_eq!(c.logging.level, "info");
        assert!(c.storage.data_dir.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let c: Config = toml::from_str(
            r#"
            [storage]
            data_dir = "/var/lib/taxres"

            [telegram]
            poll_timeout_secs = 50
            "#,
        )
        .unwrap();
        assert_eq!(c.data_dir(), PathBuf::from("/var/lib/taxres"));
        assert_eq!(c.telegram.poll_timeout_secs, 50);
        assert_eq!(c.telegram.retry_delay_secs, 5);
        assert_eq!(c.logging.level, "info");
    }

    #[test]
    fn test_load_from_rejects_zero_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[telegram]\nretry_delay_secs = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[telegram\npoll_timeout_secs = ").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        let err = err.downcast_ref::<TaxResError>().unwrap();
        assert!(err.is_fatal_at_startup());
    }

    #[test]
    fn test_round_trip_toml() {
        let c = Config::default();
        let text = toml::to_string(&c).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.telegram.token_file, c.telegram.token_file);
    }
}
