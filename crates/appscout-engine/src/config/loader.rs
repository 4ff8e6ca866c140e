use super::schema::AppscoutConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Search order: `./appscout.yaml`, then `~/.appscout/config.yaml`.
    /// Falls back to the built-in defaults when neither exists.
    pub async fn load_default() -> Result<AppscoutConfig, ConfigError> {
        let mut candidates = vec![PathBuf::from("./appscout.yaml")];
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".appscout").join("config.yaml"));
        }

        for path in candidates {
            if path.exists() {
                return Self::load_from(&path).await;
            }
        }

        debug!("No config file found, using defaults");
        Ok(AppscoutConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<AppscoutConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn parse(content: &str) -> Result<AppscoutConfig, ConfigError> {
        let config: AppscoutConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

impl AppscoutConfig {
    /// Rejects settings the resolver cannot honour: zero attempts, or a
    /// backoff cap below its base.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "resolver.max_attempts must be at least 1".into(),
            ));
        }
        if self.condition.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "condition.max_attempts must be at least 1".into(),
            ));
        }
        if self.resolver.backoff_cap_ms < self.resolver.backoff_base_ms {
            return Err(ConfigError::Invalid(format!(
                "resolver.backoff_cap_ms ({}) is below resolver.backoff_base_ms ({})",
                self.resolver.backoff_cap_ms, self.resolver.backoff_base_ms
            )));
        }
        Ok(())
    }
}
