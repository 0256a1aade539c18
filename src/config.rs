use crate::error::NotifyError;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(name = "toast-notify", version, about)]
pub struct Cli {
    /// Path to configuration file
    #[clap(long, default_value = "./config.toml")]
    pub config: PathBuf,

    /// Fail fast on error-level reports
    #[clap(long)]
    pub fail_fast: bool,

    /// Override log level (trace, debug, info, warn, error)
    #[clap(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub throttle_window_ms: u64,
    pub sweep_interval_ms: u64,
    pub fail_fast_on_error: bool,
    pub default_timeout_ms: u64,
    pub container_id: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            throttle_window_ms: 3000,
            sweep_interval_ms: 10_000,
            fail_fast_on_error: false,
            default_timeout_ms: 5000,
            container_id: "toast-wrapper".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_window_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn validate(&self) -> Result<(), NotifyError> {
        if self.throttle_window_ms == 0 {
            return Err(NotifyError::Config(
                "throttle_window_ms must be positive".to_string(),
            ));
        }
        if self.sweep_interval_ms == 0 {
            return Err(NotifyError::Config(
                "sweep_interval_ms must be positive".to_string(),
            ));
        }
        if self.default_timeout_ms == 0 {
            return Err(NotifyError::Config(
                "default_timeout_ms must be positive".to_string(),
            ));
        }
        if i64::try_from(self.default_timeout_ms).is_err() {
            return Err(NotifyError::Config(format!(
                "default_timeout_ms must not exceed {}",
                i64::MAX
            )));
        }
        if self.container_id.trim().is_empty() {
            return Err(NotifyError::Config("container_id must not be empty".to_string()));
        }
        Ok(())
    }
}

pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if cli.config.exists() {
        let config_content = fs::read_to_string(&cli.config)
            .with_context(|| format!("Failed to read config file: {:?}", cli.config))?;

        toml::from_str(&config_content).context("Failed to parse config file")?
    } else {
        Config::default()
    };

    // Apply CLI overrides
    if cli.fail_fast {
        config.fail_fast_on_error = true;
    }

    if let Some(ref log_level) = cli.log_level {
        config.log_level = log_level.clone();
    }

    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str("fail_fast_on_error = true").unwrap();
        assert!(config.fail_fast_on_error);
        assert_eq!(config.throttle_window_ms, 3000);
        assert_eq!(config.sweep_interval_ms, 10_000);
        assert_eq!(config.default_timeout_ms, 5000);
        assert_eq!(config.container_id, "toast-wrapper");
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = Config {
            throttle_window_ms: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(NotifyError::Config(_))));
    }

    #[test]
    fn oversized_timeout_is_rejected() {
        let config = Config {
            default_timeout_ms: u64::MAX,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(NotifyError::Config(_))));

        let config = Config {
            default_timeout_ms: i64::MAX as u64,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults_with_overrides() {
        let cli = Cli {
            config: PathBuf::from("/nonexistent/toast-notify.toml"),
            fail_fast: true,
            log_level: Some("debug".to_string()),
        };
        let config = load_config(&cli).unwrap();
        assert!(config.fail_fast_on_error);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.throttle_window(), Duration::from_secs(3));
    }
}
