use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::errors::{AppError, AppResult};

pub mod defaults;
pub mod duration_serde;

use defaults::*;
use duration_serde::duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

/// Resolution pipeline and backoff policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Strategy used for channels without a strategy name
    #[serde(default = "default_parser")]
    pub default_parser: String,
    /// Give up reparsing once a channel has failed this many times in a row
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,
    /// Backoff per unit of cooldown multiplier
    #[serde(default = "default_cooldown_unit", with = "duration")]
    pub cooldown_unit: Duration,
    /// Ceiling for the backoff window
    #[serde(default = "default_max_cooldown", with = "duration")]
    pub max_cooldown: Duration,
    #[serde(default = "default_max_cooldown_multiplier")]
    pub max_cooldown_multiplier: u32,
    /// Upper bound for a single resolver call
    #[serde(default = "default_resolve_timeout", with = "duration")]
    pub resolve_timeout: Duration,
}

/// Outbound manifest fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_request_timeout", with = "duration")]
    pub request_timeout: Duration,
    #[serde(default = "default_connect_timeout", with = "duration")]
    pub connect_timeout: Duration,
    /// Response size ceiling in bytes
    #[serde(default = "default_max_manifest_size")]
    pub max_manifest_size: u64,
    /// Device profile used for manifest fetches
    #[serde(default = "default_device")]
    pub default_device: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Duration probing settings for the non-live fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_ffprobe_command")]
    pub ffprobe_command: String,
    #[serde(default = "default_probe_timeout", with = "duration")]
    pub probe_timeout: Duration,
}

fn default_parser() -> String {
    DEFAULT_PARSER.to_string()
}

fn default_max_retry_count() -> u32 {
    DEFAULT_MAX_RETRY_COUNT
}

fn default_cooldown_unit() -> Duration {
    DEFAULT_COOLDOWN_UNIT
}

fn default_max_cooldown() -> Duration {
    DEFAULT_MAX_COOLDOWN
}

fn default_max_cooldown_multiplier() -> u32 {
    DEFAULT_MAX_COOLDOWN_MULTIPLIER
}

fn default_resolve_timeout() -> Duration {
    DEFAULT_RESOLVE_TIMEOUT
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_max_manifest_size() -> u64 {
    DEFAULT_MAX_MANIFEST_SIZE
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_ffprobe_command() -> String {
    DEFAULT_FFPROBE_COMMAND.to_string()
}

fn default_probe_timeout() -> Duration {
    DEFAULT_PROBE_TIMEOUT
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_parser: default_parser(),
            max_retry_count: default_max_retry_count(),
            cooldown_unit: default_cooldown_unit(),
            max_cooldown: default_max_cooldown(),
            max_cooldown_multiplier: default_max_cooldown_multiplier(),
            resolve_timeout: default_resolve_timeout(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            max_manifest_size: default_max_manifest_size(),
            default_device: default_device(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_command: default_ffprobe_command(),
            probe_timeout: default_probe_timeout(),
        }
    }
}

impl ResolverConfig {
    /// Backoff window for a given cooldown multiplier, capped at `max_cooldown`
    pub fn cooldown_interval(&self, multiplier: u32) -> Duration {
        self.cooldown_unit
            .saturating_mul(multiplier)
            .min(self.max_cooldown)
    }
}

impl Config {
    /// Config file named by `CONFIG_FILE`, or `config.toml`
    pub fn default_path() -> String {
        std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string())
    }

    /// Load configuration from a TOML file, writing the defaults out if it does not exist
    pub fn load_from_file(config_file: &str) -> AppResult<Self> {
        let config = if Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file).map_err(|e| {
                AppError::configuration(format!("Failed to read {config_file}: {e}"))
            })?;
            toml::from_str(&contents).map_err(|e| {
                AppError::configuration(format!("Failed to parse {config_file}: {e}"))
            })?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)
                .map_err(|e| AppError::configuration(format!("Failed to render defaults: {e}")))?;
            std::fs::write(config_file, contents).map_err(|e| {
                AppError::configuration(format!("Failed to write {config_file}: {e}"))
            })?;
            info!("Created default config file: {}", config_file);
            default_config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.resolver.max_cooldown_multiplier == 0 {
            return Err(AppError::configuration(
                "resolver.max_cooldown_multiplier must be at least 1",
            ));
        }
        if self.resolver.cooldown_unit.is_zero() {
            return Err(AppError::configuration(
                "resolver.cooldown_unit must be greater than zero",
            ));
        }
        if self.fetch.max_manifest_size == 0 {
            return Err(AppError::configuration(
                "fetch.max_manifest_size must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_interval_is_capped() {
        let config = ResolverConfig::default();
        assert_eq!(config.cooldown_interval(1), Duration::from_secs(1));
        assert_eq!(config.cooldown_interval(64), Duration::from_secs(64));
        assert_eq!(config.cooldown_interval(128), Duration::from_secs(120));
        assert_eq!(config.cooldown_interval(1024), Duration::from_secs(120));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [resolver]
            max_retry_count = 5
            resolve_timeout = "45s"

            [fetch]
            default_device = "iphone"
            "#,
        )
        .unwrap();

        assert_eq!(config.resolver.max_retry_count, 5);
        assert_eq!(config.resolver.resolve_timeout, Duration::from_secs(45));
        assert_eq!(config.resolver.default_parser, DEFAULT_PARSER);
        assert_eq!(config.fetch.default_device, "iphone");
        assert_eq!(config.fetch.max_manifest_size, DEFAULT_MAX_MANIFEST_SIZE);
        assert_eq!(config.probe.ffprobe_command, DEFAULT_FFPROBE_COMMAND);
    }

    #[test]
    fn test_load_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let config = Config::load_from_file(path_str).unwrap();
        assert!(path.exists());
        assert_eq!(config.resolver.max_retry_count, DEFAULT_MAX_RETRY_COUNT);

        // The written file must load back to the same values
        let reloaded = Config::load_from_file(path_str).unwrap();
        assert_eq!(reloaded.resolver.max_cooldown, DEFAULT_MAX_COOLDOWN);
        assert_eq!(reloaded.fetch.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_default_path_honours_config_file_env() {
        std::env::set_var("CONFIG_FILE", "/etc/live-resolver/live.toml");
        assert_eq!(Config::default_path(), "/etc/live-resolver/live.toml");

        std::env::remove_var("CONFIG_FILE");
        assert_eq!(Config::default_path(), "config.toml");
    }

    #[test]
    fn test_invalid_multiplier_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[resolver]\nmax_cooldown_multiplier = 0\n").unwrap();

        let err = Config::load_from_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }
}
