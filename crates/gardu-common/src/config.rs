//! ---
//! gardu_section: "01-core-functionality"
//! gardu_subsection: "module"
//! gardu_type: "source"
//! gardu_scope: "code"
//! gardu_description: "Shared primitives and utilities for the dashboard runtime."
//! gardu_version: "v0.1.0"
//! gardu_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;
use url::Url;

use crate::logging::LogFormat;
use crate::time::parse_utc_offset;

fn default_key_column() -> String {
    "NAMA GARDU".to_owned()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(300)
}

fn default_utc_offset() -> String {
    "+07:00".to_owned()
}

fn default_history_limit() -> usize {
    100
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_metrics_enabled() -> bool {
    true
}

/// Primary configuration object for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub sources: SourcesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub create: CreateConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "GARDU_CONFIG";

    /// Build a configuration pointing at the given table and history endpoints,
    /// every other section left at its default.
    pub fn with_sources(table_url: impl Into<String>, history_url: impl Into<String>) -> Self {
        Self {
            sources: SourcesConfig {
                table_url: table_url.into(),
                history_url: history_url.into(),
                key_column: default_key_column(),
                request_timeout: default_request_timeout(),
            },
            cache: CacheConfig::default(),
            clock: ClockConfig::default(),
            create: CreateConfig::default(),
            history: HistoryConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }

    /// Load configuration from disk, respecting the `GARDU_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.sources.validate()?;
        if self.cache.ttl.is_zero() {
            return Err(anyhow!("cache ttl must be greater than zero seconds"));
        }
        parse_utc_offset(&self.clock.utc_offset)
            .with_context(|| "invalid [clock] utc_offset")?;
        if self.history.display_limit == 0 {
            return Err(anyhow!("history display_limit must be at least 1"));
        }
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Remote spreadsheet endpoints.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Endpoint of the gardu table.
    pub table_url: String,
    /// Endpoint of the change-history table.
    pub history_url: String,
    /// Column holding the unique identity key.
    #[serde(default = "default_key_column")]
    pub key_column: String,
    #[serde(default = "default_request_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub request_timeout: Duration,
}

impl SourcesConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, raw) in [("table_url", &self.table_url), ("history_url", &self.history_url)] {
            let url = Url::parse(raw)
                .with_context(|| format!("sources.{name} '{raw}' is not a valid url"))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(anyhow!("sources.{name} must use http or https"));
            }
        }
        if self.key_column.trim().is_empty() {
            return Err(anyhow!("sources.key_column must not be empty"));
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateConfig {
    /// Reject new rows whose identity key already exists in a fresh snapshot.
    #[serde(default)]
    pub enforce_unique_key: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_limit")]
    pub display_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            display_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a rolling log file in addition to the console layer.
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}
