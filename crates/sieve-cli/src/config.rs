//! Run configuration loading from file and environment variables.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;
use sieve_observe::{LogConfig, Severity};
use thiserror::Error;

/// Top-level run configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging sink settings.
    #[serde(default)]
    pub logging: LogConfig,

    /// Where events come from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Analyzers to resolve and bind to the source, in order.
    #[serde(default)]
    pub analyzers: Vec<AnalyzerConfig>,

    /// Environment overrides that could not be applied. Loading runs before
    /// the logging sink exists, so the caller logs these afterwards.
    #[serde(skip)]
    pub rejected_overrides: Vec<RejectedOverride>,
}

/// An environment variable whose value was ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedOverride {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// The event source driving the run.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Label attached to the engine source.
    #[serde(default = "default_source_label")]
    pub label: String,

    /// JSON-lines trace to replay. Without one, analyzers are wired but
    /// receive no events.
    #[serde(default)]
    pub trace: Option<PathBuf>,
}

/// One analyzer to enable.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Class name, e.g. `"MsgCounter"`.
    pub name: String,

    /// Constructor arguments, used only if the analyzer is not yet registered.
    #[serde(default)]
    pub args: Vec<Value>,
}

fn default_source_label() -> String {
    "trace".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            label: default_source_label(),
            trace: None,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `SIEVE_LOG_LEVEL` overrides `logging.level`
/// - `SIEVE_LOG_PATH` overrides `logging.path`
/// - `SIEVE_LOG_JSON` overrides `logging.json` (set to "true" or "1" to enable)
/// - `SIEVE_TRACE_PATH` overrides `source.trace`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies `SIEVE_*` overrides read through `lookup`.
///
/// An unparseable `SIEVE_LOG_LEVEL` is ignored and recorded in
/// [`Config::rejected_overrides`].
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(level) = lookup("SIEVE_LOG_LEVEL") {
        match level.parse::<Severity>() {
            Ok(parsed) => config.logging.level = parsed,
            Err(err) => config.rejected_overrides.push(RejectedOverride {
                var: "SIEVE_LOG_LEVEL",
                reason: err.to_string(),
                value: level,
            }),
        }
    }
    if let Some(path) = lookup("SIEVE_LOG_PATH") {
        config.logging.path = Some(PathBuf::from(path));
    }
    if let Some(json) = lookup("SIEVE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(trace) = lookup("SIEVE_TRACE_PATH") {
        config.source.trace = Some(PathBuf::from(trace));
    }
}
