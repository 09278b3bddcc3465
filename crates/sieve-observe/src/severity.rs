//! Severity levels for analyzer log messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

/// Field that marks a record as critical; its value is always `"CRITICAL"`.
pub const SEVERITY_FIELD: &str = "severity";

/// The five analyzer log severities, lowest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic detail.
    Debug,
    /// Normal progress messages.
    #[default]
    Info,
    /// Something unexpected that the pipeline absorbed.
    #[serde(alias = "warn")]
    Warning,
    /// A failure the pipeline cannot absorb locally.
    Error,
    /// A failure that ends the run.
    Critical,
}

impl Severity {
    /// Returns the canonical lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Returns the `tracing` level filter that admits this severity.
    ///
    /// `tracing` has no level above ERROR, so `Critical` maps to ERROR here.
    /// The sink narrows it further to records carrying [`SEVERITY_FIELD`].
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }

    /// Returns the `EnvFilter` directive equivalent to [`Self::level_filter`].
    pub fn directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown severity label.
#[derive(Debug, Clone, Error)]
#[error("unknown severity: {0}")]
pub struct ParseSeverityError(pub String);
