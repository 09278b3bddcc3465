//! The process-wide logging sink shared by every analyzer.
//!
//! [`build_subscriber`] assembles a `tracing-subscriber` registry with a
//! console layer on stderr and, when [`LogConfig::path`] is set, a second layer that
//! writes plain text (or JSON) into that file. [`init_logging`] installs the
//! result as the global default exactly once.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;
use tracing::{Metadata, Subscriber};
use tracing_subscriber::filter::{filter_fn, FilterFn};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::error::ObserveError;
use crate::severity::{Severity, SEVERITY_FIELD};

/// Timestamp format used by every layer (local time, millisecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Logging sink configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    /// Minimum severity that reaches the sink.
    #[serde(default)]
    pub level: Severity,

    /// Optional file that receives a copy of every record. Truncated on open.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Whether to output records as JSON.
    #[serde(default)]
    pub json: bool,

    /// Full `EnvFilter` directive (e.g. `"sieve_engine=debug,info"`).
    /// Overrides `level` when set.
    #[serde(default)]
    pub filter: Option<String>,
}

impl LogConfig {
    /// Builds the filter described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns `ObserveError::Filter` if `filter` is not a valid directive.
    pub fn env_filter(&self) -> Result<EnvFilter, ObserveError> {
        let directive = self
            .filter
            .clone()
            .unwrap_or_else(|| self.level.directive().to_string());
        EnvFilter::try_new(&directive).map_err(|e| ObserveError::Filter {
            directive,
            reason: e.to_string(),
        })
    }

    /// Extra filter applied when the minimum is `critical` and no explicit
    /// directive is set: plain ERROR events are dropped.
    fn critical_only(&self) -> Option<FilterFn<CriticalPredicate>> {
        (self.filter.is_none() && self.level == Severity::Critical)
            .then(|| filter_fn(is_critical as CriticalPredicate))
    }
}

type CriticalPredicate = fn(&Metadata<'_>) -> bool;

fn is_critical(meta: &Metadata<'_>) -> bool {
    meta.is_span() || meta.fields().field(SEVERITY_FIELD).is_some()
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Builds the subscriber described by `config` without installing it.
///
/// Useful for scoping a sink to a closure with
/// `tracing::subscriber::with_default`.
///
/// # Errors
///
/// Returns `ObserveError::LogFile` if the log file cannot be created or
/// `ObserveError::Filter` if the filter directive is invalid.
pub fn build_subscriber(
    config: &LogConfig,
) -> Result<impl Subscriber + Send + Sync + 'static, ObserveError> {
    let filter = config.env_filter()?;

    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()));
    layers.push(if config.json {
        console.json().boxed()
    } else {
        console.boxed()
    });

    if let Some(path) = &config.path {
        let file = File::create(path).map_err(|source| ObserveError::LogFile {
            path: path.clone(),
            source,
        })?;
        let to_file = fmt::layer()
            .with_ansi(false)
            .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
            .with_writer(Mutex::new(file));
        layers.push(if config.json {
            to_file.json().boxed()
        } else {
            to_file.boxed()
        });
    }

    Ok(tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .with(config.critical_only()))
}

/// Installs the shared sink as the global default subscriber.
///
/// # Errors
///
/// Returns `ObserveError::AlreadyInitialized` if a global subscriber is
/// already installed (the first sink stays in place), or any error from
/// [`build_subscriber`].
pub fn init_logging(config: &LogConfig) -> Result<(), ObserveError> {
    let subscriber = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| ObserveError::AlreadyInitialized)?;

    let path = config
        .path
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());
    tracing::debug!(
        level = %config.level,
        path = %path,
        json = config.json,
        "logging sink initialised"
    );
    Ok(())
}
