//! Composition root for the `sieve` binary.
//!
//! [`run`] wires the configured analyzers to one source, replays the
//! configured trace through it and writes one JSON line per analyzer
//! report. Logging is set up by the caller.

pub mod config;

use std::io::Write;

use serde_json::json;
use sieve_engine::{Engine, EngineError};
use sieve_observe::ObserveError;
use sieve_source::{replay, JsonlTrace, ReplayStats, SourceError};
use sieve_types::AnalyzerId;
use thiserror::Error;

pub use config::{
    apply_overrides, load_config, AnalyzerConfig, Config, ConfigError, RejectedOverride, SourceConfig,
};

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialise logging: {0}")]
    Logging(#[from] ObserveError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

/// Resolves and binds every configured analyzer, then replays the trace.
///
/// Reports go to `out` in configuration order, one JSON object per line:
/// `{"analyzer": "<class>", "report": {...}}`. Analyzers without a report
/// are skipped. Returns the replay statistics, or `None` when no trace is
/// configured.
///
/// # Errors
///
/// Returns the first engine, trace or output error. How unresolvable
/// analyzer names are handled depends on the engine's failure policy.
pub fn run<W: Write>(config: &Config, engine: &Engine, out: &mut W) -> Result<Option<ReplayStats>, CliError> {
    let source = engine.add_source(&config.source.label);

    let mut enabled: Vec<AnalyzerId> = Vec::with_capacity(config.analyzers.len());
    for analyzer in &config.analyzers {
        let id = engine.resolve(&analyzer.name, &analyzer.args)?;
        engine.set_source(id, source)?;
        if !enabled.contains(&id) {
            enabled.push(id);
        }
        tracing::info!(analyzer = %analyzer.name, source = %source, "analyzer enabled");
    }

    let stats = match &config.source.trace {
        Some(path) => {
            let mut trace = JsonlTrace::open(path)?;
            Some(replay(engine, source, &mut trace)?)
        }
        None => {
            tracing::warn!("no trace configured; nothing to replay");
            None
        }
    };

    for id in enabled {
        let Some(report) = engine.analyzer(id).and_then(|analyzer| analyzer.report()) else {
            continue;
        };
        let line = json!({ "analyzer": engine.kind_of(id)?, "report": report });
        writeln!(out, "{line}")?;
    }
    out.flush()?;

    Ok(stats)
}
