//! Error types for trace sources.

use std::path::PathBuf;

use sieve_engine::EngineError;

/// Errors that can occur while reading or replaying a trace.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The trace could not be opened or read.
    #[error("failed to read trace {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line of a JSON-lines trace is not a valid event.
    #[error("{trace}:{line}: invalid event: {source}")]
    Parse {
        trace: String,
        /// 1-based line number.
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The engine rejected the push.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
