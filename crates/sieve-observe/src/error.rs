//! Error types for the logging sink.

use std::path::PathBuf;

/// Errors that can occur while setting up the shared logging sink.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    /// The configured log file could not be created.
    #[error("failed to open log file {}: {source}", path.display())]
    LogFile {
        /// The configured log path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The filter directive is not valid `EnvFilter` syntax.
    #[error("invalid log filter '{directive}': {reason}")]
    Filter {
        /// The rejected directive.
        directive: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A global subscriber is already installed; the existing sink is kept.
    #[error("logging sink is already initialised")]
    AlreadyInitialized,
}
