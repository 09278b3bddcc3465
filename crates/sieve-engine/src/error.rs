//! Error types for the analyzer engine.

use sieve_types::{AnalyzerId, Origin, SourceId};

/// Errors that can occur while wiring or driving the analyzer graph.
///
/// Recoverable conditions (duplicate registration, excluding an undeclared
/// dependency, removing an unknown callback) are not errors: they are
/// logged and reported through return values.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Neither the builtin nor the local tier could construct the analyzer.
    #[error("unable to resolve analyzer '{name}' (builtin: {builtin}; local: {local})")]
    UnresolvedDependency {
        /// The requested analyzer class name.
        name: String,
        /// Why the builtin tier failed.
        builtin: String,
        /// Why the local tier failed.
        local: String,
    },

    /// Binding would recurse forever through a dependency cycle.
    #[error("cyclic analyzer dependency: {}", path.join(" -> "))]
    CyclicDependency {
        /// The cycle by class name, first element repeated at the end.
        path: Vec<String>,
    },

    /// An event arrived from a sender that is neither the bound source nor
    /// a declared producer of the receiving analyzer.
    #[error("analyzer '{analyzer}' received an event from unregistered sender {origin}")]
    UnknownSender {
        /// Class name of the receiving analyzer.
        analyzer: String,
        /// The rejected origin.
        origin: Origin,
    },

    /// The id does not name a live analyzer (never issued, or stale after a reset).
    #[error("unknown analyzer {0}")]
    UnknownAnalyzer(AnalyzerId),

    /// The id does not name a source of this engine.
    #[error("unknown source {0}")]
    UnknownSource(SourceId),

    /// A constructor rejected its arguments or failed to build.
    #[error("failed to construct analyzer '{kind}': {reason}")]
    Construction {
        /// The analyzer class name.
        kind: String,
        /// The constructor's explanation.
        reason: String,
    },
}

/// Failure reported by an analyzer constructor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ConstructError(pub String);

impl ConstructError {
    /// Creates a constructor failure with a free-form reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    /// Reports a constructor argument of the wrong shape.
    pub fn invalid_argument(index: usize, expected: &str) -> Self {
        Self(format!("argument {index}: expected {expected}"))
    }
}
