//! Per-analyzer log handle.

use std::fmt::Display;

use crate::severity::Severity;

/// Writes log records tagged with the emitting analyzer's class name.
///
/// All loggers feed the same process-wide sink; the handle only carries
/// the tag, so it is `Copy` and free to create per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerLogger {
    kind: &'static str,
}

impl AnalyzerLogger {
    /// Creates a logger for the analyzer class `kind`.
    pub fn new(kind: &'static str) -> Self {
        Self { kind }
    }

    /// Returns the class name records are tagged with.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn debug(&self, message: impl Display) {
        tracing::debug!(analyzer = %self.kind, "{message}");
    }

    pub fn info(&self, message: impl Display) {
        tracing::info!(analyzer = %self.kind, "{message}");
    }

    pub fn warning(&self, message: impl Display) {
        tracing::warn!(analyzer = %self.kind, "{message}");
    }

    pub fn error(&self, message: impl Display) {
        tracing::error!(analyzer = %self.kind, "{message}");
    }

    /// Logs at ERROR level with `severity = "CRITICAL"` attached.
    ///
    /// The field name must match [`crate::SEVERITY_FIELD`]; the sink keys
    /// its critical-only filter on it.
    pub fn critical(&self, message: impl Display) {
        tracing::error!(analyzer = %self.kind, severity = "CRITICAL", "{message}");
    }

    /// Logs at a severity chosen at runtime.
    pub fn log(&self, severity: Severity, message: impl Display) {
        match severity {
            Severity::Debug => self.debug(message),
            Severity::Info => self.info(message),
            Severity::Warning => self.warning(message),
            Severity::Error => self.error(message),
            Severity::Critical => self.critical(message),
        }
    }
}
