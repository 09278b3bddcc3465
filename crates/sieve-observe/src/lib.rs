//! Logging sink for the sieve analysis pipeline.
//!
//! Every analyzer writes through one shared sink. The sink is configured
//! once per process with a minimum [`Severity`] and an optional log file;
//! records are tagged with the class name of the analyzer that emitted
//! them.
//!
//! | Severity | `tracing` level | Extra field |
//! |----------|-----------------|-------------|
//! | `debug` | DEBUG | |
//! | `info` | INFO | |
//! | `warning` | WARN | |
//! | `error` | ERROR | |
//! | `critical` | ERROR | `severity = "CRITICAL"` |
//!
//! With a `critical` minimum the sink drops plain ERROR records and keeps
//! only those carrying the `severity` field.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sieve_observe::{init_logging, AnalyzerLogger, LogConfig, Severity};
//!
//! init_logging(&LogConfig {
//!     level: Severity::Debug,
//!     path: Some("sieve.log".into()),
//!     ..LogConfig::default()
//! })?;
//!
//! AnalyzerLogger::new("MsgCounter").info("counted 12 messages");
//! ```

mod error;
mod logger;
mod severity;
mod sink;

pub use error::ObserveError;
pub use logger::AnalyzerLogger;
pub use severity::{ParseSeverityError, Severity, SEVERITY_FIELD};
pub use sink::{build_subscriber, init_logging, LogConfig, TIMESTAMP_FORMAT};
