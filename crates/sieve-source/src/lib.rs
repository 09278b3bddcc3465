//! Trace sources that drive a sieve engine.
//!
//! A [`TraceSource`] yields events in capture order; [`replay`] pushes each
//! one into an engine source and returns simple delivery statistics.
//!
//! ```rust,ignore
//! let mut trace = JsonlTrace::open("drive-test.jsonl")?;
//! let source = engine.add_source(trace.label());
//! engine.set_source(engine.resolve("MsgCounter", &[])?, source)?;
//! let stats = replay(&engine, source, &mut trace)?;
//! ```

mod error;
mod replay;
mod trace;

pub use error::SourceError;
pub use replay::{replay, ReplayStats};
pub use trace::{JsonlTrace, MemoryTrace, TraceSource};
