//! Driving an engine source from a trace.

use sieve_engine::Engine;
use sieve_types::SourceId;

use crate::error::SourceError;
use crate::trace::TraceSource;

/// Delivery counts for one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Events pushed into the source.
    pub events: u64,
    /// Source callbacks those pushes ran.
    pub callbacks: u64,
}

/// Pushes every event of `trace` into `source`, in order.
///
/// Stops at the first event the trace fails to produce.
///
/// # Errors
///
/// Returns the trace's read or parse error, or [`SourceError::Engine`] if
/// `source` does not belong to `engine`.
pub fn replay<T>(engine: &Engine, source: SourceId, trace: &mut T) -> Result<ReplayStats, SourceError>
where
    T: TraceSource + ?Sized,
{
    let mut stats = ReplayStats::default();
    tracing::info!(trace = %trace.label(), source = %source, "replay started");

    while let Some(event) = trace.next_event() {
        let event = event?;
        let ran = engine.push(source, &event)?;
        stats.events += 1;
        stats.callbacks += ran as u64;
    }

    tracing::info!(
        trace = %trace.label(),
        events = stats.events,
        callbacks = stats.callbacks,
        "replay finished"
    );
    Ok(stats)
}
