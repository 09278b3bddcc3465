//! Event delivery: source pushes, producer emits, and per-analyzer receive.

use sieve_types::{AnalyzerId, Event, Origin, SourceId};

use crate::analyzer::Callback;
use crate::engine::{Context, Engine};
use crate::error::EngineError;

impl Engine {
    /// Delivers `event` from `origin` to `analyzer`.
    ///
    /// An event from the bound source runs the analyzer's source callbacks;
    /// an event from a producer runs the callbacks declared for that
    /// producer. Callbacks run in order, once each, against a snapshot taken
    /// before the first one starts. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSender`] when `origin` is neither the
    /// bound source nor a declared producer, and
    /// [`EngineError::UnknownAnalyzer`] for a stale or foreign id.
    pub fn recv(&self, analyzer: AnalyzerId, origin: Origin, event: &Event) -> Result<usize, EngineError> {
        let (kind, callbacks) = {
            let registry = self.registry.borrow();
            let node = registry.node(analyzer)?;
            let callbacks: Option<Vec<Callback>> = match origin {
                Origin::Source(source) if node.source == Some(source) => {
                    Some(node.source_callbacks.clone())
                }
                Origin::Source(_) => None,
                Origin::Producer(producer) => node.producers.get(producer).map(<[Callback]>::to_vec),
            };
            let Some(callbacks) = callbacks else {
                tracing::warn!(analyzer = %node.kind, origin = %origin, "event from unregistered sender");
                return Err(EngineError::UnknownSender {
                    analyzer: node.kind.to_string(),
                    origin,
                });
            };
            (node.kind, callbacks)
        };

        let ctx = Context::new(self, analyzer, kind);
        for callback in &callbacks {
            callback.invoke(&ctx, event);
        }
        Ok(callbacks.len())
    }

    /// Pushes `event` from `source` to every bound analyzer, in membership order.
    ///
    /// Analyzers unbound by a callback earlier in the same push are skipped.
    /// Returns the total number of callbacks run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSource`] for an id this engine never issued.
    pub fn push(&self, source: SourceId, event: &Event) -> Result<usize, EngineError> {
        let members = self.members(source)?;
        Ok(self.deliver(&members, Origin::Source(source), event))
    }

    /// Sends `event` from `producer` to each of its dependents, in declaration order.
    ///
    /// Dependents removed by a callback earlier in the same emit are skipped.
    /// Returns the total number of callbacks run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAnalyzer`] for a stale or foreign producer.
    pub fn emit(&self, producer: AnalyzerId, event: &Event) -> Result<usize, EngineError> {
        let dependents = self.dependents(producer)?;
        Ok(self.deliver(&dependents, Origin::Producer(producer), event))
    }

    fn deliver(&self, targets: &[AnalyzerId], origin: Origin, event: &Event) -> usize {
        let mut invoked = 0;
        for &target in targets {
            match self.recv(target, origin, event) {
                Ok(count) => invoked += count,
                Err(err) => {
                    tracing::debug!(analyzer = %target, origin = %origin, error = %err, "skipping analyzer unbound during dispatch");
                }
            }
        }
        invoked
    }
}
