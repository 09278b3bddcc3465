//! Sources and the analyzers bound to them.

use sieve_types::{AnalyzerId, SourceId};

use crate::engine::Engine;
use crate::error::EngineError;

struct SourceEntry {
    label: String,
    members: Vec<AnalyzerId>,
}

/// Membership lists of every source, in registration order.
#[derive(Default)]
pub(crate) struct SourceTable {
    sources: Vec<SourceEntry>,
}

impl SourceTable {
    pub(crate) fn add(&mut self, label: &str) -> SourceId {
        let id = SourceId(u32::try_from(self.sources.len()).unwrap_or(u32::MAX));
        self.sources.push(SourceEntry {
            label: label.to_string(),
            members: Vec::new(),
        });
        id
    }

    fn entry(&self, id: SourceId) -> Result<&SourceEntry, EngineError> {
        self.sources
            .get(id.0 as usize)
            .ok_or(EngineError::UnknownSource(id))
    }

    fn entry_mut(&mut self, id: SourceId) -> Result<&mut SourceEntry, EngineError> {
        self.sources
            .get_mut(id.0 as usize)
            .ok_or(EngineError::UnknownSource(id))
    }

    pub(crate) fn label(&self, id: SourceId) -> Result<&str, EngineError> {
        self.entry(id).map(|entry| entry.label.as_str())
    }

    pub(crate) fn members(&self, id: SourceId) -> Result<Vec<AnalyzerId>, EngineError> {
        self.entry(id).map(|entry| entry.members.clone())
    }

    pub(crate) fn register(&mut self, id: SourceId, analyzer: AnalyzerId) -> Result<(), EngineError> {
        let entry = self.entry_mut(id)?;
        if !entry.members.contains(&analyzer) {
            entry.members.push(analyzer);
        }
        Ok(())
    }

    pub(crate) fn deregister(&mut self, id: SourceId, analyzer: AnalyzerId) -> Result<bool, EngineError> {
        let entry = self.entry_mut(id)?;
        let before = entry.members.len();
        entry.members.retain(|member| *member != analyzer);
        Ok(entry.members.len() != before)
    }

    pub(crate) fn clear_members(&mut self) {
        for entry in &mut self.sources {
            entry.members.clear();
        }
    }
}

impl Engine {
    /// Creates a new source with a human-readable label.
    pub fn add_source(&self, label: &str) -> SourceId {
        let id = self.sources.borrow_mut().add(label);
        tracing::debug!(source = %id, label, "source added");
        id
    }

    /// Returns the label given to `source` at creation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSource`] for an id this engine never issued.
    pub fn source_label(&self, source: SourceId) -> Result<String, EngineError> {
        self.sources.borrow().label(source).map(str::to_string)
    }

    /// Analyzers that receive events pushed by `source`, in delivery order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSource`] for an id this engine never issued.
    pub fn members(&self, source: SourceId) -> Result<Vec<AnalyzerId>, EngineError> {
        self.sources.borrow().members(source)
    }

    /// The source `analyzer` is currently bound to.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAnalyzer`] for a stale or foreign id.
    pub fn source_of(&self, analyzer: AnalyzerId) -> Result<Option<SourceId>, EngineError> {
        Ok(self.registry.borrow().node(analyzer)?.source)
    }

    /// Binds `analyzer` and, transitively, every producer it depends on to `source`.
    ///
    /// Producers are bound before their consumers, so on each pushed event a
    /// producer's source callbacks run before those of anything consuming
    /// it. An analyzer that was bound elsewhere is moved: it leaves the old
    /// source's membership and is appended to the end of the new one.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CyclicDependency`] without binding anything
    /// when the producers of `analyzer` form a cycle, and
    /// [`EngineError::UnknownSource`] / [`EngineError::UnknownAnalyzer`] for
    /// ids that do not resolve.
    pub fn set_source(&self, analyzer: AnalyzerId, source: SourceId) -> Result<(), EngineError> {
        self.sources.borrow().label(source)?;
        let plan = self.registry.borrow().binding_plan(analyzer)?;

        let mut registry = self.registry.borrow_mut();
        let mut sources = self.sources.borrow_mut();
        for id in plan {
            let node = registry.node_mut(id)?;
            if let Some(previous) = node.source.take() {
                sources.deregister(previous, id)?;
            }
            sources.register(source, id)?;
            node.source = Some(source);
            tracing::debug!(analyzer = %node.kind, source = %source, "analyzer bound to source");
        }
        Ok(())
    }

    /// Unbinds `analyzer` from its source, leaving its producers bound.
    ///
    /// Returns the source it was bound to, if any.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAnalyzer`] for a stale or foreign id.
    pub fn detach_source(&self, analyzer: AnalyzerId) -> Result<Option<SourceId>, EngineError> {
        let mut registry = self.registry.borrow_mut();
        let node = registry.node_mut(analyzer)?;
        let Some(previous) = node.source.take() else {
            return Ok(None);
        };
        self.sources.borrow_mut().deregister(previous, analyzer)?;
        tracing::debug!(analyzer = %node.kind, source = %previous, "analyzer detached from source");
        Ok(Some(previous))
    }
}
