//! Class-name keyed store of analyzer instances.

use std::collections::HashMap;
use std::rc::Rc;

use sieve_types::{AnalyzerId, SourceId};

use crate::analyzer::{Analyzer, Callback};
use crate::error::EngineError;
use crate::graph::ProducerEdges;

/// Everything the engine knows about one registered analyzer.
pub(crate) struct Node {
    pub(crate) kind: &'static str,
    pub(crate) instance: Rc<dyn Analyzer>,
    pub(crate) source: Option<SourceId>,
    pub(crate) source_callbacks: Vec<Callback>,
    /// Incoming edges: producer to the callbacks declared for it.
    pub(crate) producers: ProducerEdges,
    /// Outgoing edges: analyzers that declared this one as a producer.
    pub(crate) dependents: Vec<AnalyzerId>,
    /// Class names passed to `include_analyzer` and not yet excluded.
    pub(crate) declared: Vec<String>,
}

impl Node {
    fn new(instance: Rc<dyn Analyzer>) -> Self {
        Self {
            kind: instance.kind(),
            instance,
            source: None,
            source_callbacks: Vec::new(),
            producers: ProducerEdges::default(),
            dependents: Vec::new(),
            declared: Vec::new(),
        }
    }
}

/// Outcome of [`Registry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The instance was stored under a fresh id.
    Inserted(AnalyzerId),
    /// The class was already registered; the new instance was discarded.
    Duplicate(AnalyzerId),
}

impl Registration {
    /// The id of the instance that is registered under the class name.
    pub fn id(self) -> AnalyzerId {
        match self {
            Self::Inserted(id) | Self::Duplicate(id) => id,
        }
    }

    pub fn is_duplicate(self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// At most one analyzer instance per class name.
///
/// Ids carry the registry epoch. [`Registry::reset`] bumps the epoch, so
/// every id issued before the reset stops resolving instead of aliasing a
/// newer instance. A withdrawn analyzer leaves an empty slot behind; its
/// index is never reused within the epoch.
pub struct Registry {
    epoch: u32,
    names: HashMap<&'static str, u32>,
    nodes: Vec<Option<Node>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            epoch: 0,
            names: HashMap::new(),
            nodes: Vec::new(),
        }
    }

    /// Stores `instance` under its class name unless the name is taken.
    ///
    /// A duplicate is not an error: the first instance stays registered,
    /// the new one is dropped and a warning is logged.
    pub fn register(&mut self, instance: Rc<dyn Analyzer>) -> Registration {
        let kind = instance.kind();
        if let Some(&index) = self.names.get(kind) {
            tracing::warn!(analyzer = %kind, "analyzer already registered; discarding duplicate instance");
            return Registration::Duplicate(AnalyzerId::new(index, self.epoch));
        }

        let index = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        self.nodes.push(Some(Node::new(instance)));
        self.names.insert(kind, index);
        tracing::debug!(analyzer = %kind, index, epoch = self.epoch, "analyzer registered");
        Registration::Inserted(AnalyzerId::new(index, self.epoch))
    }

    /// Returns the id registered under `kind`, if any.
    pub fn lookup(&self, kind: &str) -> Option<AnalyzerId> {
        self.names
            .get(kind)
            .map(|&index| AnalyzerId::new(index, self.epoch))
    }

    /// Returns the shared instance behind `id`.
    pub fn instance(&self, id: AnalyzerId) -> Option<Rc<dyn Analyzer>> {
        self.node(id).ok().map(|node| Rc::clone(&node.instance))
    }

    /// Class names in registration order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.live().map(|node| node.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.live().next().is_none()
    }

    fn live(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().flatten()
    }

    /// Removes the analyzer behind `id` and every edge touching it.
    ///
    /// The class name becomes free again. Returns the source the analyzer
    /// was bound to so the caller can drop its membership.
    pub(crate) fn withdraw(&mut self, id: AnalyzerId) -> Result<Option<SourceId>, EngineError> {
        self.node(id)?;
        let Some(node) = self.nodes.get_mut(id.index() as usize).and_then(Option::take) else {
            return Err(EngineError::UnknownAnalyzer(id));
        };
        self.names.remove(node.kind);

        for producer in node.producers.producers() {
            if let Ok(producer_node) = self.node_mut(producer) {
                producer_node.dependents.retain(|dependent| *dependent != id);
            }
        }
        for &dependent in &node.dependents {
            if let Ok(dependent_node) = self.node_mut(dependent) {
                dependent_node.producers.remove(id);
                dependent_node.declared.retain(|declared| declared != node.kind);
            }
        }
        tracing::debug!(analyzer = %node.kind, index = id.index(), "analyzer withdrawn");
        Ok(node.source)
    }

    /// Drops every instance and invalidates all previously issued ids.
    pub fn reset(&mut self) {
        let dropped = self.nodes.len();
        self.nodes.clear();
        self.names.clear();
        self.epoch = self.epoch.wrapping_add(1);
        tracing::debug!(dropped, epoch = self.epoch, "analyzer registry reset");
    }

    pub(crate) fn node(&self, id: AnalyzerId) -> Result<&Node, EngineError> {
        if id.epoch() != self.epoch {
            return Err(EngineError::UnknownAnalyzer(id));
        }
        self.nodes
            .get(id.index() as usize)
            .and_then(Option::as_ref)
            .ok_or(EngineError::UnknownAnalyzer(id))
    }

    pub(crate) fn node_mut(&mut self, id: AnalyzerId) -> Result<&mut Node, EngineError> {
        if id.epoch() != self.epoch {
            return Err(EngineError::UnknownAnalyzer(id));
        }
        self.nodes
            .get_mut(id.index() as usize)
            .and_then(Option::as_mut)
            .ok_or(EngineError::UnknownAnalyzer(id))
    }

    /// Class name behind `id`, or the id itself rendered when it is stale.
    pub(crate) fn describe(&self, id: AnalyzerId) -> String {
        self.node(id)
            .map_or_else(|_| id.to_string(), |node| node.kind.to_string())
    }
}
