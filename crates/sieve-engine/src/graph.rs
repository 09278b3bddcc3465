//! Dependency edges between analyzers and the source-binding plan.

use std::collections::HashSet;

use sieve_types::AnalyzerId;

use crate::analyzer::Callback;
use crate::error::EngineError;
use crate::registry::Registry;

/// Producer to callbacks, kept in declaration order.
///
/// Re-declaring a producer replaces its callbacks in place, so binding and
/// dispatch order do not depend on how often a dependency was re-included.
#[derive(Default, Clone)]
pub(crate) struct ProducerEdges {
    entries: Vec<(AnalyzerId, Vec<Callback>)>,
}

impl ProducerEdges {
    pub(crate) fn get(&self, producer: AnalyzerId) -> Option<&[Callback]> {
        self.entries
            .iter()
            .find(|(id, _)| *id == producer)
            .map(|(_, callbacks)| callbacks.as_slice())
    }

    /// Returns `true` when an existing edge was replaced.
    pub(crate) fn bind(&mut self, producer: AnalyzerId, callbacks: Vec<Callback>) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|(id, _)| *id == producer) {
            entry.1 = callbacks;
            return true;
        }
        self.entries.push((producer, callbacks));
        false
    }

    pub(crate) fn remove(&mut self, producer: AnalyzerId) -> Option<Vec<Callback>> {
        let position = self.entries.iter().position(|(id, _)| *id == producer)?;
        Some(self.entries.remove(position).1)
    }

    pub(crate) fn producers(&self) -> impl Iterator<Item = AnalyzerId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }
}

impl Registry {
    /// Records that `consumer` depends on `producer` under the name `name`.
    ///
    /// The last declaration of a producer wins; the consumer appears at most
    /// once among the producer's dependents.
    pub(crate) fn link(
        &mut self,
        consumer: AnalyzerId,
        producer: AnalyzerId,
        name: &str,
        callbacks: Vec<Callback>,
    ) -> Result<(), EngineError> {
        self.node(producer)?;

        let node = self.node_mut(consumer)?;
        let replaced = node.producers.bind(producer, callbacks);
        if !node.declared.iter().any(|declared| declared == name) {
            node.declared.push(name.to_string());
        }
        if replaced {
            tracing::debug!(consumer = %node.kind, producer = %name, "replaced callbacks for existing dependency");
        }

        let producer_node = self.node_mut(producer)?;
        if !producer_node.dependents.contains(&consumer) {
            producer_node.dependents.push(consumer);
        }
        Ok(())
    }

    /// Removes the edge from `producer` to `consumer` declared under `name`.
    ///
    /// Returns `false` when `name` was never declared by `consumer`.
    pub(crate) fn unlink(
        &mut self,
        consumer: AnalyzerId,
        producer: AnalyzerId,
        name: &str,
    ) -> Result<bool, EngineError> {
        let node = self.node_mut(consumer)?;
        let Some(position) = node.declared.iter().position(|declared| declared == name) else {
            return Ok(false);
        };
        node.declared.remove(position);
        node.producers.remove(producer);

        let producer_node = self.node_mut(producer)?;
        producer_node.dependents.retain(|id| *id != consumer);
        Ok(true)
    }

    /// Order in which `root` and its transitive producers get bound to a source.
    ///
    /// Producers come before their consumers, each analyzer appears once even
    /// when reachable along several paths, and a cycle is reported instead of
    /// followed.
    pub(crate) fn binding_plan(&self, root: AnalyzerId) -> Result<Vec<AnalyzerId>, EngineError> {
        let mut plan = Vec::new();
        let mut done = HashSet::new();
        let mut path = Vec::new();
        self.visit(root, &mut path, &mut done, &mut plan)?;
        Ok(plan)
    }

    fn visit(
        &self,
        id: AnalyzerId,
        path: &mut Vec<AnalyzerId>,
        done: &mut HashSet<AnalyzerId>,
        plan: &mut Vec<AnalyzerId>,
    ) -> Result<(), EngineError> {
        if done.contains(&id) {
            return Ok(());
        }
        if let Some(start) = path.iter().position(|visiting| *visiting == id) {
            let mut cycle: Vec<String> = path[start..].iter().map(|p| self.describe(*p)).collect();
            cycle.push(self.describe(id));
            return Err(EngineError::CyclicDependency { path: cycle });
        }

        let node = self.node(id)?;
        path.push(id);
        for producer in node.producers.producers() {
            self.visit(producer, path, done, plan)?;
        }
        path.pop();

        done.insert(id);
        plan.push(id);
        Ok(())
    }
}
