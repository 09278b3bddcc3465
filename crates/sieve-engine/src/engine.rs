//! The engine: registry, sources and factory behind one handle.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use sieve_observe::AnalyzerLogger;
use sieve_types::{AnalyzerId, Event};

use crate::analyzer::{Analyzer, AsAny, Callback};
use crate::binding::SourceTable;
use crate::error::EngineError;
use crate::factory::Factory;
use crate::registry::{Registration, Registry};

/// What the engine does when a dependency cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure with a backtrace and terminate the process with status 1.
    #[default]
    Exit,
    /// Return [`EngineError::UnresolvedDependency`] to the caller.
    Propagate,
}

/// Owns every analyzer of one analysis run and routes events between them.
///
/// All operations take `&self`. No internal borrow is held while analyzer
/// code runs, so callbacks and `setup` may call back into the engine:
/// include dependencies, emit, add or remove callbacks.
pub struct Engine {
    pub(crate) registry: RefCell<Registry>,
    pub(crate) sources: RefCell<SourceTable>,
    factory: Factory,
    policy: FailurePolicy,
    /// Nesting depth of in-flight `resolve` calls.
    resolving: Cell<usize>,
}

impl Engine {
    /// Creates an engine that exits on unresolved dependencies.
    pub fn new(factory: Factory) -> Self {
        Self::with_policy(factory, FailurePolicy::default())
    }

    pub fn with_policy(factory: Factory, policy: FailurePolicy) -> Self {
        Self {
            registry: RefCell::new(Registry::new()),
            sources: RefCell::new(SourceTable::default()),
            factory,
            policy,
            resolving: Cell::new(0),
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    // ── Registry ─────────────────────────────────────────────────────

    /// Registers `analyzer` and runs its `setup`.
    ///
    /// If the class is already registered the new instance is discarded
    /// and the existing id is returned.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the analyzer's `setup`. The
    /// registration is withdrawn in that case, together with any edges and
    /// source membership `setup` created, so the class name stays free.
    pub fn install<A: Analyzer>(&self, analyzer: A) -> Result<AnalyzerId, EngineError> {
        self.install_shared(Rc::new(analyzer))
    }

    /// [`install`](Self::install) for an instance that is already shared.
    pub fn install_shared(&self, instance: Rc<dyn Analyzer>) -> Result<AnalyzerId, EngineError> {
        let registration = self.registry.borrow_mut().register(Rc::clone(&instance));
        let id = match registration {
            Registration::Duplicate(existing) => return Ok(existing),
            Registration::Inserted(id) => id,
        };

        let kind = instance.kind();
        let ctx = Context::new(self, id, kind);
        if let Err(err) = instance.setup(&ctx) {
            self.withdraw(id);
            tracing::warn!(analyzer = %kind, error = %err, "analyzer setup failed; registration withdrawn");
            return Err(err);
        }
        tracing::info!(analyzer = %kind, id = %id, "analyzer installed");
        Ok(id)
    }

    fn withdraw(&self, id: AnalyzerId) {
        let Ok(source) = self.registry.borrow_mut().withdraw(id) else {
            return;
        };
        if let Some(source) = source {
            let _ = self.sources.borrow_mut().deregister(source, id);
        }
    }

    /// Registers `instance` without running its `setup`.
    pub fn register(&self, instance: Rc<dyn Analyzer>) -> Registration {
        self.registry.borrow_mut().register(instance)
    }

    /// Returns the id of the analyzer registered under `kind`.
    pub fn lookup(&self, kind: &str) -> Option<AnalyzerId> {
        self.registry.borrow().lookup(kind)
    }

    /// Returns the shared instance behind `id`.
    pub fn analyzer(&self, id: AnalyzerId) -> Option<Rc<dyn Analyzer>> {
        self.registry.borrow().instance(id)
    }

    /// Returns the instance behind `id` as its concrete type.
    pub fn analyzer_as<T: Analyzer>(&self, id: AnalyzerId) -> Option<Rc<T>> {
        downcast(self.analyzer(id)?)
    }

    /// Class name of the analyzer behind `id`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAnalyzer`] for a stale or foreign id.
    pub fn kind_of(&self, id: AnalyzerId) -> Result<&'static str, EngineError> {
        Ok(self.registry.borrow().node(id)?.kind)
    }

    /// Number of registered analyzers.
    pub fn len(&self) -> usize {
        self.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.borrow().is_empty()
    }

    /// Class names of all registered analyzers, in registration order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.registry.borrow().kinds()
    }

    /// Drops every analyzer and every source membership.
    ///
    /// Sources themselves survive; ids issued before the reset stop resolving.
    pub fn reset(&self) {
        self.registry.borrow_mut().reset();
        self.sources.borrow_mut().clear_members();
    }

    // ── Dependencies ─────────────────────────────────────────────────

    /// Returns the analyzer registered as `name`, constructing it if needed.
    ///
    /// `args` only reach the constructor; a registered instance is returned
    /// as is.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Propagate`], returns
    /// [`EngineError::UnresolvedDependency`] when no tier can build `name`.
    /// Under [`FailurePolicy::Exit`] that failure terminates the process.
    pub fn resolve(&self, name: &str, args: &[Value]) -> Result<AnalyzerId, EngineError> {
        if let Some(id) = self.lookup(name) {
            return Ok(id);
        }
        self.resolving.set(self.resolving.get() + 1);
        let result = self.factory.construct(self, name, args);
        self.resolving.set(self.resolving.get() - 1);
        result.or_else(|err| self.unresolved(err))
    }

    fn unresolved(&self, err: EngineError) -> Result<AnalyzerId, EngineError> {
        match self.policy {
            // Nested failures surface again in the enclosing tier's reason.
            FailurePolicy::Propagate if self.resolving.get() > 0 => {
                tracing::debug!(error = %err, "nested analyzer dependency unresolved");
                Err(err)
            }
            FailurePolicy::Propagate => {
                tracing::error!(error = %err, "analyzer dependency unresolved");
                Err(err)
            }
            FailurePolicy::Exit => {
                let backtrace = Backtrace::force_capture();
                tracing::error!(error = %err, "analyzer dependency unresolved; exiting\n{backtrace}");
                std::process::exit(1)
            }
        }
    }

    /// Declares that `consumer` depends on the analyzer class `name`.
    ///
    /// `name` is resolved (and constructed with `args` if absent), then
    /// every event it emits reaches `consumer` through `callbacks`, in
    /// order. Declaring the same producer again replaces its callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAnalyzer`] for a stale `consumer`, and
    /// resolution failures as described on [`resolve`](Self::resolve).
    pub fn include_analyzer(
        &self,
        consumer: AnalyzerId,
        name: &str,
        callbacks: Vec<Callback>,
        args: &[Value],
    ) -> Result<AnalyzerId, EngineError> {
        let consumer_kind = self.kind_of(consumer)?;
        let producer = self.resolve(name, args)?;
        self.registry
            .borrow_mut()
            .link(consumer, producer, name, callbacks)?;
        tracing::debug!(consumer = %consumer_kind, producer = %name, "dependency declared");
        Ok(producer)
    }

    /// Withdraws a dependency declared by `consumer`.
    ///
    /// Returns `false`, and changes nothing, when `name` is not registered
    /// or was never declared by `consumer`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAnalyzer`] for a stale `consumer`.
    pub fn exclude_analyzer(&self, consumer: AnalyzerId, name: &str) -> Result<bool, EngineError> {
        let consumer_kind = self.kind_of(consumer)?;
        let Some(producer) = self.lookup(name) else {
            tracing::debug!(consumer = %consumer_kind, producer = %name, "exclude ignored: analyzer not registered");
            return Ok(false);
        };

        let removed = self.registry.borrow_mut().unlink(consumer, producer, name)?;
        if removed {
            tracing::debug!(consumer = %consumer_kind, producer = %name, "dependency withdrawn");
        } else {
            tracing::debug!(consumer = %consumer_kind, producer = %name, "exclude ignored: not a declared dependency");
        }
        Ok(removed)
    }

    /// Returns the instance `consumer` declared as a dependency under `name`.
    ///
    /// Analyzers that are registered but not declared by `consumer` are not
    /// visible through this call.
    pub fn get_analyzer(&self, consumer: AnalyzerId, name: &str) -> Option<Rc<dyn Analyzer>> {
        let registry = self.registry.borrow();
        let node = registry.node(consumer).ok()?;
        if !node.declared.iter().any(|declared| declared == name) {
            return None;
        }
        registry.instance(registry.lookup(name)?)
    }

    /// [`get_analyzer`](Self::get_analyzer) downcast to the concrete type.
    pub fn get_analyzer_as<T: Analyzer>(&self, consumer: AnalyzerId, name: &str) -> Option<Rc<T>> {
        downcast(self.get_analyzer(consumer, name)?)
    }

    /// Class names `analyzer` has declared as dependencies, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAnalyzer`] for a stale or foreign id.
    pub fn dependencies(&self, analyzer: AnalyzerId) -> Result<Vec<String>, EngineError> {
        Ok(self.registry.borrow().node(analyzer)?.declared.clone())
    }

    /// Analyzers that receive what `analyzer` emits, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAnalyzer`] for a stale or foreign id.
    pub fn dependents(&self, analyzer: AnalyzerId) -> Result<Vec<AnalyzerId>, EngineError> {
        Ok(self.registry.borrow().node(analyzer)?.dependents.clone())
    }

    // ── Source callbacks ─────────────────────────────────────────────

    /// Adds `callback` to the ones run for events from `analyzer`'s source.
    ///
    /// Returns `false` if the same callback is already present.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAnalyzer`] for a stale or foreign id.
    pub fn add_source_callback(&self, analyzer: AnalyzerId, callback: Callback) -> Result<bool, EngineError> {
        let mut registry = self.registry.borrow_mut();
        let node = registry.node_mut(analyzer)?;
        if node.source_callbacks.contains(&callback) {
            return Ok(false);
        }
        node.source_callbacks.push(callback);
        Ok(true)
    }

    /// Removes `callback` from `analyzer`'s source callbacks.
    ///
    /// Returns `false` if it was not present. Dispatches already in
    /// progress still run it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownAnalyzer`] for a stale or foreign id.
    pub fn remove_source_callback(&self, analyzer: AnalyzerId, callback: &Callback) -> Result<bool, EngineError> {
        let mut registry = self.registry.borrow_mut();
        let node = registry.node_mut(analyzer)?;
        let before = node.source_callbacks.len();
        node.source_callbacks.retain(|existing| existing != callback);
        Ok(node.source_callbacks.len() != before)
    }
}

fn downcast<T: Analyzer>(instance: Rc<dyn Analyzer>) -> Option<Rc<T>> {
    AsAny::into_any_rc(instance).downcast::<T>().ok()
}

/// The view an analyzer gets of the engine while its code runs.
///
/// Handed to `setup` and to every callback; all operations act on behalf
/// of the analyzer the context belongs to.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    engine: &'a Engine,
    id: AnalyzerId,
    kind: &'static str,
}

impl<'a> Context<'a> {
    pub(crate) fn new(engine: &'a Engine, id: AnalyzerId, kind: &'static str) -> Self {
        Self { engine, id, kind }
    }

    pub fn id(&self) -> AnalyzerId {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn engine(&self) -> &'a Engine {
        self.engine
    }

    /// Logger tagged with this analyzer's class name.
    pub fn logger(&self) -> AnalyzerLogger {
        AnalyzerLogger::new(self.kind)
    }

    /// Sends `event` to every analyzer that depends on this one.
    pub fn emit(&self, event: &Event) -> Result<usize, EngineError> {
        self.engine.emit(self.id, event)
    }

    pub fn include_analyzer(
        &self,
        name: &str,
        callbacks: Vec<Callback>,
        args: &[Value],
    ) -> Result<AnalyzerId, EngineError> {
        self.engine.include_analyzer(self.id, name, callbacks, args)
    }

    pub fn exclude_analyzer(&self, name: &str) -> Result<bool, EngineError> {
        self.engine.exclude_analyzer(self.id, name)
    }

    pub fn get_analyzer(&self, name: &str) -> Option<Rc<dyn Analyzer>> {
        self.engine.get_analyzer(self.id, name)
    }

    pub fn get_analyzer_as<T: Analyzer>(&self, name: &str) -> Option<Rc<T>> {
        self.engine.get_analyzer_as(self.id, name)
    }

    pub fn add_source_callback(&self, callback: Callback) -> Result<bool, EngineError> {
        self.engine.add_source_callback(self.id, callback)
    }

    pub fn remove_source_callback(&self, callback: &Callback) -> Result<bool, EngineError> {
        self.engine.remove_source_callback(self.id, callback)
    }
}
