//! The analyzer contract and the callback handle.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use sieve_types::Event;

use crate::engine::Context;
use crate::error::EngineError;

/// Upcast helper so registry instances can be downcast to their concrete type.
///
/// Implemented for every `'static` type; analyzers never implement it by hand.
pub trait AsAny: Any {
    /// Converts a shared analyzer into a shared `Any`.
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// A named, stateful component of the analysis graph.
///
/// One instance per [`kind`](Analyzer::kind) lives in an engine. State that
/// callbacks mutate sits behind `Cell`/`RefCell`, since the engine shares
/// the instance between the registry and every callback bound to it.
///
/// # Example
///
/// ```ignore
/// struct RrcAnalyzer { setups: Cell<u64> }
///
/// impl Analyzer for RrcAnalyzer {
///     fn kind(&self) -> &'static str {
///         "RrcAnalyzer"
///     }
///
///     fn setup(self: Rc<Self>, ctx: &Context<'_>) -> Result<(), EngineError> {
///         ctx.add_source_callback(Callback::method(&self, Self::on_message))?;
///         ctx.include_analyzer("TypeFilter", vec![Callback::method(&self, Self::on_rrc)], &[])?;
///         Ok(())
///     }
/// }
/// ```
pub trait Analyzer: AsAny {
    /// The class name; the key under which the registry stores the instance.
    fn kind(&self) -> &'static str;

    /// Declares source callbacks and dependencies.
    ///
    /// Runs once, right after the instance is registered. Discarded
    /// duplicates never run it.
    fn setup(self: Rc<Self>, ctx: &Context<'_>) -> Result<(), EngineError> {
        let _ = ctx;
        Ok(())
    }

    /// Optional end-of-run summary.
    fn report(&self) -> Option<serde_json::Value> {
        None
    }
}

type CallbackFn = dyn Fn(&Context<'_>, &Event);

/// A unit of consumer logic invoked with one event.
///
/// Callbacks compare by identity: clones of one callback are equal, two
/// callbacks built from identical closures are not. This is what makes
/// source-callback membership set-like.
#[derive(Clone)]
pub struct Callback(Rc<CallbackFn>);

impl Callback {
    /// Wraps a closure.
    pub fn new(f: impl Fn(&Context<'_>, &Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Binds a method of a shared analyzer.
    pub fn method<A: 'static>(this: &Rc<A>, f: fn(&A, &Context<'_>, &Event)) -> Self {
        let this = Rc::clone(this);
        Self::new(move |ctx, event| f(&this, ctx, event))
    }

    pub(crate) fn invoke(&self, ctx: &Context<'_>, event: &Event) {
        (self.0)(ctx, event);
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0))
    }
}
