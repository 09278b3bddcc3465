use std::cell::Cell;
use std::rc::Rc;

use serde_json::{json, Value};
use sieve_types::Event;

use crate::analyzer::{Analyzer, Callback};
use crate::engine::Context;
use crate::error::{ConstructError, EngineError};

/// Forwards source events of selected types to its dependents.
///
/// Each constructor argument is one accepted type id.
#[derive(Debug)]
pub struct TypeFilter {
    accept: Vec<String>,
    passed: Cell<u64>,
    dropped: Cell<u64>,
}

impl TypeFilter {
    pub const KIND: &'static str = "TypeFilter";

    pub fn new(accept: Vec<String>) -> Self {
        Self {
            accept,
            passed: Cell::new(0),
            dropped: Cell::new(0),
        }
    }

    /// # Errors
    ///
    /// Requires at least one argument, and every argument must be a string.
    pub fn from_args(args: &[Value]) -> Result<Self, ConstructError> {
        if args.is_empty() {
            return Err(ConstructError::new("TypeFilter needs at least one message type"));
        }
        let accept = args
            .iter()
            .enumerate()
            .map(|(index, arg)| {
                arg.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ConstructError::invalid_argument(index, "a message type string"))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self::new(accept))
    }

    pub fn accepts(&self, type_id: &str) -> bool {
        self.accept.iter().any(|t| t == type_id)
    }

    pub fn passed(&self) -> u64 {
        self.passed.get()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.get()
    }

    fn on_event(&self, ctx: &Context<'_>, event: &Event) {
        if !self.accepts(&event.type_id) {
            self.dropped.set(self.dropped.get() + 1);
            return;
        }
        self.passed.set(self.passed.get() + 1);
        if let Err(err) = ctx.emit(event) {
            ctx.logger().error(format!("failed to forward {}: {err}", event.type_id));
        }
    }
}

impl Analyzer for TypeFilter {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn setup(self: Rc<Self>, ctx: &Context<'_>) -> Result<(), EngineError> {
        ctx.add_source_callback(Callback::method(&self, Self::on_event))?;
        Ok(())
    }

    fn report(&self) -> Option<Value> {
        Some(json!({
            "accept": self.accept,
            "passed": self.passed.get(),
            "dropped": self.dropped.get(),
        }))
    }
}
