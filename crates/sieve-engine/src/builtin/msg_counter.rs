use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{json, Value};
use sieve_types::Event;

use crate::analyzer::{Analyzer, Callback};
use crate::engine::Context;
use crate::error::{ConstructError, EngineError};

/// Counts source events per message type.
#[derive(Debug, Default)]
pub struct MsgCounter {
    counts: RefCell<BTreeMap<String, u64>>,
}

impl MsgCounter {
    pub const KIND: &'static str = "MsgCounter";

    pub fn new() -> Self {
        Self::default()
    }

    /// Takes no arguments.
    ///
    /// # Errors
    ///
    /// Rejects any argument.
    pub fn from_args(args: &[Value]) -> Result<Self, ConstructError> {
        if !args.is_empty() {
            return Err(ConstructError::new("MsgCounter takes no arguments"));
        }
        Ok(Self::new())
    }

    pub fn count(&self, type_id: &str) -> u64 {
        self.counts.borrow().get(type_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.borrow().values().sum()
    }

    fn on_event(&self, _ctx: &Context<'_>, event: &Event) {
        *self
            .counts
            .borrow_mut()
            .entry(event.type_id.clone())
            .or_default() += 1;
    }
}

impl Analyzer for MsgCounter {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn setup(self: Rc<Self>, ctx: &Context<'_>) -> Result<(), EngineError> {
        ctx.add_source_callback(Callback::method(&self, Self::on_event))?;
        Ok(())
    }

    fn report(&self) -> Option<Value> {
        let counts = self.counts.borrow();
        Some(json!({
            "total": counts.values().sum::<u64>(),
            "by_type": *counts,
        }))
    }
}
