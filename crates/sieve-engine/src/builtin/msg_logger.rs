use std::cell::Cell;
use std::rc::Rc;

use serde_json::{json, Value};
use sieve_observe::Severity;
use sieve_types::Event;

use crate::analyzer::{Analyzer, Callback};
use crate::engine::Context;
use crate::error::{ConstructError, EngineError};

/// Writes one log record per source event.
///
/// Constructed from an optional object argument:
///
/// ```json
/// { "level": "debug", "types": ["LTE_RRC_OTA_Packet"] }
/// ```
///
/// `level` defaults to `info`; an absent or empty `types` logs every event.
#[derive(Debug)]
pub struct MsgLogger {
    severity: Severity,
    types: Vec<String>,
    logged: Cell<u64>,
}

impl MsgLogger {
    pub const KIND: &'static str = "MsgLogger";

    pub fn new(severity: Severity, types: Vec<String>) -> Self {
        Self {
            severity,
            types,
            logged: Cell::new(0),
        }
    }

    /// # Errors
    ///
    /// Rejects more than one argument, a non-object argument, an unknown
    /// `level`, and `types` entries that are not strings.
    pub fn from_args(args: &[Value]) -> Result<Self, ConstructError> {
        let options = match args {
            [] => return Ok(Self::new(Severity::default(), Vec::new())),
            [Value::Object(options)] => options,
            [_] => return Err(ConstructError::invalid_argument(0, "an object")),
            _ => return Err(ConstructError::new("MsgLogger takes at most one argument")),
        };

        let severity = match options.get("level") {
            None => Severity::default(),
            Some(Value::String(level)) => level
                .parse()
                .map_err(|err| ConstructError::new(format!("level: {err}")))?,
            Some(_) => return Err(ConstructError::new("level: expected a string")),
        };

        let types = match options.get("types") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ConstructError::new("types: expected strings"))
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(ConstructError::new("types: expected an array")),
        };

        Ok(Self::new(severity, types))
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn logged(&self) -> u64 {
        self.logged.get()
    }

    fn accepts(&self, type_id: &str) -> bool {
        self.types.is_empty() || self.types.iter().any(|t| t == type_id)
    }

    fn on_event(&self, ctx: &Context<'_>, event: &Event) {
        if !self.accepts(&event.type_id) {
            return;
        }
        let message = match event.timestamp {
            Some(ts) => format!("{} {}", ts.to_rfc3339(), event.type_id),
            None => event.type_id.clone(),
        };
        ctx.logger().log(self.severity, message);
        self.logged.set(self.logged.get() + 1);
    }
}

impl Analyzer for MsgLogger {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn setup(self: Rc<Self>, ctx: &Context<'_>) -> Result<(), EngineError> {
        ctx.add_source_callback(Callback::method(&self, Self::on_event))?;
        Ok(())
    }

    fn report(&self) -> Option<Value> {
        Some(json!({ "logged": self.logged.get() }))
    }
}
