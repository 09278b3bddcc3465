//! Analyzer composition and event routing for the sieve pipeline.
//!
//! An [`Engine`] holds one instance per analyzer class. Analyzers declare
//! what they consume during [`Analyzer::setup`]: callbacks for raw events
//! from their source, and other analyzers (by class name) whose emitted
//! events they want. Declared dependencies are constructed on demand
//! through a two-tier [`Factory`].
//!
//! Binding an analyzer to a source also binds everything it depends on,
//! producers first. A pushed event therefore reaches each producer's
//! source callbacks before those of its consumers, and whatever a producer
//! emits while handling the event reaches its consumers synchronously.
//!
//! ```ignore
//! let engine = Engine::new(builtin::factory());
//! let source = engine.add_source("trace.jsonl");
//! let counter = engine.resolve("MsgCounter", &[])?;
//! engine.set_source(counter, source)?;
//! engine.push(source, &Event::new("LTE_RRC_OTA_Packet", json!({})))?;
//! ```
//!
//! The engine is single-threaded (`!Send`); every operation, including
//! those called from inside callbacks, runs on the caller's thread.

mod analyzer;
mod binding;
pub mod builtin;
mod engine;
mod error;
mod factory;
mod graph;
mod registry;
mod router;

pub use analyzer::{Analyzer, AsAny, Callback};
pub use engine::{Context, Engine, FailurePolicy};
pub use error::{ConstructError, EngineError};
pub use factory::{module_name_for, Factory};
pub use registry::{Registration, Registry};
