//! Analyzers every engine can resolve without local modules.

mod msg_counter;
mod msg_logger;
mod type_filter;

pub use msg_counter::MsgCounter;
pub use msg_logger::MsgLogger;
pub use type_filter::TypeFilter;

use crate::factory::Factory;

/// A factory whose builtin tier holds [`MsgLogger`], [`MsgCounter`] and [`TypeFilter`].
pub fn factory() -> Factory {
    let mut factory = Factory::new();
    factory
        .register_builtin(MsgLogger::KIND, MsgLogger::from_args)
        .register_builtin(MsgCounter::KIND, MsgCounter::from_args)
        .register_builtin(TypeFilter::KIND, TypeFilter::from_args);
    factory
}
