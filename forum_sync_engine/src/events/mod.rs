//! Match events and the worker pool that delivers them to the synchronisation flow.
mod channel;
mod event_types;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::MatchEvent;
