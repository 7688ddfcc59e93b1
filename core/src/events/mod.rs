//! Event model
//!
//! Canonical representation of one occurrence in a combat log, plus the
//! frozen, time-ordered sequence the dispatcher replays.

mod error;
mod event;
mod log;


pub use error::EventError;
pub use event::{AbilityId, ActorId, Event, EventKind, RelationFlags};
pub use log::EventLog;
pub(crate) use log::first_unordered;
