//! Single-pass event dispatch
//!
//! ```text
//!   EventLog (frozen) ──► for each event, in order:
//!                            validate ── malformed? ──► warn, skip, count
//!                               │
//!                            CombatantState::apply
//!                               │
//!                            subscriptions (instantiation order,
//!                              then registration order)
//!                               │ filter matches
//!                               ▼
//!                            Module::handle_event ── Err / panic ──► module
//!                                                    and dependents disabled
//!   end of log ──► CombatantState::finish ──► Module::finish
//! ```

mod context;
mod dispatcher;


pub use context::{DispatchContext, FightInfo};
pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use crate::modules::ModuleFailure;
