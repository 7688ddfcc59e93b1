//! Combatant state tracking
//!
//! Per-actor buff timelines and resource bookkeeping, built up during the
//! dispatch pass. The dispatcher is the only writer; modules receive a shared
//! reference through the dispatch context and may query it at any time.
//!
//! ```text
//!   BuffApply(X, stacks=1) @0   BuffStackChange(X, 2) @5   BuffRemove(X) @10
//!           │                          │                         │
//!           ▼                          ▼                         ▼
//!   [0 ───── stacks 1 ────── 5)[5 ───── stacks 2 ────── 10)
//! ```

mod resources;
mod state;
mod timeline;


pub use resources::ResourceLedger;
pub use state::CombatantState;
pub use timeline::BuffInterval;
