//! Cooldown throughput tracking
//!
//! Each use of a tracked cooldown opens a window that captures the actor's
//! subsequent events until the window closes. Per (ability, actor):
//!
//! ```text
//!            cast                      cast (last use wins)
//!   closed ───────► open ─────────────────────────► open (new window)
//!                    │  duration elapsed / end of log
//!                    ▼
//!                  closed
//! ```
//!
//! Events vetoed by the tracker's [`ExclusionRule`] are never captured.

mod exclusion;
mod tracker;
mod window;

#[cfg(test)]
mod tracker_tests;

pub use exclusion::ExclusionRule;
pub use tracker::CooldownThroughputTracker;
pub use window::CooldownWindow;
