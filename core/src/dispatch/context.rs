use serde::Serialize;

use aegis_types::FightBounds;

use crate::combatant::CombatantState;
use crate::events::{ActorId, EventLog};

/// Time span of the analyzed fight, in log milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FightInfo {
    pub start: i64,
    pub end: i64,
}

impl FightInfo {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// First to last event of the log; empty logs yield a zero-length fight
    pub fn from_log(log: &EventLog) -> Self {
        Self {
            start: log.start().unwrap_or(0),
            end: log.end().unwrap_or(0),
        }
    }

    pub fn duration(&self) -> i64 {
        (self.end - self.start).max(0)
    }

    /// `part` as a fraction of the fight duration, 0 for empty fights
    pub fn fraction(&self, part: i64) -> f64 {
        match self.duration() {
            0 => 0.0,
            d => part as f64 / d as f64,
        }
    }
}

impl From<FightBounds> for FightInfo {
    fn from(bounds: FightBounds) -> Self {
        Self::new(bounds.start_ms, bounds.end_ms)
    }
}

/// Read-only view handed to every handler invocation.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    pub combatants: &'a CombatantState,
    pub fight: FightInfo,
    /// The analyzed player, when the run was configured with one
    pub tracked_actor: Option<ActorId>,
}

impl DispatchContext<'_> {
    /// Timestamp of the event being dispatched (or the log end during finish)
    pub fn now(&self) -> i64 {
        self.combatants.now().unwrap_or(self.fight.start)
    }

    /// True for the tracked actor, or for every actor if none is tracked
    pub fn is_tracked(&self, actor: ActorId) -> bool {
        self.tracked_actor.is_none_or(|tracked| tracked == actor)
    }
}
