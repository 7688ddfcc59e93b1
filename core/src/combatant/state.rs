use std::collections::HashMap;

use tracing::debug;

use crate::events::{AbilityId, ActorId, Event, EventKind};

use super::timeline::BuffTimeline;
use super::{BuffInterval, ResourceLedger};

/// Buff timelines and resource usage for every actor seen in the log.
///
/// Mutated only by the dispatcher (`apply` / `finish` are crate-private);
/// every query takes `&self`.
#[derive(Debug, Clone, Default)]
pub struct CombatantState {
    buffs: HashMap<(ActorId, AbilityId), BuffTimeline>,
    resources: ResourceLedger,
    /// Timestamp of the most recently applied event
    now: Option<i64>,
    finished: bool,
}

impl CombatantState {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Updates (dispatcher only) ──────────────────────────────────────────

    pub(crate) fn apply(&mut self, event: &Event) {
        self.now = Some(event.timestamp);
        self.resources.record(event);

        if !event.kind.is_buff() {
            return;
        }
        let Some(ability_id) = event.ability_id else {
            return;
        };

        let actor = event.target_id;
        let timeline = self.buffs.entry((actor, ability_id)).or_default();

        match event.kind {
            EventKind::BuffApply => {
                timeline.set_stacks(ability_id, event.resulting_stacks(), event.timestamp);
            }
            EventKind::BuffStackChange => {
                let stacks = event.resulting_stacks();
                if stacks == 0 {
                    timeline.close(event.timestamp);
                } else {
                    if timeline.open_stacks().is_none() {
                        debug!(actor, ability_id, "stack change without apply, opening buff");
                    }
                    timeline.set_stacks(ability_id, stacks, event.timestamp);
                }
            }
            EventKind::BuffRemove => {
                if !timeline.close(event.timestamp) {
                    debug!(
                        actor,
                        ability_id,
                        timestamp = event.timestamp,
                        "remove without active buff"
                    );
                }
            }
            _ => {}
        }
    }

    /// Close every still-open buff at `end` (end-of-log flush).
    pub(crate) fn finish(&mut self, end: i64) {
        for timeline in self.buffs.values_mut() {
            timeline.close(end);
        }
        self.now = Some(self.now.map_or(end, |now| now.max(end)));
        self.finished = true;
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    /// Timestamp of the last processed event ("now" during dispatch)
    pub fn now(&self) -> Option<i64> {
        self.now
    }

    /// True once the end-of-log flush has run
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stack count of `ability_id` on `actor` at `timestamp` (0 if inactive)
    pub fn stacks_at(&self, actor: ActorId, ability_id: AbilityId, timestamp: i64) -> u32 {
        self.buffs
            .get(&(actor, ability_id))
            .map_or(0, |t| t.stacks_at(timestamp))
    }

    /// Stack count at the last processed event
    pub fn current_stacks(&self, actor: ActorId, ability_id: AbilityId) -> u32 {
        self.now
            .map_or(0, |now| self.stacks_at(actor, ability_id, now))
    }

    pub fn has_buff(&self, actor: ActorId, ability_id: AbilityId) -> bool {
        self.current_stacks(actor, ability_id) > 0
    }

    /// Milliseconds `ability_id` was active on `actor` before `timestamp`.
    /// Non-decreasing in `timestamp`; zero before the first apply.
    pub fn uptime(&self, actor: ActorId, ability_id: AbilityId, timestamp: i64) -> i64 {
        self.buffs
            .get(&(actor, ability_id))
            .map_or(0, |t| t.uptime_until(timestamp))
    }

    /// Stack-weighted uptime; divide by `uptime` for the average stack count
    pub fn stack_uptime(&self, actor: ActorId, ability_id: AbilityId, timestamp: i64) -> i64 {
        self.buffs
            .get(&(actor, ability_id))
            .map_or(0, |t| t.stack_ms_until(timestamp))
    }

    pub fn max_stacks(&self, actor: ActorId, ability_id: AbilityId) -> u32 {
        self.buffs
            .get(&(actor, ability_id))
            .map_or(0, |t| t.max_stacks())
    }

    /// Every interval of `ability_id` on `actor`, in time order
    pub fn history(&self, actor: ActorId, ability_id: AbilityId) -> &[BuffInterval] {
        self.buffs
            .get(&(actor, ability_id))
            .map(BuffTimeline::intervals)
            .unwrap_or_default()
    }

    /// Buffs active on `actor` right now, as (ability, stacks)
    pub fn active_buffs(&self, actor: ActorId) -> Vec<(AbilityId, u32)> {
        let mut active: Vec<_> = self
            .buffs
            .iter()
            .filter(|((a, _), _)| *a == actor)
            .filter_map(|((_, ability), timeline)| {
                let stacks = self.now.map_or(0, |now| timeline.stacks_at(now));
                (stacks > 0).then_some((*ability, stacks))
            })
            .collect();
        active.sort_unstable();
        active
    }

    pub fn resources(&self) -> &ResourceLedger {
        &self.resources
    }
}
