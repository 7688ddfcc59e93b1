use std::collections::HashSet;

use tracing::debug;

use crate::events::{AbilityId, ActorId, Event, EventKind};

use super::{NormalizeError, Normalizer};

/// Synthesizes an apply at fight start for buffs that were already active
/// when logging began.
///
/// A buff whose first event is a remove or a stack change (rather than an
/// apply) must have been applied before the pull. Without the synthetic
/// apply its uptime before that first event would be lost.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrePullBuffs;

impl PrePullBuffs {
    pub const NAME: &'static str = "prepull_buffs";
}

impl Normalizer for PrePullBuffs {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn normalize(&self, events: Vec<Event>) -> Result<Vec<Event>, NormalizeError> {
        let Some(start) = events.first().map(|e| e.timestamp) else {
            return Ok(events);
        };

        let mut seen: HashSet<(ActorId, AbilityId)> = HashSet::new();
        let mut synthesized = Vec::new();

        for event in events.iter().filter(|e| e.kind.is_buff()) {
            let Some(ability_id) = event.ability_id else {
                continue;
            };
            if !seen.insert((event.target_id, ability_id)) {
                continue;
            }
            if event.kind == EventKind::BuffApply {
                continue;
            }

            let stacks = match event.kind {
                EventKind::BuffStackChange => event.resulting_stacks().max(1),
                _ => 1,
            };
            debug!(
                target = event.target_id,
                ability_id,
                first_seen = event.timestamp,
                "synthesizing pre-pull apply"
            );
            synthesized.push(
                Event::new(start, EventKind::BuffApply, event.source_id, event.target_id)
                    .with_ability(ability_id)
                    .with_stacks(stacks)
                    .with_relation(event.relation)
                    .synthetic(),
            );
        }

        if synthesized.is_empty() {
            return Ok(events);
        }
        synthesized.extend(events);
        Ok(synthesized)
    }
}
