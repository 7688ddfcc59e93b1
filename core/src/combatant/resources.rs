use std::collections::HashMap;

use crate::events::{AbilityId, ActorId, Event, EventKind};

/// Resource spent and gained per actor, and spent per ability.
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    spent: HashMap<ActorId, f64>,
    spent_by_ability: HashMap<(ActorId, AbilityId), f64>,
    gained: HashMap<ActorId, f64>,
}

impl ResourceLedger {
    pub(super) fn record(&mut self, event: &Event) {
        if let Some(cost) = event.resource_cost.filter(|c| *c > 0.0) {
            *self.spent.entry(event.source_id).or_default() += cost;
            if let Some(ability_id) = event.ability_id {
                *self
                    .spent_by_ability
                    .entry((event.source_id, ability_id))
                    .or_default() += cost;
            }
        }

        if event.kind == EventKind::Energize
            && let Some(amount) = event.amount
        {
            *self.gained.entry(event.target_id).or_default() += amount;
        }
    }

    pub fn spent(&self, actor: ActorId) -> f64 {
        self.spent.get(&actor).copied().unwrap_or(0.0)
    }

    pub fn spent_on(&self, actor: ActorId, ability_id: AbilityId) -> f64 {
        self.spent_by_ability
            .get(&(actor, ability_id))
            .copied()
            .unwrap_or(0.0)
    }

    /// Every ability `actor` spent resource on, with the amount
    pub fn spent_by_ability(&self, actor: ActorId) -> impl Iterator<Item = (AbilityId, f64)> + '_ {
        self.spent_by_ability
            .iter()
            .filter(move |((spender, _), _)| *spender == actor)
            .map(|(&(_, ability_id), &spent)| (ability_id, spent))
    }

    pub fn gained(&self, actor: ActorId) -> f64 {
        self.gained.get(&actor).copied().unwrap_or(0.0)
    }
}
