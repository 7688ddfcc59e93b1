use std::collections::BTreeMap;

use serde::Serialize;

use aegis_types::{SummaryKind, WindowReport};

use crate::events::{AbilityId, ActorId, Event, EventKind};

/// One use of a tracked cooldown and the events captured while it was open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CooldownWindow {
    pub ability_id: AbilityId,
    pub actor_id: ActorId,
    pub opened_at: i64,
    /// Exclusive end; `None` while open
    pub closed_at: Option<i64>,
    /// Captured events, in dispatch order (the opening cast included)
    pub events: Vec<Event>,
    pub summary_kinds: Vec<SummaryKind>,
}

impl CooldownWindow {
    pub(super) fn open(
        ability_id: AbilityId,
        actor_id: ActorId,
        opened_at: i64,
        summary_kinds: Vec<SummaryKind>,
    ) -> Self {
        Self {
            ability_id,
            actor_id,
            opened_at,
            closed_at: None,
            events: Vec::new(),
            summary_kinds,
        }
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    pub fn duration(&self) -> Option<i64> {
        self.closed_at.map(|end| end - self.opened_at)
    }

    /// Total of `kind` over the captured events
    pub fn summary(&self, kind: SummaryKind) -> f64 {
        self.events.iter().map(|e| contribution(kind, e)).sum()
    }

    /// Every declared summary kind with its value
    pub fn summaries(&self) -> BTreeMap<SummaryKind, f64> {
        self.summary_kinds
            .iter()
            .map(|&kind| (kind, self.summary(kind)))
            .collect()
    }

    pub fn report(&self) -> WindowReport {
        WindowReport {
            ability_id: self.ability_id,
            actor_id: self.actor_id,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
            event_count: self.events.len(),
            summary: self.summaries(),
        }
    }
}

fn contribution(kind: SummaryKind, event: &Event) -> f64 {
    let amount = event.amount.unwrap_or(0.0);
    match kind {
        SummaryKind::Damage if event.kind == EventKind::Damage => amount,
        SummaryKind::Healing if event.kind == EventKind::Heal => amount,
        SummaryKind::Overhealing if event.kind == EventKind::Heal => event.overheal.unwrap_or(0.0),
        SummaryKind::Absorbed => match event.kind {
            EventKind::Absorb => amount,
            EventKind::Damage | EventKind::Heal => event.absorbed.unwrap_or(0.0),
            _ => 0.0,
        },
        SummaryKind::ResourceSpent => event.resource_cost.unwrap_or(0.0),
        _ => 0.0,
    }
}
