use std::collections::BTreeMap;

use aegis_types::ResourceUsageRow;

use crate::dispatch::DispatchContext;
use crate::events::{AbilityId, Event, EventKind};
use crate::filter::EventFilter;
use crate::modules::{HandlerKey, Module, ModuleError, Subscriptions};

/// Casts and resource spent per ability for the tracked actor.
///
/// Spend is read from the combatant ledger, so it covers every event that
/// carried a cost, not only casts.
#[derive(Debug, Clone, Default)]
pub struct ResourceUsage {
    rows: BTreeMap<AbilityId, ResourceUsageRow>,
    gained: f64,
}

impl ResourceUsage {
    pub const NAME: &'static str = "resource_usage";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, ability_id: AbilityId) -> Option<&ResourceUsageRow> {
        self.rows.get(&ability_id)
    }

    pub fn total_spent(&self) -> f64 {
        self.rows.values().map(|r| r.spent).sum()
    }

    pub fn total_gained(&self) -> f64 {
        self.gained
    }
}

impl Module for ResourceUsage {
    fn subscribe(&self, subscriptions: &mut Subscriptions) {
        subscriptions.on(EventFilter::of_kind(EventKind::Cast), "cast");
    }

    fn handle_event(
        &mut self,
        _handler: HandlerKey,
        event: &Event,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), ModuleError> {
        if !ctx.is_tracked(event.source_id) {
            return Ok(());
        }
        let Some(ability_id) = event.ability_id else {
            return Ok(());
        };
        self.rows
            .entry(ability_id)
            .or_insert_with(|| ResourceUsageRow {
                ability_id,
                ..Default::default()
            })
            .casts += 1;
        Ok(())
    }

    fn finish(&mut self, ctx: &DispatchContext<'_>) -> Result<(), ModuleError> {
        let Some(actor) = ctx.tracked_actor else {
            return Err(ModuleError::failed("resource usage needs a tracked actor"));
        };
        let ledger = ctx.combatants.resources();
        // Costs can ride on non-cast events (channel ticks), so spend adds rows too
        for (ability_id, spent) in ledger.spent_by_ability(actor) {
            self.rows
                .entry(ability_id)
                .or_insert_with(|| ResourceUsageRow {
                    ability_id,
                    ..Default::default()
                })
                .spent = spent;
        }
        self.gained = ledger.gained(actor);
        Ok(())
    }

    fn report(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "abilities": self.rows.values().collect::<Vec<_>>(),
            "spent": self.total_spent(),
            "gained": self.gained,
        }))
    }
}
