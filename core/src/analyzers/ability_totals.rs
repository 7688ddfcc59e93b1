use std::collections::BTreeMap;

use aegis_types::AbilityTotalRow;

use crate::dispatch::DispatchContext;
use crate::events::{AbilityId, Event, EventKind};
use crate::filter::EventFilter;
use crate::modules::{HandlerKey, Module, ModuleError, ModuleOptions, Subscriptions};

/// Damage and healing per ability for the tracked actor (and, by default,
/// their pets).
#[derive(Debug, Clone)]
pub struct AbilityTotals {
    include_pets: bool,
    rows: BTreeMap<AbilityId, AbilityTotalRow>,
}

impl AbilityTotals {
    pub const NAME: &'static str = "ability_totals";

    pub fn from_options(options: &ModuleOptions) -> Result<Self, ModuleError> {
        Ok(Self {
            include_pets: options.get_or("include_pets", true)?,
            rows: BTreeMap::new(),
        })
    }

    /// Whether `event` counts toward these totals: done by the tracked actor,
    /// or by one of their pets when pets are included
    pub fn attributes(&self, event: &Event, ctx: &DispatchContext<'_>) -> bool {
        ctx.is_tracked(event.source_id)
            || (self.include_pets && event.owner_id.is_some_and(|owner| ctx.is_tracked(owner)))
    }

    pub fn row(&self, ability_id: AbilityId) -> Option<&AbilityTotalRow> {
        self.rows.get(&ability_id)
    }

    pub fn rows(&self) -> impl Iterator<Item = &AbilityTotalRow> {
        self.rows.values()
    }

    pub fn total_damage(&self) -> f64 {
        self.rows.values().map(|r| r.damage).sum()
    }

    pub fn total_healing(&self) -> f64 {
        self.rows.values().map(|r| r.healing).sum()
    }
}

impl Module for AbilityTotals {
    fn subscribe(&self, subscriptions: &mut Subscriptions) {
        subscriptions.on(
            EventFilter::of_kind(EventKind::Damage).kind(EventKind::Heal),
            "amount",
        );
    }

    fn handle_event(
        &mut self,
        _handler: HandlerKey,
        event: &Event,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), ModuleError> {
        if !self.attributes(event, ctx) {
            return Ok(());
        }
        let (Some(ability_id), Some(amount)) = (event.ability_id, event.amount) else {
            return Ok(());
        };

        let row = self.rows.entry(ability_id).or_insert_with(|| AbilityTotalRow {
            ability_id,
            ..Default::default()
        });
        match event.kind {
            EventKind::Damage => row.damage += amount,
            EventKind::Heal => row.healing += amount,
            _ => return Ok(()),
        }
        row.hits += 1;
        Ok(())
    }

    fn report(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self.rows().collect::<Vec<_>>()).ok()
    }
}
