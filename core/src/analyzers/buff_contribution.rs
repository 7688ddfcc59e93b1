use aegis_types::BuffContributionReport;

use crate::dispatch::DispatchContext;
use crate::events::{AbilityId, Event, EventKind};
use crate::filter::EventFilter;
use crate::modules::{
    Dependencies, HandlerKey, Module, ModuleError, ModuleOptions, ModuleRef, Subscriptions,
};

use super::AbilityTotals;

/// Damage gained from a stacking damage buff.
///
/// Each damage event that `ability_totals` attributes to the tracked actor
/// (optionally limited to an ability whitelist) is scaled by
/// `stacks * mod_per_stack` at the moment it lands; the gain is the part of
/// the hit that the buff added. The share of total damage comes from the
/// same `ability_totals` dependency, so both sides count the same hits.
///
/// Options: `buff_id` (module inactive without it), `mod_per_stack`
/// (required with `buff_id`), `abilities` (whitelist, default all).
#[derive(Debug, Clone)]
pub struct BuffContribution {
    buff_id: Option<AbilityId>,
    mod_per_stack: f64,
    abilities: Vec<AbilityId>,
    totals: ModuleRef<AbilityTotals>,
    bonus_damage: f64,
    damage_share: f64,
    uptime_pct: f64,
}

impl BuffContribution {
    pub const NAME: &'static str = "buff_contribution";

    pub fn build(deps: &Dependencies<'_>, options: &ModuleOptions) -> Result<Self, ModuleError> {
        let buff_id = options.get("buff_id")?;
        let mod_per_stack = match buff_id {
            Some(_) => options.require("mod_per_stack")?,
            None => 0.0,
        };
        Ok(Self {
            buff_id,
            mod_per_stack,
            abilities: options.get_or("abilities", Vec::new())?,
            totals: deps.get(AbilityTotals::NAME)?,
            bonus_damage: 0.0,
            damage_share: 0.0,
            uptime_pct: 0.0,
        })
    }

    pub fn bonus_damage(&self) -> f64 {
        self.bonus_damage
    }

    /// Bonus damage as a fraction of all tracked damage, set at end of log
    pub fn damage_share(&self) -> f64 {
        self.damage_share
    }

    pub fn uptime_pct(&self) -> f64 {
        self.uptime_pct
    }
}

/// Part of `raw` contributed by a multiplicative `increase`
fn effective_gain(raw: f64, increase: f64) -> f64 {
    raw - raw / (1.0 + increase)
}

impl Module for BuffContribution {
    fn subscribe(&self, subscriptions: &mut Subscriptions) {
        let mut filter = EventFilter::of_kind(EventKind::Damage);
        if !self.abilities.is_empty() {
            filter = filter.abilities(self.abilities.iter().copied());
        }
        subscriptions.on(filter, "damage");
    }

    fn handle_event(
        &mut self,
        _handler: HandlerKey,
        event: &Event,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), ModuleError> {
        let Some(buff_id) = self.buff_id else {
            return Ok(());
        };
        // Same attribution as the totals the share is divided by
        if !self.totals.borrow()?.attributes(event, ctx) {
            return Ok(());
        }
        let actor = ctx
            .tracked_actor
            .unwrap_or_else(|| event.owner_id.unwrap_or(event.source_id));
        let stacks = ctx.combatants.current_stacks(actor, buff_id);
        if stacks == 0 {
            return Ok(());
        }

        let raw = event.amount.unwrap_or(0.0) + event.absorbed.unwrap_or(0.0);
        self.bonus_damage += effective_gain(raw, f64::from(stacks) * self.mod_per_stack);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.buff_id.is_some()
    }

    fn finish(&mut self, ctx: &DispatchContext<'_>) -> Result<(), ModuleError> {
        let Some(buff_id) = self.buff_id else {
            return Ok(());
        };

        let total = self.totals.borrow()?.total_damage();
        self.damage_share = if total > 0.0 {
            self.bonus_damage / total
        } else {
            0.0
        };

        if let Some(actor) = ctx.tracked_actor {
            let fight = ctx.fight;
            let uptime = ctx.combatants.uptime(actor, buff_id, fight.end)
                - ctx.combatants.uptime(actor, buff_id, fight.start);
            self.uptime_pct = fight.fraction(uptime);
        }
        Ok(())
    }

    fn report(&self) -> Option<serde_json::Value> {
        let report = BuffContributionReport {
            buff_id: self.buff_id?,
            bonus_damage: self.bonus_damage,
            damage_share: self.damage_share,
            uptime_pct: self.uptime_pct,
        };
        serde_json::to_value(report).ok()
    }
}
