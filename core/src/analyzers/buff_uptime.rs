use aegis_types::BuffUptimeRow;

use crate::dispatch::DispatchContext;
use crate::events::{AbilityId, Event};
use crate::modules::{HandlerKey, Module, ModuleError, ModuleOptions, Subscriptions};

/// Uptime of configured buffs on the tracked actor, over the fight.
///
/// Reads the combatant state once the log is finished; it needs no events
/// of its own.
#[derive(Debug, Clone)]
pub struct BuffUptime {
    buffs: Vec<AbilityId>,
    rows: Vec<BuffUptimeRow>,
}

impl BuffUptime {
    pub const NAME: &'static str = "buff_uptime";

    pub fn from_options(options: &ModuleOptions) -> Result<Self, ModuleError> {
        Ok(Self {
            buffs: options.get_or("buffs", Vec::new())?,
            rows: Vec::new(),
        })
    }

    pub fn rows(&self) -> &[BuffUptimeRow] {
        &self.rows
    }

    pub fn uptime_pct(&self, ability_id: AbilityId) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.ability_id == ability_id)
            .map(|r| r.uptime_pct)
    }
}

impl Module for BuffUptime {
    fn subscribe(&self, _subscriptions: &mut Subscriptions) {}

    fn handle_event(
        &mut self,
        _handler: HandlerKey,
        _event: &Event,
        _ctx: &DispatchContext<'_>,
    ) -> Result<(), ModuleError> {
        Ok(())
    }

    fn is_active(&self) -> bool {
        !self.buffs.is_empty()
    }

    fn finish(&mut self, ctx: &DispatchContext<'_>) -> Result<(), ModuleError> {
        if self.buffs.is_empty() {
            return Ok(());
        }
        let Some(actor) = ctx.tracked_actor else {
            return Err(ModuleError::failed("buff uptime needs a tracked actor"));
        };
        let fight = ctx.fight;
        let combatants = ctx.combatants;

        self.rows = self
            .buffs
            .iter()
            .map(|&ability_id| {
                let uptime_ms = combatants.uptime(actor, ability_id, fight.end)
                    - combatants.uptime(actor, ability_id, fight.start);
                BuffUptimeRow {
                    ability_id,
                    uptime_ms,
                    uptime_pct: fight.fraction(uptime_ms),
                    max_stacks: combatants.max_stacks(actor, ability_id),
                }
            })
            .collect();
        Ok(())
    }

    fn report(&self) -> Option<serde_json::Value> {
        serde_json::to_value(&self.rows).ok()
    }
}
