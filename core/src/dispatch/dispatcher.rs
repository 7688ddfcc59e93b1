use tracing::{debug, warn};

use crate::combatant::CombatantState;
use crate::events::{ActorId, EventLog};
use crate::modules::{ModuleFailure, ModuleSet};

use super::{DispatchContext, FightInfo};

/// Result of one dispatch pass.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Final combatant state, closed at end of log
    pub combatants: CombatantState,
    pub fight: FightInfo,
    /// Events delivered to the tracker and subscriptions
    pub dispatched: usize,
    /// Malformed events skipped with a warning
    pub skipped: usize,
    pub failures: Vec<ModuleFailure>,
}

/// Replays a frozen log once through the combatant tracker and every module
/// subscription.
#[derive(Debug, Clone, Default)]
pub struct EventDispatcher {
    fight: Option<FightInfo>,
    tracked_actor: Option<ActorId>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the fight bounds derived from the log
    pub fn with_fight(mut self, fight: FightInfo) -> Self {
        self.fight = Some(fight);
        self
    }

    pub fn with_tracked_actor(mut self, actor: ActorId) -> Self {
        self.tracked_actor = Some(actor);
        self
    }

    /// Run the single pass. Module failures are recorded in `modules` and
    /// never interrupt the pass.
    pub fn run(&self, log: &EventLog, modules: &mut ModuleSet) -> DispatchOutcome {
        let fight = self.fight.unwrap_or_else(|| FightInfo::from_log(log));
        let subscriptions = modules.subscriptions();
        debug!(
            events = log.len(),
            subscriptions = subscriptions.len(),
            "starting dispatch"
        );

        let mut combatants = CombatantState::new();
        let mut dispatched = 0;
        let mut skipped = 0;

        for event in log.iter() {
            if let Err(error) = event.validate() {
                warn!(%error, "skipping malformed event");
                skipped += 1;
                continue;
            }

            // Tracker first so handlers see state that includes this event
            combatants.apply(event);
            dispatched += 1;

            let ctx = DispatchContext {
                combatants: &combatants,
                fight,
                tracked_actor: self.tracked_actor,
            };
            for (index, subscription) in &subscriptions {
                if modules.is_active(*index) && subscription.filter.matches(event) {
                    modules.handle(*index, subscription.handler, event, &ctx);
                }
            }
        }

        if let Some(end) = log.end() {
            combatants.finish(end);
        }
        let ctx = DispatchContext {
            combatants: &combatants,
            fight,
            tracked_actor: self.tracked_actor,
        };
        modules.finish(&ctx);

        let failures = modules.failures();
        debug!(dispatched, skipped, failed = failures.len(), "dispatch complete");

        DispatchOutcome {
            combatants,
            fight,
            dispatched,
            skipped,
            failures,
        }
    }
}
