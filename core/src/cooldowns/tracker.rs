use std::collections::HashMap;

use tracing::debug;

use aegis_types::{CooldownTrackerConfig, TrackedCooldown, WindowReport};

use crate::dispatch::DispatchContext;
use crate::events::{AbilityId, ActorId, Event, EventKind};
use crate::filter::EventFilter;
use crate::modules::{HandlerKey, Module, ModuleError, Subscriptions};

use super::{CooldownWindow, ExclusionRule};

const ON_EVENT: HandlerKey = "event";

/// Opens a window on each use of a tracked cooldown and attributes the
/// user's subsequent events to it.
///
/// At most one window is open per (ability, actor). A new use closes the
/// open one at the new use's timestamp, and the new window captures the
/// opening cast itself.
#[derive(Debug, Clone)]
pub struct CooldownThroughputTracker {
    cooldowns: HashMap<AbilityId, TrackedCooldown>,
    exclusion: ExclusionRule,
    include_pets: bool,
    /// Every window ever opened, in opening order
    windows: Vec<CooldownWindow>,
    /// Indices of the open windows in `windows`, keyed by (ability, actor)
    open: HashMap<(AbilityId, ActorId), usize>,
}

impl CooldownThroughputTracker {
    pub const NAME: &'static str = "cooldown_throughput";

    pub fn new(config: &CooldownTrackerConfig) -> Self {
        Self {
            cooldowns: config
                .cooldowns
                .iter()
                .map(|c| (c.ability_id, c.clone()))
                .collect(),
            exclusion: ExclusionRule::abilities(config.excluded_abilities.iter().copied()),
            include_pets: config.include_pets,
            windows: Vec::new(),
            open: HashMap::new(),
        }
    }

    /// Replace the exclusion rule built from the config
    pub fn with_exclusion(mut self, exclusion: ExclusionRule) -> Self {
        self.exclusion = exclusion;
        self
    }

    pub fn is_tracked(&self, ability_id: AbilityId) -> bool {
        self.cooldowns.contains_key(&ability_id)
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    /// Window history of one cooldown ability, in opening order
    pub fn windows(&self, ability_id: AbilityId) -> Vec<&CooldownWindow> {
        self.windows
            .iter()
            .filter(|w| w.ability_id == ability_id)
            .collect()
    }

    pub fn all_windows(&self) -> &[CooldownWindow] {
        &self.windows
    }

    pub fn open_window(&self, ability_id: AbilityId, actor: ActorId) -> Option<&CooldownWindow> {
        self.open
            .get(&(ability_id, actor))
            .map(|&index| &self.windows[index])
    }

    pub fn reports(&self) -> Vec<WindowReport> {
        self.windows.iter().map(CooldownWindow::report).collect()
    }

    // ─── State Machine ──────────────────────────────────────────────────────

    fn close_window(&mut self, key: (AbilityId, ActorId), at: i64) {
        if let Some(index) = self.open.remove(&key) {
            let window = &mut self.windows[index];
            window.closed_at = Some(at.max(window.opened_at));
            debug!(
                ability_id = window.ability_id,
                actor = window.actor_id,
                opened_at = window.opened_at,
                closed_at = at,
                captured = window.events.len(),
                "cooldown window closed"
            );
        }
    }

    /// Close fixed-duration windows whose duration elapsed before `now`
    fn expire(&mut self, now: i64) {
        let expired: Vec<_> = self
            .open
            .iter()
            .filter_map(|(&key, &index)| {
                let window = &self.windows[index];
                let duration = self.cooldowns.get(&window.ability_id)?.duration_ms?;
                let end = window.opened_at + duration;
                (now >= end).then_some((key, end))
            })
            .collect();
        for (key, end) in expired {
            self.close_window(key, end);
        }
    }

    fn start_window(&mut self, cooldown: &TrackedCooldown, actor: ActorId, at: i64) {
        let key = (cooldown.ability_id, actor);
        self.close_window(key, at);
        self.windows.push(CooldownWindow::open(
            cooldown.ability_id,
            actor,
            at,
            cooldown.summary.clone(),
        ));
        self.open.insert(key, self.windows.len() - 1);
    }

    fn belongs_to(&self, event: &Event, actor: ActorId) -> bool {
        event.source_id == actor || (self.include_pets && event.owner_id == Some(actor))
    }

    fn capture(&mut self, event: &Event) {
        if self.open.is_empty() || self.exclusion.excludes(event) {
            return;
        }
        let mut targets: Vec<usize> = self
            .open
            .iter()
            .filter(|((_, actor), _)| self.belongs_to(event, *actor))
            .map(|(_, &index)| index)
            .collect();
        // Windows capture in opening order regardless of map iteration order
        targets.sort_unstable();
        for index in targets {
            self.windows[index].events.push(event.clone());
        }
    }
}

impl Module for CooldownThroughputTracker {
    fn subscribe(&self, subscriptions: &mut Subscriptions) {
        subscriptions.on(EventFilter::any(), ON_EVENT);
    }

    fn handle_event(
        &mut self,
        _handler: HandlerKey,
        event: &Event,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), ModuleError> {
        self.expire(event.timestamp);

        if event.kind == EventKind::Cast
            && ctx.is_tracked(event.source_id)
            && let Some(cooldown) = event.ability_id.and_then(|id| self.cooldowns.get(&id)).cloned()
        {
            self.start_window(&cooldown, event.source_id, event.timestamp);
        }

        self.capture(event);
        Ok(())
    }

    fn is_active(&self) -> bool {
        !self.cooldowns.is_empty()
    }

    fn finish(&mut self, ctx: &DispatchContext<'_>) -> Result<(), ModuleError> {
        let end = ctx.now();
        self.expire(end);
        let still_open: Vec<_> = self.open.keys().copied().collect();
        for key in still_open {
            self.close_window(key, end);
        }
        Ok(())
    }

    fn report(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self.reports()).ok()
    }
}
