//! End-to-end analysis runs
//!
//! ```text
//!   Analysis (Send + Sync blueprint)
//!     │  run(events)
//!     ├─► ModuleRegistry::new     graph errors abort here
//!     ├─► NormalizerPass::run     sort, normalize, freeze
//!     ├─► ModuleRegistry::instantiate
//!     └─► EventDispatcher::run ──► AnalysisResult
//! ```
//!
//! An [`Analysis`] can be run any number of times, including concurrently:
//! every run builds its own module instances.

use std::cell::Ref;
use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use aegis_types::AnalysisConfig;

use crate::analyzers::builtin_definitions;
use crate::combatant::CombatantState;
use crate::dispatch::{EventDispatcher, FightInfo};
use crate::events::{ActorId, Event, EventLog, RelationFlags};
use crate::modules::{
    Module, ModuleDefinition, ModuleFailure, ModuleRegistry, ModuleSet, RegistryError,
};
use crate::normalize::{NormalizeError, Normalizer, NormalizerPass};

/// Fatal errors; nothing has been dispatched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// What to run: module definitions, normalizers, and run settings.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    config: AnalysisConfig,
    definitions: Vec<ModuleDefinition>,
    normalizers: NormalizerPass,
}

impl Analysis {
    /// An analysis with no modules or normalizers
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            definitions: Vec::new(),
            normalizers: NormalizerPass::new(),
        }
    }

    /// Built-in modules and normalizers as selected by `config`
    pub fn from_config(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let normalizers = NormalizerPass::from_names(config.normalizers.as_slice())?;
        let definitions = builtin_definitions(&config);
        Ok(Self {
            config,
            definitions,
            normalizers,
        })
    }

    pub fn module(mut self, definition: ModuleDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn normalizer(mut self, normalizer: impl Normalizer + 'static) -> Self {
        self.normalizers = self.normalizers.with(normalizer);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run one log through the full pipeline
    pub fn run(&self, events: Vec<Event>) -> Result<AnalysisResult, AnalysisError> {
        let registry = ModuleRegistry::new(self.definitions.iter().cloned())?;
        let log = self.normalizers.run(events)?;

        let tracked_actor = self.config.tracked_actor.or_else(|| infer_tracked_actor(&log));
        let mut dispatcher = EventDispatcher::new();
        if let Some(actor) = tracked_actor {
            dispatcher = dispatcher.with_tracked_actor(actor);
        }
        if let Some(bounds) = self.config.fight {
            dispatcher = dispatcher.with_fight(bounds.into());
        }

        let mut modules = registry.instantiate();
        let outcome = dispatcher.run(&log, &mut modules);
        info!(
            events = log.len(),
            dispatched = outcome.dispatched,
            skipped = outcome.skipped,
            modules = modules.len(),
            failed = outcome.failures.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            log,
            modules,
            combatants: outcome.combatants,
            fight: outcome.fight,
            tracked_actor,
            skipped: outcome.skipped,
            failures: outcome.failures,
        })
    }
}

/// The first source acting as the player
fn infer_tracked_actor(log: &EventLog) -> Option<ActorId> {
    log.iter()
        .find(|e| e.relation.contains(RelationFlags::BY_PLAYER))
        .map(|e| e.source_id)
}

/// Derived state of one completed run.
#[derive(Debug)]
pub struct AnalysisResult {
    log: EventLog,
    modules: ModuleSet,
    combatants: CombatantState,
    fight: FightInfo,
    tracked_actor: Option<ActorId>,
    skipped: usize,
    failures: Vec<ModuleFailure>,
}

impl AnalysisResult {
    /// Typed access to a module that completed the run
    pub fn get<T: Module>(&self, name: &str) -> Option<Ref<'_, T>> {
        self.modules.get(name)
    }

    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    pub fn failures(&self) -> &[ModuleFailure] {
        &self.failures
    }

    pub fn combatants(&self) -> &CombatantState {
        &self.combatants
    }

    pub fn fight(&self) -> FightInfo {
        self.fight
    }

    pub fn tracked_actor(&self) -> Option<ActorId> {
        self.tracked_actor
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Malformed events skipped during dispatch
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn report(&self) -> AnalysisReport {
        AnalysisReport {
            fight: self.fight,
            tracked_actor: self.tracked_actor,
            events: self.log.len(),
            skipped: self.skipped,
            modules: self.modules.reports(),
            failures: self.failures.clone(),
        }
    }
}

/// Serializable summary of a run: every surviving module's report plus the
/// failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub fight: FightInfo,
    pub tracked_actor: Option<ActorId>,
    pub events: usize,
    pub skipped: usize,
    pub modules: BTreeMap<String, serde_json::Value>,
    pub failures: Vec<ModuleFailure>,
}

/// Run several logs in parallel, one independent run per log.
///
/// Results are returned in input order.
pub fn analyze_batch(
    analysis: &Analysis,
    logs: Vec<Vec<Event>>,
) -> Vec<Result<AnalysisReport, AnalysisError>> {
    logs.into_par_iter()
        .map(|events| analysis.run(events).map(|result| result.report()))
        .collect()
}
