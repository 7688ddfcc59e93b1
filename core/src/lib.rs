pub mod analysis;
pub mod analyzers;
pub mod combatant;
pub mod config;
pub mod cooldowns;
pub mod dispatch;
pub mod events;
pub mod filter;
pub mod modules;
pub mod normalize;

// Re-exports for convenience
pub use aegis_types::{AnalysisConfig, CooldownTrackerConfig, SummaryKind, TrackedCooldown};
pub use analysis::{Analysis, AnalysisError, AnalysisReport, AnalysisResult, analyze_batch};
pub use analyzers::{
    AbilityTotals, BUILTIN_MODULES, BuffContribution, BuffUptime, ResourceUsage,
    builtin_definitions,
};
pub use combatant::{BuffInterval, CombatantState, ResourceLedger};
pub use config::{ConfigError, LoadedEvents, load_config, load_events};
pub use cooldowns::{CooldownThroughputTracker, CooldownWindow, ExclusionRule};
pub use dispatch::{DispatchContext, DispatchOutcome, EventDispatcher, FightInfo};
pub use events::{AbilityId, ActorId, Event, EventError, EventKind, EventLog, RelationFlags};
pub use filter::EventFilter;
pub use modules::{
    Dependencies, HandlerKey, Module, ModuleDefinition, ModuleError, ModuleFailure, ModuleOptions,
    ModuleRef, ModuleRegistry, ModuleSet, ModuleStatus, RegistryError, Subscription,
    Subscriptions,
};
pub use normalize::{CastOrder, NormalizeError, Normalizer, NormalizerPass, PrePullBuffs};
