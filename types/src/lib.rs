//! Shared configuration and report types for aegis
//!
//! This crate contains serializable types shared between the analysis engine
//! (aegis-core) and whatever renders its output. Nothing here knows how an
//! analysis runs; it only describes what to run and what came out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-module option table, keyed by option name.
pub type OptionTable = toml::Table;

fn default_true() -> bool {
    true
}

// ─────────────────────────────────────────────────────────────────────────────
// Summary Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// What a cooldown window sums up over its captured events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    /// Sum of `amount` over damage events
    Damage,
    /// Sum of `amount` over heal events
    Healing,
    /// Sum of `overheal` over heal events
    Overhealing,
    /// Sum of `amount` over absorb events plus `absorbed` on damage/heal events
    Absorbed,
    /// Sum of `resource_cost` over any captured event
    ResourceSpent,
}

// ─────────────────────────────────────────────────────────────────────────────
// Cooldown Tracker Config
// ─────────────────────────────────────────────────────────────────────────────

/// A cooldown ability whose uses open throughput windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedCooldown {
    pub ability_id: i64,
    /// Display name, if the caller has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Summary values computed for each window of this cooldown
    #[serde(default)]
    pub summary: Vec<SummaryKind>,
    /// Fixed window length for cast cooldowns. `None` keeps the window open
    /// until the next use or the end of the log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
}

impl TrackedCooldown {
    pub fn new(ability_id: i64, summary: impl IntoIterator<Item = SummaryKind>) -> Self {
        Self {
            ability_id,
            name: None,
            summary: summary.into_iter().collect(),
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Configuration for one cooldown throughput tracker instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CooldownTrackerConfig {
    #[serde(default)]
    pub cooldowns: Vec<TrackedCooldown>,
    /// Ability IDs never attributed to any window (pet/decoy procs and the like)
    #[serde(default)]
    pub excluded_abilities: Vec<i64>,
    /// Also capture events whose source is owned by the window's actor
    #[serde(default)]
    pub include_pets: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Analysis Config
// ─────────────────────────────────────────────────────────────────────────────

/// Explicit fight bounds, overriding the ones derived from the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightBounds {
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Per-module settings from the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Free-form options handed to the module factory
    #[serde(default, flatten)]
    pub options: OptionTable,
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            options: OptionTable::new(),
        }
    }
}

/// Top-level configuration for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Actor whose performance is analyzed. Falls back to the first source
    /// flagged as the tracked player when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_actor: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fight: Option<FightBounds>,
    /// Normalizers to run, in order
    #[serde(default)]
    pub normalizers: Vec<String>,
    /// Settings keyed by module name
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleSettings>,
    #[serde(default)]
    pub cooldowns: CooldownTrackerConfig,
}

impl AnalysisConfig {
    /// Settings for a module, defaulting to enabled with no options
    pub fn module(&self, name: &str) -> ModuleSettings {
        self.modules.get(name).cloned().unwrap_or_default()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.modules.get(name).is_none_or(|m| m.enabled)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Report Types (produced by built-in modules)
// ─────────────────────────────────────────────────────────────────────────────

/// One use of a tracked cooldown and what happened while it was active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    pub ability_id: i64,
    pub actor_id: i64,
    pub opened_at: i64,
    pub closed_at: Option<i64>,
    pub event_count: usize,
    pub summary: BTreeMap<SummaryKind, f64>,
}

/// Damage and healing done with one ability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityTotalRow {
    pub ability_id: i64,
    pub damage: f64,
    pub healing: f64,
    pub hits: u32,
}

/// Uptime of one buff on the tracked actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffUptimeRow {
    pub ability_id: i64,
    pub uptime_ms: i64,
    /// Fraction of the fight, 0.0 to 1.0
    pub uptime_pct: f64,
    pub max_stacks: u32,
}

/// Resource spent on one ability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsageRow {
    pub ability_id: i64,
    pub spent: f64,
    pub casts: u32,
}

/// Damage gained from a stacking buff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffContributionReport {
    pub buff_id: i64,
    pub bonus_damage: f64,
    /// Bonus damage as a fraction of all damage done
    pub damage_share: f64,
    pub uptime_pct: f64,
}
