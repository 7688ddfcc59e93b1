//! Built-in analysis modules
//!
//! Each analyzer is an ordinary [`Module`](crate::modules::Module) built on
//! the engine; none has access the others lack.
//!
//! | name                  | depends on       | output                          |
//! |-----------------------|------------------|---------------------------------|
//! | `ability_totals`      |                  | damage / healing per ability    |
//! | `buff_uptime`         |                  | uptime % per configured buff    |
//! | `buff_contribution`   | `ability_totals` | damage gained from a stack buff |
//! | `resource_usage`      |                  | resource spent per ability      |
//! | `cooldown_throughput` |                  | per-use cooldown windows        |

mod ability_totals;
mod buff_contribution;
mod buff_uptime;
mod resource_usage;


use tracing::debug;

use aegis_types::AnalysisConfig;

use crate::cooldowns::CooldownThroughputTracker;
use crate::modules::{ModuleDefinition, ModuleOptions};

pub use ability_totals::AbilityTotals;
pub use buff_contribution::BuffContribution;
pub use buff_uptime::BuffUptime;
pub use resource_usage::ResourceUsage;

/// Names of the built-in modules, in declaration order
pub const BUILTIN_MODULES: [&str; 5] = [
    AbilityTotals::NAME,
    BuffUptime::NAME,
    BuffContribution::NAME,
    ResourceUsage::NAME,
    CooldownThroughputTracker::NAME,
];

/// Definitions for every built-in module the config leaves enabled, with
/// their configured options.
///
/// Disabling `ability_totals` while `buff_contribution` stays enabled is a
/// registry error (unknown dependency).
pub fn builtin_definitions(config: &AnalysisConfig) -> Vec<ModuleDefinition> {
    let mut definitions = Vec::new();

    for name in BUILTIN_MODULES {
        if !config.is_enabled(name) {
            debug!(module = name, "built-in module disabled");
            continue;
        }
        let options = ModuleOptions::from_table(config.module(name).options);

        let definition = match name {
            AbilityTotals::NAME => {
                ModuleDefinition::new(name, |_deps, options| AbilityTotals::from_options(options))
            }
            BuffUptime::NAME => {
                ModuleDefinition::new(name, |_deps, options| BuffUptime::from_options(options))
            }
            BuffContribution::NAME => ModuleDefinition::new(name, BuffContribution::build)
                .depends_on(AbilityTotals::NAME),
            ResourceUsage::NAME => {
                ModuleDefinition::new(name, |_deps, _options| Ok(ResourceUsage::new()))
            }
            CooldownThroughputTracker::NAME => {
                let cooldowns = config.cooldowns.clone();
                ModuleDefinition::new(name, move |_deps, _options| {
                    Ok(CooldownThroughputTracker::new(&cooldowns))
                })
            }
            _ => continue,
        };
        definitions.push(definition.with_options(options));
    }

    definitions
}
