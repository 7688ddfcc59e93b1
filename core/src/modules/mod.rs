//! Pluggable analysis modules
//!
//! This module provides:
//! - **Module**: the contract every analysis unit implements
//! - **Definitions**: named blueprints declaring dependencies and options
//! - **Registry**: validates the dependency graph and instantiates modules
//!
//! # Lifecycle
//!
//! ```text
//!   ModuleDefinition ──► ModuleRegistry::new ──► resolved order
//!                         (unknown / cycle / duplicate = fatal)
//!                                   │
//!                         ModuleRegistry::instantiate
//!                                   │
//!               factory(deps, options) in dependency order
//!                                   │
//!                                   ▼
//!          Module::subscribe ──► dispatcher ──► Module::handle_event
//!                                   │
//!                      Module::finish ──► Module::report
//! ```
//!
//! Modules only see each other through `ModuleRef` handles to dependencies
//! they declared. There is no other channel between modules.

mod deps;
mod error;
mod options;
mod registry;
mod set;

#[cfg(test)]
mod registry_tests;

use std::any::Any;

use crate::dispatch::DispatchContext;
use crate::events::Event;
use crate::filter::EventFilter;

pub use deps::{Dependencies, ModuleRef};
pub use error::{ModuleError, RegistryError};
pub use options::ModuleOptions;
pub use registry::{ModuleDefinition, ModuleRegistry};
pub use set::{ModuleFailure, ModuleSet, ModuleStatus};

/// Name a module gives each of its event handlers.
pub type HandlerKey = &'static str;

/// Access to the concrete type behind a `dyn Module`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An analysis unit driven by the event dispatcher.
///
/// Implementors register filtered subscriptions once after construction and
/// receive matching events in log order. Returning an error (or panicking)
/// from any method disables the module for the rest of the run; its report is
/// then omitted.
pub trait Module: AsAny {
    /// Register event subscriptions. Called once, only for active modules.
    fn subscribe(&self, subscriptions: &mut Subscriptions);

    /// Handle one event matched by the subscription registered as `handler`.
    fn handle_event(
        &mut self,
        handler: HandlerKey,
        event: &Event,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), ModuleError>;

    /// Inactive modules register no subscriptions and produce no report,
    /// but remain available to their dependents.
    fn is_active(&self) -> bool {
        true
    }

    /// Called once after the last event, in dependency order.
    fn finish(&mut self, _ctx: &DispatchContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Serializable derived state for external consumers
    fn report(&self) -> Option<serde_json::Value> {
        None
    }
}

/// One (filter, handler) pair registered by a module.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub filter: EventFilter,
    pub handler: HandlerKey,
}

/// Collects the subscriptions of a single module, in registration order.
#[derive(Debug, Default)]
pub struct Subscriptions {
    entries: Vec<Subscription>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route events matching `filter` to `handler`
    pub fn on(&mut self, filter: EventFilter, handler: HandlerKey) -> &mut Self {
        self.entries.push(Subscription { filter, handler });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn into_inner(self) -> Vec<Subscription> {
        self.entries
    }
}

/// Render a caught panic payload as text
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Ok(s) = payload.downcast::<String>() {
        *s
    } else {
        "unknown panic".to_string()
    }
}
