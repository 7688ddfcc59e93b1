use std::cell::Ref;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;
use tracing::{debug, warn};

use crate::dispatch::DispatchContext;
use crate::events::Event;

use super::deps::SharedModule;
use super::{AsAny, HandlerKey, Module, ModuleError, Subscription, Subscriptions, panic_message};

/// Where a module stands in the current run.
#[derive(Debug)]
pub enum ModuleStatus {
    Active,
    /// Built, but opted out of events and output
    Inactive,
    Failed(ModuleError),
}

impl ModuleStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// A module that was disabled during the run, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleFailure {
    pub module: String,
    pub error: String,
}

pub(crate) struct ModuleSlot {
    pub(crate) name: String,
    /// Slot indices of declared dependencies
    pub(crate) dependencies: Vec<usize>,
    pub(crate) instance: Option<SharedModule>,
    pub(crate) status: ModuleStatus,
}

/// The instantiated modules of one run, in dependency order.
pub struct ModuleSet {
    slots: Vec<ModuleSlot>,
}

impl std::fmt::Debug for ModuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|s| (&s.name, &s.status)))
            .finish()
    }
}

impl ModuleSet {
    pub(crate) fn new(slots: Vec<ModuleSlot>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Module names in instantiation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_str())
    }

    pub fn status(&self, name: &str) -> Option<&ModuleStatus> {
        self.slot(name).map(|s| &s.status)
    }

    /// Borrow a module that is still healthy, as its concrete type
    pub fn get<T: Module>(&self, name: &str) -> Option<Ref<'_, T>> {
        let slot = self.slot(name)?;
        if slot.status.is_failed() {
            return None;
        }
        let cell = slot.instance.as_ref()?;
        let guard = cell.try_borrow().ok()?;
        Ref::filter_map(guard, |module| module.as_any().downcast_ref::<T>()).ok()
    }

    pub fn failures(&self) -> Vec<ModuleFailure> {
        self.slots
            .iter()
            .filter_map(|slot| match &slot.status {
                ModuleStatus::Failed(error) => Some(ModuleFailure {
                    module: slot.name.clone(),
                    error: error.to_string(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Reports of every active, non-failed module, keyed by module name
    pub fn reports(&self) -> BTreeMap<String, serde_json::Value> {
        let mut reports = BTreeMap::new();
        for slot in &self.slots {
            if !matches!(slot.status, ModuleStatus::Active) {
                continue;
            }
            let Some(cell) = slot.instance.as_ref() else {
                continue;
            };
            let Ok(module) = cell.try_borrow() else {
                continue;
            };
            match catch_unwind(AssertUnwindSafe(|| module.report())) {
                Ok(Some(report)) => {
                    reports.insert(slot.name.clone(), report);
                }
                Ok(None) => {}
                Err(payload) => {
                    warn!(module = %slot.name, panic = %panic_message(payload), "report panicked");
                }
            }
        }
        reports
    }

    // ─── Dispatcher hooks ───────────────────────────────────────────────────

    /// Collect subscriptions of active modules, in instantiation order and
    /// then registration order. Each entry carries its slot index.
    pub(crate) fn subscriptions(&mut self) -> Vec<(usize, Subscription)> {
        let mut all = Vec::new();
        for index in 0..self.slots.len() {
            if !matches!(self.slots[index].status, ModuleStatus::Active) {
                continue;
            }
            let Some(cell) = self.slots[index].instance.clone() else {
                continue;
            };
            let mut subscriptions = Subscriptions::new();
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                cell.borrow().subscribe(&mut subscriptions);
            }));
            match outcome {
                Ok(()) => {
                    debug!(
                        module = %self.slots[index].name,
                        count = subscriptions.len(),
                        "subscribed"
                    );
                    all.extend(subscriptions.into_inner().into_iter().map(|s| (index, s)));
                }
                Err(payload) => {
                    self.mark_failed(index, ModuleError::Panicked(panic_message(payload)));
                }
            }
        }
        all
    }

    pub(crate) fn is_active(&self, index: usize) -> bool {
        matches!(self.slots[index].status, ModuleStatus::Active)
    }

    /// Deliver one event to one module handler. Errors and panics disable
    /// the module and its dependents.
    pub(crate) fn handle(
        &mut self,
        index: usize,
        handler: HandlerKey,
        event: &Event,
        ctx: &DispatchContext<'_>,
    ) {
        let Some(cell) = self.slots[index].instance.clone() else {
            return;
        };
        let result = match cell.try_borrow_mut() {
            Ok(mut module) => {
                catch_unwind(AssertUnwindSafe(|| module.handle_event(handler, event, ctx)))
                    .unwrap_or_else(|payload| Err(ModuleError::Panicked(panic_message(payload))))
            }
            Err(_) => Err(ModuleError::DependencyBusy {
                dependency: self.slots[index].name.clone(),
            }),
        };
        if let Err(error) = result {
            warn!(
                module = %self.slots[index].name,
                handler,
                timestamp = event.timestamp,
                %error,
                "handler failed, disabling module"
            );
            self.mark_failed(index, error);
        }
    }

    /// Run `Module::finish` for every surviving module, in dependency order
    pub(crate) fn finish(&mut self, ctx: &DispatchContext<'_>) {
        for index in 0..self.slots.len() {
            if self.slots[index].status.is_failed() {
                continue;
            }
            let Some(cell) = self.slots[index].instance.clone() else {
                continue;
            };
            let result = match cell.try_borrow_mut() {
                Ok(mut module) => catch_unwind(AssertUnwindSafe(|| module.finish(ctx)))
                    .unwrap_or_else(|payload| Err(ModuleError::Panicked(panic_message(payload)))),
                Err(_) => Err(ModuleError::DependencyBusy {
                    dependency: self.slots[index].name.clone(),
                }),
            };
            if let Err(error) = result {
                warn!(module = %self.slots[index].name, %error, "finish failed, disabling module");
                self.mark_failed(index, error);
            }
        }
    }

    /// Disable a module and, transitively, every module depending on it.
    fn mark_failed(&mut self, index: usize, error: ModuleError) {
        self.slots[index].status = ModuleStatus::Failed(error);

        // Slots are topologically ordered, so one forward pass reaches every
        // transitive dependent.
        for later in index + 1..self.slots.len() {
            if self.slots[later].status.is_failed() {
                continue;
            }
            let failed_dependency = self.slots[later]
                .dependencies
                .iter()
                .find(|&&d| self.slots[d].status.is_failed())
                .map(|&d| self.slots[d].name.clone());
            if let Some(dependency) = failed_dependency {
                warn!(
                    module = %self.slots[later].name,
                    %dependency,
                    "dependency failed, disabling module"
                );
                self.slots[later].status =
                    ModuleStatus::Failed(ModuleError::DependencyFailed { dependency });
            }
        }
    }

    fn slot(&self, name: &str) -> Option<&ModuleSlot> {
        self.slots.iter().find(|s| s.name == name)
    }
}
