use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use super::{AsAny, Module, ModuleError};

/// A constructed module instance, shared between its slot and dependents.
pub(crate) type SharedModule = Rc<RefCell<dyn Module>>;

/// Read-only, typed handle to a dependency.
///
/// Dependents can only borrow immutably; the owning slot is the only place a
/// module is ever borrowed mutably, and only while it handles an event.
pub struct ModuleRef<T> {
    name: Rc<str>,
    cell: SharedModule,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ModuleRef<T> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            cell: Rc::clone(&self.cell),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for ModuleRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRef")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Module> ModuleRef<T> {
    fn new(name: &str, cell: SharedModule) -> Result<Self, ModuleError> {
        let handle = Self {
            name: Rc::from(name),
            cell,
            _marker: PhantomData,
        };
        // Type is checked once here so later borrows only fail on aliasing
        handle.borrow()?;
        Ok(handle)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the dependency's current state
    pub fn borrow(&self) -> Result<Ref<'_, T>, ModuleError> {
        let guard = self
            .cell
            .try_borrow()
            .map_err(|_| ModuleError::DependencyBusy {
                dependency: self.name.to_string(),
            })?;
        Ref::filter_map(guard, |module| module.as_any().downcast_ref::<T>()).map_err(|_| {
            ModuleError::WrongType {
                dependency: self.name.to_string(),
                expected: std::any::type_name::<T>(),
            }
        })
    }
}

/// The resolved dependencies handed to a module factory.
///
/// Only dependencies the definition declared can be looked up.
pub struct Dependencies<'a> {
    requester: &'a str,
    declared: &'a [String],
    instances: &'a HashMap<String, SharedModule>,
}

impl<'a> Dependencies<'a> {
    pub(crate) fn new(
        requester: &'a str,
        declared: &'a [String],
        instances: &'a HashMap<String, SharedModule>,
    ) -> Self {
        Self {
            requester,
            declared,
            instances,
        }
    }

    /// Typed handle to the declared dependency `name`
    pub fn get<T: Module>(&self, name: &str) -> Result<ModuleRef<T>, ModuleError> {
        if !self.declared.iter().any(|d| d == name) {
            return Err(ModuleError::UndeclaredDependency {
                requester: self.requester.to_string(),
                dependency: name.to_string(),
            });
        }
        let cell = self
            .instances
            .get(name)
            .ok_or_else(|| ModuleError::DependencyFailed {
                dependency: name.to_string(),
            })?;
        ModuleRef::new(name, Rc::clone(cell))
    }

    /// Names of the declared dependencies, in declaration order
    pub fn declared(&self) -> &[String] {
        self.declared
    }
}
