use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, warn};

use super::deps::SharedModule;
use super::set::{ModuleSet, ModuleSlot, ModuleStatus};
use super::{Dependencies, Module, ModuleError, ModuleOptions, RegistryError, panic_message};

type Factory = Arc<
    dyn Fn(&Dependencies<'_>, &ModuleOptions) -> Result<SharedModule, ModuleError> + Send + Sync,
>;

/// Blueprint for one module: its name, declared dependencies, options, and
/// the factory that builds it.
///
/// Definitions are `Send + Sync` and can be shared by any number of runs;
/// each run builds its own instances.
#[derive(Clone)]
pub struct ModuleDefinition {
    name: String,
    dependencies: Vec<String>,
    options: ModuleOptions,
    factory: Factory,
}

impl std::fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ModuleDefinition {
    pub fn new<M, F>(name: impl Into<String>, factory: F) -> Self
    where
        M: Module,
        F: Fn(&Dependencies<'_>, &ModuleOptions) -> Result<M, ModuleError> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |deps, options| {
            let module = factory(deps, options)?;
            let shared: SharedModule = Rc::new(RefCell::new(module));
            Ok(shared)
        });
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            options: ModuleOptions::default(),
            factory,
        }
    }

    /// Declare a dependency on another module by name
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.dependencies.contains(&name) {
            self.dependencies.push(name);
        }
        self
    }

    pub fn with_options(mut self, options: ModuleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn options(&self) -> &ModuleOptions {
        &self.options
    }
}

/// A validated set of module definitions with a resolved construction order.
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    definitions: Vec<ModuleDefinition>,
    /// Indices into `definitions`, every module after its dependencies
    order: Vec<usize>,
}

impl ModuleRegistry {
    /// Validate definitions and resolve the dependency graph.
    ///
    /// Fails on duplicate names, unknown dependencies, or cycles. No factory
    /// runs here.
    pub fn new(
        definitions: impl IntoIterator<Item = ModuleDefinition>,
    ) -> Result<Self, RegistryError> {
        let definitions: Vec<_> = definitions.into_iter().collect();

        let mut index = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if index.insert(def.name.as_str(), i).is_some() {
                return Err(RegistryError::DuplicateModule {
                    name: def.name.clone(),
                });
            }
        }

        for def in &definitions {
            if let Some(missing) = def
                .dependencies
                .iter()
                .find(|d| !index.contains_key(d.as_str()))
            {
                return Err(RegistryError::UnknownDependency {
                    module: def.name.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        let order = resolve_order(&definitions, &index)?;
        debug!(
            order = ?order.iter().map(|&i| definitions[i].name.as_str()).collect::<Vec<_>>(),
            "resolved module order"
        );

        Ok(Self { definitions, order })
    }

    /// Module names in construction order
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|&i| self.definitions[i].name.as_str())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Build every module once, in resolved order.
    ///
    /// A module whose factory fails (or panics), or any of whose dependencies
    /// failed, is recorded as failed; construction of the others continues.
    pub fn instantiate(&self) -> ModuleSet {
        let mut instances: HashMap<String, SharedModule> = HashMap::new();
        let mut slots: Vec<ModuleSlot> = Vec::with_capacity(self.order.len());
        let mut failed: HashSet<&str> = HashSet::new();

        for &i in &self.order {
            let def = &self.definitions[i];
            let dependencies = def
                .dependencies
                .iter()
                .filter_map(|d| slots.iter().position(|s| s.name == *d))
                .collect();

            let result = match def.dependencies.iter().find(|d| failed.contains(d.as_str())) {
                Some(dependency) => Err(ModuleError::DependencyFailed {
                    dependency: dependency.clone(),
                }),
                None => {
                    let deps = Dependencies::new(&def.name, &def.dependencies, &instances);
                    catch_unwind(AssertUnwindSafe(|| (def.factory)(&deps, &def.options)))
                        .unwrap_or_else(|payload| {
                            Err(ModuleError::Panicked(panic_message(payload)))
                        })
                }
            };

            let (instance, status) = match result {
                Ok(module) => {
                    let status = if module.borrow().is_active() {
                        ModuleStatus::Active
                    } else {
                        debug!(module = %def.name, "module inactive");
                        ModuleStatus::Inactive
                    };
                    instances.insert(def.name.clone(), Rc::clone(&module));
                    (Some(module), status)
                }
                Err(error) => {
                    warn!(module = %def.name, %error, "module construction failed");
                    failed.insert(def.name.as_str());
                    (None, ModuleStatus::Failed(error))
                }
            };

            slots.push(ModuleSlot {
                name: def.name.clone(),
                dependencies,
                instance,
                status,
            });
        }

        ModuleSet::new(slots)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Depth-first post-order over declaration order. Deterministic for a given
/// definition list.
fn resolve_order(
    definitions: &[ModuleDefinition],
    index: &HashMap<&str, usize>,
) -> Result<Vec<usize>, RegistryError> {
    let mut marks = vec![Mark::Unvisited; definitions.len()];
    let mut stack = Vec::new();
    let mut order = Vec::with_capacity(definitions.len());

    for i in 0..definitions.len() {
        visit(i, definitions, index, &mut marks, &mut stack, &mut order)?;
    }
    Ok(order)
}

fn visit(
    i: usize,
    definitions: &[ModuleDefinition],
    index: &HashMap<&str, usize>,
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> Result<(), RegistryError> {
    match marks[i] {
        Mark::Done => return Ok(()),
        Mark::Visiting => {
            let start = stack.iter().position(|&s| s == i).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..]
                .iter()
                .map(|&s| definitions[s].name.clone())
                .collect();
            cycle.push(definitions[i].name.clone());
            return Err(RegistryError::CyclicDependency { cycle });
        }
        Mark::Unvisited => {}
    }

    marks[i] = Mark::Visiting;
    stack.push(i);

    for dep in &definitions[i].dependencies {
        let Some(&d) = index.get(dep.as_str()) else {
            return Err(RegistryError::UnknownDependency {
                module: definitions[i].name.clone(),
                dependency: dep.clone(),
            });
        };
        visit(d, definitions, index, marks, stack, order)?;
    }

    stack.pop();
    marks[i] = Mark::Done;
    order.push(i);
    Ok(())
}
