//! Tests for module registration and instantiation
//!
//! Verifies that:
//! - Modules are built after their dependencies
//! - Graph errors are reported before any factory runs
//! - Dependency access is limited to declared, healthy, correctly-typed modules
//! - Construction failures cascade to dependents only

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dispatch::DispatchContext;
use crate::events::Event;
use crate::filter::EventFilter;

use super::*;

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Minimal module carrying a value, optionally reading another Counter
struct Counter {
    value: i64,
    upstream: Option<ModuleRef<Counter>>,
}

impl Module for Counter {
    fn subscribe(&self, subscriptions: &mut Subscriptions) {
        subscriptions.on(EventFilter::any(), "count");
    }

    fn handle_event(
        &mut self,
        _handler: HandlerKey,
        _event: &Event,
        _ctx: &DispatchContext<'_>,
    ) -> Result<(), ModuleError> {
        self.value += 1;
        Ok(())
    }
}

struct Other;

impl Module for Other {
    fn subscribe(&self, _subscriptions: &mut Subscriptions) {}

    fn handle_event(
        &mut self,
        _handler: HandlerKey,
        _event: &Event,
        _ctx: &DispatchContext<'_>,
    ) -> Result<(), ModuleError> {
        Ok(())
    }
}

fn counter(name: &str) -> ModuleDefinition {
    ModuleDefinition::new(name, |_deps, options| {
        Ok(Counter {
            value: options.get_or("start", 0)?,
            upstream: None,
        })
    })
}

/// Counter that reads `upstream` at construction and starts from its value
fn chained(name: &str, upstream: &'static str) -> ModuleDefinition {
    ModuleDefinition::new(name, move |deps, _options| {
        let handle = deps.get::<Counter>(upstream)?;
        let value = handle.borrow()?.value + 1;
        Ok(Counter {
            value,
            upstream: Some(handle),
        })
    })
    .depends_on(upstream)
}

fn failing(name: &str) -> ModuleDefinition {
    ModuleDefinition::new(name, |_deps, _options| -> Result<Counter, ModuleError> {
        Err(ModuleError::failed("boom"))
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Ordering
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_dependencies_are_built_first() {
    let registry = ModuleRegistry::new([
        chained("c", "b"),
        chained("b", "a"),
        counter("a"),
    ])
    .expect("valid graph");

    assert_eq!(registry.order().collect::<Vec<_>>(), vec!["a", "b", "c"]);

    let set = registry.instantiate();
    assert!(set.failures().is_empty());
    assert_eq!(set.get::<Counter>("c").map(|c| c.value), Some(2));

    let c = set.get::<Counter>("c").expect("c built");
    let upstream = c.upstream.as_ref().expect("c holds b");
    assert_eq!(upstream.name(), "b");
    assert_eq!(upstream.borrow().map(|b| b.value).ok(), Some(1));
}

#[test]
fn test_independent_modules_keep_declaration_order() {
    let registry = ModuleRegistry::new([counter("z"), counter("m"), counter("a")]).expect("valid");
    assert_eq!(registry.order().collect::<Vec<_>>(), vec!["z", "m", "a"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Graph Errors
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cycle_is_rejected_before_any_factory_runs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let make = |name: &str, dep: &str| {
        let calls = Arc::clone(&calls);
        ModuleDefinition::new(name, move |_deps, _options| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Other)
        })
        .depends_on(dep)
    };

    let err = ModuleRegistry::new([make("a", "b"), make("b", "c"), make("c", "a")])
        .expect_err("cycle must fail");

    match &err {
        RegistryError::CyclicDependency { cycle } => {
            assert_eq!(cycle, &["a", "b", "c", "a"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "cyclic module dependency: a -> b -> c -> a");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let err = ModuleRegistry::new([counter("a").depends_on("a")]).expect_err("self cycle");
    assert_eq!(
        err,
        RegistryError::CyclicDependency {
            cycle: vec!["a".into(), "a".into()]
        }
    );
}

#[test]
fn test_unknown_dependency_is_rejected() {
    let err = ModuleRegistry::new([counter("a").depends_on("ghost")]).expect_err("unknown");
    assert_eq!(
        err,
        RegistryError::UnknownDependency {
            module: "a".into(),
            dependency: "ghost".into()
        }
    );
}

#[test]
fn test_duplicate_name_is_rejected() {
    let err = ModuleRegistry::new([counter("a"), counter("a")]).expect_err("duplicate");
    assert_eq!(err, RegistryError::DuplicateModule { name: "a".into() });
}

// ═══════════════════════════════════════════════════════════════════════════
// Options
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_options_reach_the_factory_typed() {
    let options = ModuleOptions::new().set("start", 41);
    let registry = ModuleRegistry::new([counter("a").with_options(options)]).expect("valid");

    let set = registry.instantiate();
    assert_eq!(set.get::<Counter>("a").map(|c| c.value), Some(41));
}

#[test]
fn test_option_of_wrong_type_fails_only_that_module() {
    let options = ModuleOptions::new().set("start", "not a number");
    let registry =
        ModuleRegistry::new([counter("a").with_options(options), counter("b")]).expect("valid");

    let set = registry.instantiate();
    assert!(matches!(
        set.status("a"),
        Some(ModuleStatus::Failed(ModuleError::InvalidOption { .. }))
    ));
    assert!(matches!(set.status("b"), Some(ModuleStatus::Active)));
}

// ═══════════════════════════════════════════════════════════════════════════
// Dependency Access
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_undeclared_dependency_access_fails() {
    let sneaky = ModuleDefinition::new("sneaky", |deps, _options| {
        deps.get::<Counter>("a")?;
        Ok(Other)
    });
    let set = ModuleRegistry::new([counter("a"), sneaky]).expect("valid").instantiate();

    assert!(matches!(
        set.status("sneaky"),
        Some(ModuleStatus::Failed(ModuleError::UndeclaredDependency { .. }))
    ));
}

#[test]
fn test_dependency_of_wrong_type_fails() {
    let confused = ModuleDefinition::new("confused", |deps, _options| {
        deps.get::<Other>("a")?;
        Ok(Other)
    })
    .depends_on("a");
    let set = ModuleRegistry::new([counter("a"), confused]).expect("valid").instantiate();

    assert!(matches!(
        set.status("confused"),
        Some(ModuleStatus::Failed(ModuleError::WrongType { .. }))
    ));
}

// ═══════════════════════════════════════════════════════════════════════════
// Construction Failures
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_factory_failure_cascades_to_dependents_only() {
    let set = ModuleRegistry::new([
        failing("a"),
        chained("b", "a"),
        chained("c", "b"),
        counter("d"),
    ])
    .expect("valid")
    .instantiate();

    let failures = set.failures();
    let names: Vec<_> = failures.iter().map(|f| f.module.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(failures[0].error, "boom");
    assert_eq!(failures[1].error, "dependency 'a' failed");
    assert!(set.get::<Counter>("b").is_none());
    assert!(set.get::<Counter>("d").is_some());
}

#[test]
fn test_factory_panic_is_contained() {
    let panicky = ModuleDefinition::new("panicky", |_deps, _options| -> Result<Other, ModuleError> {
        panic!("factory exploded")
    });
    let set = ModuleRegistry::new([panicky, counter("ok")]).expect("valid").instantiate();

    match set.status("panicky") {
        Some(ModuleStatus::Failed(ModuleError::Panicked(message))) => {
            assert_eq!(message, "factory exploded");
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(matches!(set.status("ok"), Some(ModuleStatus::Active)));
}

#[test]
fn test_definitions_are_reusable_across_runs() {
    let registry = ModuleRegistry::new([counter("a"), chained("b", "a")]).expect("valid");
    let first = registry.instantiate();
    let second = registry.instantiate();

    assert_eq!(first.get::<Counter>("b").map(|b| b.value), Some(1));
    assert_eq!(second.get::<Counter>("b").map(|b| b.value), Some(1));
}
