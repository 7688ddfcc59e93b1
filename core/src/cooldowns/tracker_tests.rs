//! Tests for CooldownThroughputTracker
//!
//! Verifies that:
//! - A use opens a window and the next use replaces it (last use wins)
//! - Open windows capture the actor's events unless excluded
//! - Fixed-duration windows close once their duration elapses
//! - End of log closes everything still open

use aegis_types::{CooldownTrackerConfig, SummaryKind, TrackedCooldown};

use crate::dispatch::EventDispatcher;
use crate::events::{Event, EventKind, EventLog};
use crate::modules::{ModuleDefinition, ModuleRegistry};

use super::{CooldownThroughputTracker, ExclusionRule};

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

const PLAYER: i64 = 1;
const OTHER: i64 = 2;
const PET: i64 = 10;
const ENEMY: i64 = 99;
const COOLDOWN: i64 = 5217;
const DECOY: i64 = 199;

fn config(cooldowns: Vec<TrackedCooldown>) -> CooldownTrackerConfig {
    CooldownTrackerConfig {
        cooldowns,
        excluded_abilities: Vec::new(),
        include_pets: false,
    }
}

fn damage_cooldown() -> TrackedCooldown {
    TrackedCooldown::new(COOLDOWN, [SummaryKind::Damage])
}

/// Run a tracker through the dispatcher and hand back its final state
fn run(tracker: CooldownThroughputTracker, events: Vec<Event>) -> CooldownThroughputTracker {
    run_tracking(tracker, events, None)
}

fn run_tracking(
    tracker: CooldownThroughputTracker,
    events: Vec<Event>,
    tracked_actor: Option<i64>,
) -> CooldownThroughputTracker {
    let definition = ModuleDefinition::new(CooldownThroughputTracker::NAME, move |_deps, _options| {
        Ok(tracker.clone())
    });
    let mut set = ModuleRegistry::new([definition])
        .expect("single module")
        .instantiate();

    let mut dispatcher = EventDispatcher::new();
    if let Some(actor) = tracked_actor {
        dispatcher = dispatcher.with_tracked_actor(actor);
    }
    let outcome = dispatcher.run(&EventLog::freeze(events), &mut set);
    assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);

    set.get::<CooldownThroughputTracker>(CooldownThroughputTracker::NAME)
        .map(|t| t.clone())
        .expect("tracker survives")
}

// ═══════════════════════════════════════════════════════════════════════════
// Window Lifecycle
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_second_use_replaces_window() {
    let tracker = run(
        CooldownThroughputTracker::new(&config(vec![damage_cooldown()])),
        vec![
            Event::cast(0, PLAYER, COOLDOWN),
            Event::damage(3, PLAYER, ENEMY, 42, 100.0),
            Event::cast(8, PLAYER, COOLDOWN),
        ],
    );

    let windows = tracker.windows(COOLDOWN);
    assert_eq!(windows.len(), 2);

    assert_eq!(windows[0].opened_at, 0);
    assert_eq!(windows[0].closed_at, Some(8));
    assert_eq!(windows[0].summary(SummaryKind::Damage), 100.0);

    assert_eq!(windows[1].opened_at, 8);
    assert_eq!(windows[1].closed_at, Some(8));
    assert_eq!(windows[1].summary(SummaryKind::Damage), 0.0);
}

#[test]
fn test_opening_cast_belongs_to_new_window() {
    let tracker = run(
        CooldownThroughputTracker::new(&config(vec![damage_cooldown()])),
        vec![
            Event::cast(0, PLAYER, COOLDOWN),
            Event::cast(5, PLAYER, COOLDOWN),
            Event::cast(9, PLAYER, 7),
        ],
    );

    let windows = tracker.windows(COOLDOWN);
    assert_eq!(windows[0].events.len(), 1);
    assert_eq!(windows[0].events[0].timestamp, 0);
    let second: Vec<_> = windows[1].events.iter().map(|e| e.timestamp).collect();
    assert_eq!(second, vec![5, 9]);
}

#[test]
fn test_never_two_open_windows_per_actor() {
    let events: Vec<_> = (0..20)
        .map(|t| Event::cast(t * 3, PLAYER, COOLDOWN))
        .collect();
    let tracker = run(
        CooldownThroughputTracker::new(&config(vec![damage_cooldown()])),
        events,
    );

    let windows = tracker.windows(COOLDOWN);
    assert_eq!(windows.len(), 20);
    for pair in windows.windows(2) {
        assert_eq!(pair[0].closed_at, Some(pair[1].opened_at));
    }
    assert!(windows.iter().all(|w| !w.is_open()));
}

#[test]
fn test_windows_are_per_actor() {
    let tracker = run(
        CooldownThroughputTracker::new(&config(vec![damage_cooldown()])),
        vec![
            Event::cast(0, PLAYER, COOLDOWN),
            Event::cast(2, OTHER, COOLDOWN),
            Event::damage(3, PLAYER, ENEMY, 1, 10.0),
            Event::damage(4, OTHER, ENEMY, 1, 20.0),
            Event::cast(5, ENEMY, 1),
        ],
    );

    let windows = tracker.windows(COOLDOWN);
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].actor_id, PLAYER);
    assert_eq!(windows[0].summary(SummaryKind::Damage), 10.0);
    assert_eq!(windows[0].closed_at, Some(5));
    assert_eq!(windows[1].actor_id, OTHER);
    assert_eq!(windows[1].summary(SummaryKind::Damage), 20.0);
}

#[test]
fn test_tracked_actor_limits_window_owners() {
    let tracker = run_tracking(
        CooldownThroughputTracker::new(&config(vec![damage_cooldown()])),
        vec![Event::cast(0, PLAYER, COOLDOWN), Event::cast(1, OTHER, COOLDOWN)],
        Some(PLAYER),
    );

    let owners: Vec<_> = tracker.windows(COOLDOWN).iter().map(|w| w.actor_id).collect();
    assert_eq!(owners, vec![PLAYER]);
}

#[test]
fn test_fixed_duration_closes_window() {
    let tracker = run(
        CooldownThroughputTracker::new(&config(vec![damage_cooldown().with_duration(10)])),
        vec![
            Event::cast(0, PLAYER, COOLDOWN),
            Event::damage(9, PLAYER, ENEMY, 1, 50.0),
            Event::damage(10, PLAYER, ENEMY, 1, 70.0),
            Event::damage(30, PLAYER, ENEMY, 1, 90.0),
        ],
    );

    let windows = tracker.windows(COOLDOWN);
    assert_eq!(windows[0].closed_at, Some(10));
    assert_eq!(windows[0].duration(), Some(10));
    assert_eq!(windows[0].summary(SummaryKind::Damage), 50.0);
}

#[test]
fn test_end_of_log_closes_open_windows() {
    let tracker = run(
        CooldownThroughputTracker::new(&config(vec![damage_cooldown().with_duration(1_000)])),
        vec![Event::cast(0, PLAYER, COOLDOWN), Event::cast(25, PLAYER, 3)],
    );

    assert!(tracker.open_window(COOLDOWN, PLAYER).is_none());
    assert_eq!(tracker.windows(COOLDOWN)[0].closed_at, Some(25));
}

// ═══════════════════════════════════════════════════════════════════════════
// Attribution
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_excluded_ability_is_never_captured() {
    let mut cfg = config(vec![damage_cooldown()]);
    cfg.excluded_abilities = vec![DECOY];
    let tracker = run(
        CooldownThroughputTracker::new(&cfg),
        vec![
            Event::cast(0, PLAYER, COOLDOWN),
            Event::damage(1, PLAYER, ENEMY, DECOY, 500.0),
            Event::damage(2, PLAYER, ENEMY, 1, 5.0),
        ],
    );

    let window = tracker.windows(COOLDOWN)[0];
    assert!(window.events.iter().all(|e| e.ability_id != Some(DECOY)));
    assert_eq!(window.summary(SummaryKind::Damage), 5.0);
}

#[test]
fn test_exclusion_predicate_vetoes_events() {
    let tracker = run(
        CooldownThroughputTracker::new(&config(vec![damage_cooldown()]))
            .with_exclusion(ExclusionRule::none().with_predicate(|e| e.synthetic)),
        vec![
            Event::cast(0, PLAYER, COOLDOWN),
            Event::damage(1, PLAYER, ENEMY, 1, 5.0).synthetic(),
            Event::damage(2, PLAYER, ENEMY, 1, 7.0),
        ],
    );

    assert_eq!(tracker.windows(COOLDOWN)[0].summary(SummaryKind::Damage), 7.0);
}

#[test]
fn test_pet_events_captured_only_when_enabled() {
    let events = vec![
        Event::cast(0, PLAYER, COOLDOWN),
        Event::damage(1, PET, ENEMY, 1, 30.0).with_owner(PLAYER),
    ];

    let without = run(
        CooldownThroughputTracker::new(&config(vec![damage_cooldown()])),
        events.clone(),
    );
    assert_eq!(without.windows(COOLDOWN)[0].summary(SummaryKind::Damage), 0.0);

    let mut cfg = config(vec![damage_cooldown()]);
    cfg.include_pets = true;
    let with = run(CooldownThroughputTracker::new(&cfg), events);
    assert_eq!(with.windows(COOLDOWN)[0].summary(SummaryKind::Damage), 30.0);
}

#[test]
fn test_summary_kinds() {
    let cooldown = TrackedCooldown::new(
        COOLDOWN,
        [
            SummaryKind::Damage,
            SummaryKind::Healing,
            SummaryKind::Overhealing,
            SummaryKind::Absorbed,
            SummaryKind::ResourceSpent,
        ],
    );
    let tracker = run(
        CooldownThroughputTracker::new(&config(vec![cooldown])),
        vec![
            Event::cast(0, PLAYER, COOLDOWN).with_resource_cost(40.0),
            Event::damage(1, PLAYER, ENEMY, 1, 100.0).with_absorbed(20.0),
            Event::heal(2, PLAYER, PLAYER, 2, 80.0).with_overheal(30.0),
            Event::new(3, EventKind::Absorb, PLAYER, OTHER)
                .with_ability(3)
                .with_amount(15.0),
        ],
    );

    let summaries = tracker.windows(COOLDOWN)[0].summaries();
    assert_eq!(summaries[&SummaryKind::Damage], 100.0);
    assert_eq!(summaries[&SummaryKind::Healing], 80.0);
    assert_eq!(summaries[&SummaryKind::Overhealing], 30.0);
    assert_eq!(summaries[&SummaryKind::Absorbed], 35.0);
    assert_eq!(summaries[&SummaryKind::ResourceSpent], 40.0);
}

#[test]
fn test_tracker_without_cooldowns_is_inactive() {
    use crate::modules::Module;

    let tracker = CooldownThroughputTracker::new(&CooldownTrackerConfig::default());
    assert!(!tracker.is_active());
    assert!(!tracker.is_tracked(COOLDOWN));
}
