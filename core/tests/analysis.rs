//! End-to-end runs through the public API

use aegis_core::{
    AbilityTotals, Analysis, AnalysisConfig, AnalysisError, BuffUptime, CooldownThroughputTracker,
    DispatchContext, Event, EventFilter, EventKind, HandlerKey, Module, ModuleDefinition,
    ModuleError, RegistryError, RelationFlags, Subscriptions, SummaryKind, analyze_batch,
};

const PLAYER: i64 = 1;
const ENEMY: i64 = 99;
const COOLDOWN: i64 = 5217;
const BUFF: i64 = 205766;

const CONFIG: &str = r#"
tracked_actor = 1
normalizers = ["prepull_buffs", "cast_order"]

[modules.buff_uptime]
buffs = [205766]

[cooldowns]
excluded_abilities = [199]

[[cooldowns.cooldowns]]
ability_id = 5217
summary = ["damage"]
"#;

fn config() -> AnalysisConfig {
    toml::from_str(CONFIG).expect("valid config")
}

fn hit(timestamp: i64, ability_id: i64, amount: f64) -> Event {
    Event::damage(timestamp, PLAYER, ENEMY, ability_id, amount)
        .with_relation(RelationFlags::BY_PLAYER | RelationFlags::TO_ENEMY)
}

fn encounter() -> Vec<Event> {
    vec![
        Event::cast(0, PLAYER, COOLDOWN),
        hit(3, 10, 100.0),
        hit(4, 199, 400.0),
        // Damage logged ahead of its own cast
        hit(8, COOLDOWN, 25.0),
        Event::cast(8, PLAYER, COOLDOWN),
        // Buff was up before the pull
        Event::buff_remove(10, PLAYER, BUFF),
        hit(20, 10, 50.0),
    ]
}

/// Fails on the first damage event it sees
struct Brittle;

impl Module for Brittle {
    fn subscribe(&self, subscriptions: &mut Subscriptions) {
        subscriptions.on(EventFilter::of_kind(EventKind::Damage), "damage");
    }

    fn handle_event(
        &mut self,
        _handler: HandlerKey,
        _event: &Event,
        _ctx: &DispatchContext<'_>,
    ) -> Result<(), ModuleError> {
        Err(ModuleError::failed("unsupported ability"))
    }

    fn report(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!("never reported"))
    }
}

#[test]
fn test_full_pipeline() {
    let analysis = Analysis::from_config(config())
        .expect("known normalizers")
        .module(ModuleDefinition::new("brittle", |_deps, _options| Ok(Brittle)));

    let result = analysis.run(encounter()).expect("valid run");

    // Cast order moved the cast ahead of its damage, so window #2 owns it
    let tracker = result
        .get::<CooldownThroughputTracker>(CooldownThroughputTracker::NAME)
        .expect("tracker");
    let windows = tracker.windows(COOLDOWN);
    assert_eq!(windows.len(), 2);
    assert_eq!((windows[0].opened_at, windows[0].closed_at), (0, Some(8)));
    assert_eq!(windows[0].summary(SummaryKind::Damage), 100.0);
    assert_eq!((windows[1].opened_at, windows[1].closed_at), (8, Some(20)));
    assert_eq!(windows[1].summary(SummaryKind::Damage), 75.0);
    drop(tracker);

    // Pre-pull apply gives the buff 10ms of a 20ms fight
    let uptime = result.get::<BuffUptime>(BuffUptime::NAME).expect("uptime");
    assert_eq!(uptime.uptime_pct(BUFF), Some(0.5));
    drop(uptime);

    let totals = result.get::<AbilityTotals>(AbilityTotals::NAME).expect("totals");
    assert_eq!(totals.total_damage(), 575.0);
    drop(totals);

    // The failing module is gone; everything else reported
    assert_eq!(result.failures().len(), 1);
    assert_eq!(result.failures()[0].module, "brittle");
    let report = result.report();
    assert!(!report.modules.contains_key("brittle"));
    assert!(report.modules.contains_key("ability_totals"));
    assert!(report.modules.contains_key("cooldown_throughput"));
    assert_eq!(report.tracked_actor, Some(PLAYER));
    assert_eq!(report.events, 8);
}

#[test]
fn test_tracked_actor_is_inferred_from_relation_flags() {
    let mut config = config();
    config.tracked_actor = None;

    let result = Analysis::from_config(config)
        .expect("known normalizers")
        .run(encounter())
        .expect("valid run");
    assert_eq!(result.tracked_actor(), Some(PLAYER));
}

#[test]
fn test_cycle_aborts_before_dispatch() {
    let analysis = Analysis::new(AnalysisConfig::default())
        .module(ModuleDefinition::new("a", |_deps, _options| Ok(Brittle)).depends_on("b"))
        .module(ModuleDefinition::new("b", |_deps, _options| Ok(Brittle)).depends_on("a"));

    let err = analysis.run(encounter()).expect_err("cycle");
    assert_eq!(
        err,
        AnalysisError::Registry(RegistryError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()]
        })
    );
}

#[test]
fn test_unknown_normalizer_is_rejected() {
    let mut config = config();
    config.normalizers.push("rewind".into());
    assert!(matches!(
        Analysis::from_config(config),
        Err(AnalysisError::Normalize(_))
    ));
}

#[test]
fn test_batch_runs_are_independent() {
    let analysis = Analysis::from_config(config()).expect("known normalizers");
    let short: Vec<Event> = encounter().into_iter().take(2).collect();

    let reports = analyze_batch(&analysis, vec![encounter(), short, encounter()]);

    assert_eq!(reports.len(), 3);
    let events: Vec<_> = reports
        .iter()
        .map(|r| r.as_ref().map(|report| report.events).expect("valid run"))
        .collect();
    assert_eq!(events, vec![8, 2, 8]);
    assert_eq!(reports[0], reports[2]);
}
