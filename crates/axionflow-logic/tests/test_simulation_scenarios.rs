//! Integration tests for the staffing simulation.
//!
//! Runs the demo floor's bundled scenarios through the store-backed entry
//! point, then sweeps randomized scenarios for the properties every run must
//! satisfy.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use axionflow_logic::constants::simulation::{DAY_MINUTES, MAX_DAYS};
use axionflow_logic::error::SimulationError;
use axionflow_logic::events::{AlertLevel, ChangeEvent, MemoryNotifier, NoopNotifier};
use axionflow_logic::model::WorkerSnapshot;
use axionflow_logic::simulation::{
    run_simulation, simulate_facility, Difficulty, RiskLevel, SimulationConfig, SimulationRequest,
};
use axionflow_logic::store::InMemoryStore;

const DEMO_FLOOR: &str = include_str!("../../../data/demo_floor.json");

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scenario {
    name: String,
    request: SimulationRequest,
    expect_risk: RiskLevel,
}

#[derive(Deserialize)]
struct Fixture {
    scenarios: Vec<Scenario>,
}

// ── Helpers ────────────────────────────────────────────────────────────

fn crew(fatigue: &[f32]) -> Vec<WorkerSnapshot> {
    fatigue
        .iter()
        .enumerate()
        .map(|(i, f)| WorkerSnapshot::new(format!("w{i}"), format!("Worker {i}")).with_fatigue(*f))
        .collect()
}

fn ticks(request: &SimulationRequest, workforce: &[WorkerSnapshot]) -> u32 {
    run_simulation(request, workforce, &SimulationConfig::default(), &NoopNotifier)
        .unwrap()
        .estimated_completion_ticks
}

// ── Demo scenarios ─────────────────────────────────────────────────────

#[test]
fn demo_scenarios_reach_expected_risk() {
    let store = InMemoryStore::from_json_str(DEMO_FLOOR).unwrap();
    let fixture: Fixture = serde_json::from_str(DEMO_FLOOR).unwrap();
    assert_eq!(fixture.scenarios.len(), 3);

    for scenario in &fixture.scenarios {
        let report = simulate_facility(
            &store,
            &scenario.request,
            &SimulationConfig::default(),
            &NoopNotifier,
        )
        .unwrap();
        assert_eq!(report.risk_level, scenario.expect_risk, "{}", scenario.name);
    }
}

#[test]
fn absent_workers_do_not_count() {
    let store = InMemoryStore::from_json_str(DEMO_FLOOR).unwrap();
    let request = SimulationRequest::new("plant-a", 40, Difficulty::Medium);
    let from_store =
        simulate_facility(&store, &request, &SimulationConfig::default(), &NoopNotifier).unwrap();

    // Ana, Ben, Cho and Dev; Eli is absent
    let present = crew(&[0.1, 0.6, 0.2, 0.05]);
    let direct =
        run_simulation(&request, &present, &SimulationConfig::default(), &NoopNotifier).unwrap();
    assert_eq!(from_store, direct);
}

#[test]
fn unknown_facility_has_no_workforce() {
    let store = InMemoryStore::from_json_str(DEMO_FLOOR).unwrap();
    let request = SimulationRequest::new("plant-z", 10, Difficulty::Low);
    let err = simulate_facility(&store, &request, &SimulationConfig::default(), &NoopNotifier);
    assert_eq!(err, Err(SimulationError::NoWorkforce("plant-z".into())));
}

#[test]
fn critical_run_raises_alert() {
    let store = InMemoryStore::from_json_str(DEMO_FLOOR).unwrap();
    let sink = MemoryNotifier::new();
    let request = SimulationRequest::new("plant-b", 100, Difficulty::High);
    let report = simulate_facility(&store, &request, &SimulationConfig::default(), &sink).unwrap();
    assert_eq!(report.risk_level, RiskLevel::Critical);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        ChangeEvent::Alert { facility_id, level, message } => {
            assert_eq!(facility_id, "plant-b");
            assert_eq!(*level, AlertLevel::Critical);
            assert!(message.contains("Deadline Missed"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn report_serializes_in_camel_case() {
    let request = SimulationRequest::new("f1", 10, Difficulty::Medium);
    let report =
        run_simulation(&request, &crew(&[0.0, 0.0]), &SimulationConfig::default(), &NoopNotifier).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["riskLevel"], "LOW");
    assert!(json["timeSeries"][0]["timeLabel"].is_string());
    assert!(json["estimatedCompletionTicks"].is_u64());
    assert!(json["lateTaskCount"].is_u64());
}

// ── Monotonicity ───────────────────────────────────────────────────────

#[test]
fn more_workers_never_take_longer() {
    let request = SimulationRequest::new("f1", 60, Difficulty::Medium).shift(10.0).deadline(48.0);
    let mut previous = u32::MAX;
    for n in 1..=8 {
        let t = ticks(&request, &crew(&vec![0.2; n]));
        assert!(t <= previous, "{n} workers took {t} ticks, fewer took {previous}");
        previous = t;
    }
}

#[test]
fn harder_work_never_finishes_sooner() {
    let workforce = crew(&[0.0, 0.3, 0.5]);
    let at = |d: Difficulty| ticks(&SimulationRequest::new("f1", 45, d), &workforce);
    assert!(at(Difficulty::Low) <= at(Difficulty::Medium));
    assert!(at(Difficulty::Medium) <= at(Difficulty::High));
}

// ── Randomized sweep ───────────────────────────────────────────────────

#[test]
fn randomized_runs_hold_invariants() {
    let mut rng = StdRng::seed_from_u64(42);
    let config = SimulationConfig::default();
    let cap = MAX_DAYS * DAY_MINUTES;

    for _ in 0..60 {
        let n = rng.gen_range(1..6);
        let fatigue: Vec<f32> = (0..n).map(|_| rng.gen_range(0.0..1.0)).collect();
        let difficulty = match rng.gen_range(0..3) {
            0 => Difficulty::Low,
            1 => Difficulty::Medium,
            _ => Difficulty::High,
        };
        let request = SimulationRequest::new("f1", rng.gen_range(0..150), difficulty)
            .shift(rng.gen_range(1..=12) as f64)
            .deadline(rng.gen_range(4..=96) as f64);

        let report = run_simulation(&request, &crew(&fatigue), &config, &NoopNotifier).unwrap();

        assert!(report.estimated_completion_minutes <= cap);
        assert_eq!(
            report.estimated_completion_minutes,
            report.estimated_completion_ticks * config.tick_minutes
        );
        assert!(report.tasks_completed <= request.task_count);

        let mut last = request.task_count;
        for sample in &report.time_series {
            assert!(sample.tasks_remaining <= last);
            assert!((0.0..=100.0).contains(&sample.avg_fatigue));
            last = sample.tasks_remaining;
        }

        let missed = report.estimated_completion_minutes as f64 > request.deadline_hours * 60.0;
        assert_eq!(report.risk_level == RiskLevel::Critical, missed);
        assert_eq!(report.late_task_count > 0, missed);
        assert!(!report.recommendations.is_empty());
    }
}
