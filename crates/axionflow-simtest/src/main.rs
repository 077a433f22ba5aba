//! AxionFlow Headless Harness
//!
//! Validates the matching and simulation logic against the bundled demo floor.
//! Runs entirely in-process: in-memory store, no database, no sockets.
//!
//! Usage:
//!   cargo run -p axionflow-simtest
//!   cargo run -p axionflow-simtest -- --verbose --config engine.json
//!   RUST_LOG=axionflow_logic=debug cargo run -p axionflow-simtest -- --json

use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use axionflow_logic::analytics::{facility_metrics, heatmap, LocationSample};
use axionflow_logic::assignment::{
    advance_task_progress, assign_task, recommend_and_assign, DispatchOutcome, ProgressOutcome,
};
use axionflow_logic::config::EngineConfig;
use axionflow_logic::constants::analytics::HEATMAP_BUCKETS;
use axionflow_logic::error::AssignmentError;
use axionflow_logic::events::{MemoryNotifier, NoopNotifier};
use axionflow_logic::layout::{build_grid, build_grid_with, sanitize_obstacle_strict, Obstacle};
use axionflow_logic::model::{WorkerSnapshot, WorkerStatus};
use axionflow_logic::pathfinding::{distance_between, find_path, path_distance, route_length, Cell, DistanceEstimate};
use axionflow_logic::scoring::{rank_workers, recommend_worker, Recommendation};
use axionflow_logic::simulation::{simulate_facility, RiskLevel, SimulationReport, SimulationRequest};
use axionflow_logic::store::{InMemoryStore, WorkerRecord, WorkforceStore};

// ── Demo floor (same JSON the integration tests use) ────────────────────
const DEMO_FLOOR_JSON: &str = include_str!("../../../data/demo_floor.json");

#[derive(Debug, Deserialize)]
struct DemoFloor {
    scenarios: Vec<Scenario>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scenario {
    name: String,
    request: SimulationRequest,
    expect_risk: RiskLevel,
}

#[derive(Debug, Serialize)]
struct ScenarioReport {
    name: String,
    report: SimulationReport,
}

#[derive(Parser, Debug)]
#[command(name = "axionflow-simtest", about = "Headless validation of AxionFlow matching and simulation logic")]
struct Args {
    /// Print every check, not only failures
    #[arg(short, long)]
    verbose: bool,

    /// Engine configuration overrides (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the simulation reports as JSON after the summary
    #[arg(long)]
    json: bool,

    /// Seed for the randomized distance sweep
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    match &args.config {
        Some(path) => log::info!("Engine config loaded from {}", path.display()),
        None => log::info!("Using default engine config"),
    }
    let floor: DemoFloor =
        serde_json::from_str(DEMO_FLOOR_JSON).context("parsing demo floor scenarios")?;

    println!("=== AxionFlow Matching & Simulation Harness ===\n");
    let verbose = args.verbose;
    let mut results = Vec::new();

    // 1. Layout rasterization and floor analytics
    log::info!("Phase 1: layout");
    results.extend(validate_layout(verbose)?);

    // 2. Walking distance on synthetic and demo floors
    log::info!("Phase 2: pathfinding (seed {})", args.seed);
    results.extend(validate_pathfinding(&config, args.seed, verbose)?);

    // 3. Worker recommendation
    log::info!("Phase 3: scoring");
    results.extend(validate_scoring(&config, verbose)?);

    // 4. Assignment transaction and task lifecycle
    log::info!("Phase 4: assignment");
    results.extend(validate_assignment(&config, verbose)?);

    // 5. Staffing simulation scenarios
    log::info!("Phase 5: simulation ({} scenarios)", floor.scenarios.len());
    let (sim_results, reports) = validate_simulation(&floor, &config, verbose)?;
    results.extend(sim_results);

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );
    if failed > 0 {
        log::warn!("{failed} of {total} checks failed");
    } else {
        log::info!("All {total} checks passed");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn demo_store() -> Result<InMemoryStore> {
    InMemoryStore::from_json_str(DEMO_FLOOR_JSON).context("loading demo floor into the store")
}

// ── 1. Layout ───────────────────────────────────────────────────────────

fn validate_layout(verbose: bool) -> Result<Vec<TestResult>> {
    println!("--- Layout ---");
    let mut results = Vec::new();
    let store = demo_store()?;

    let obstacles = store.facility_layout("plant-a");
    results.push(TestResult::check(
        "layout_parse_skips_bad_entries",
        obstacles.len() == 5,
        format!("{} readable obstacles", obstacles.len()),
    ));

    let grid = build_grid(&obstacles);
    let blocked = grid.blocked_count();
    results.push(TestResult::check(
        "layout_blocked_cells",
        blocked == 359,
        format!("{blocked} cells blocked"),
    ));

    let strict = build_grid_with(&obstacles, sanitize_obstacle_strict).blocked_count();
    results.push(TestResult::check(
        "layout_strict_not_wider",
        strict <= blocked,
        format!("strict {strict} vs permissive {blocked}"),
    ));

    let degenerate = build_grid(&[
        Obstacle::new(-50.0, -50.0, 0.0, 10.0),
        Obstacle::new(f32::NAN, 10.0, 5.0, 5.0),
        Obstacle::new(10.0, 10.0, -3.0, -3.0),
    ]);
    results.push(TestResult::check(
        "layout_degenerate_obstacles",
        degenerate.blocked_count() <= 25,
        format!("{} cells from degenerate input", degenerate.blocked_count()),
    ));

    let workers = store.workers_in("plant-a");
    let samples: Vec<LocationSample> = workers
        .iter()
        .map(|w| LocationSample {
            worker_id: Some(w.id.clone()),
            x: w.location.x,
            y: w.location.y,
        })
        .collect();
    let map = heatmap(&samples, HEATMAP_BUCKETS);
    let peak = map.iter().flatten().copied().fold(0.0f32, f32::max);
    results.push(TestResult::check(
        "analytics_heatmap",
        map.len() == HEATMAP_BUCKETS && peak == 1.0,
        format!("{}×{} buckets, peak {peak}", map.len(), map.len()),
    ));

    let metrics = facility_metrics(&workers, &store.tasks_in("plant-a"));
    results.push(TestResult::check(
        "analytics_metrics",
        metrics.active_workers == 4 && metrics.open_tasks == 4,
        format!(
            "{} active, {} open, {:.0}% complete",
            metrics.active_workers, metrics.open_tasks, metrics.completion_rate
        ),
    ));

    if verbose {
        for row in map.iter().rev() {
            let line: String = row
                .iter()
                .map(|v| if *v > 0.0 { '#' } else { '.' })
                .collect();
            println!("    {line}");
        }
    }

    Ok(results)
}

// ── 2. Pathfinding ──────────────────────────────────────────────────────

fn validate_pathfinding(config: &EngineConfig, seed: u64, verbose: bool) -> Result<Vec<TestResult>> {
    println!("--- Pathfinding ---");
    let mut results = Vec::new();
    let path = &config.scoring.path;

    let open = build_grid(&[]);
    let d = path_distance(&open, (0.0, 0.0), (99.0, 99.0), path);
    results.push(TestResult::check(
        "path_open_diagonal",
        (d - 99.0 * std::f32::consts::SQRT_2).abs() < 1e-2,
        format!("corner to corner = {d:.3}"),
    ));

    let same = path_distance(&open, (12.5, 40.9), (12.1, 40.2), path);
    results.push(TestResult::check(
        "path_same_cell",
        same == 0.0,
        format!("same cell = {same}"),
    ));

    let store = demo_store()?;
    let plant = build_grid(&store.facility_layout("plant-a"));
    let detour = path_distance(&plant, (30.0, 10.0), (50.0, 10.0), path);
    results.push(TestResult::check(
        "path_wall_detour",
        detour > 100.0 && detour < path.unreachable_distance,
        format!("30,10 → 50,10 around partition = {detour:.1}"),
    ));

    let pocket = build_grid(&[
        Obstacle::new(40.0, 40.0, 20.0, 1.0),
        Obstacle::new(40.0, 59.0, 20.0, 1.0),
        Obstacle::new(40.0, 40.0, 1.0, 20.0),
        Obstacle::new(59.0, 40.0, 1.0, 20.0),
    ]);
    let sealed = distance_between(&pocket, (50.0, 50.0), (10.0, 10.0), path);
    results.push(TestResult::check(
        "path_sealed_pocket",
        matches!(sealed, DistanceEstimate::Unreachable(v) if v == path.unreachable_distance),
        format!("{sealed:?}"),
    ));

    let fallback = distance_between(&pocket, (40.0, 45.0), (43.0, 49.0), path);
    results.push(TestResult::check(
        "path_blocked_endpoint_fallback",
        matches!(fallback, DistanceEstimate::Straight(v) if (v - 5.0).abs() < 1e-4),
        format!("{fallback:?}"),
    ));

    let route = find_path(&plant, Cell::new(30, 10), Cell::new(50, 10), path.diagonal);
    let walked = route.as_deref().map(route_length);
    results.push(TestResult::check(
        "path_route_matches_distance",
        walked == Some(detour),
        format!(
            "{} cells, length {:?}",
            route.as_ref().map_or(0, Vec::len),
            walked
        ),
    ));

    let mut rng = StdRng::seed_from_u64(seed);
    let mut asymmetric = 0;
    let mut below_straight = 0;
    let pairs = 200;
    for _ in 0..pairs {
        let a = (rng.gen_range(0..100) as f32, rng.gen_range(0..100) as f32);
        let b = (rng.gen_range(0..100) as f32, rng.gen_range(0..100) as f32);
        let ab = distance_between(&plant, a, b, path);
        let ba = distance_between(&plant, b, a, path);
        if ab.value() != ba.value() {
            asymmetric += 1;
        }
        let straight = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
        if ab.is_reachable() && ab.value() + 1e-3 < straight {
            below_straight += 1;
        }
    }
    results.push(TestResult::check(
        "path_symmetry_sweep",
        asymmetric == 0,
        format!("{asymmetric}/{pairs} asymmetric pairs (seed {seed})"),
    ));
    results.push(TestResult::check(
        "path_lower_bound_sweep",
        below_straight == 0,
        format!("{below_straight}/{pairs} shorter than a straight line"),
    ));

    if verbose {
        println!("    diagonal policy: {:?}", path.diagonal);
        println!("    unreachable sentinel: {}", path.unreachable_distance);
    }

    Ok(results)
}

// ── 3. Scoring ──────────────────────────────────────────────────────────

fn available_snapshots(store: &InMemoryStore, facility_id: &str) -> Vec<WorkerSnapshot> {
    store
        .workers_in(facility_id)
        .iter()
        .filter(|w| w.status == WorkerStatus::Available)
        .map(WorkerRecord::snapshot)
        .collect()
}

fn validate_scoring(config: &EngineConfig, verbose: bool) -> Result<Vec<TestResult>> {
    println!("--- Scoring ---");
    let mut results = Vec::new();
    let store = demo_store()?;
    let grid = build_grid(&store.facility_layout("plant-a"));
    let candidates = available_snapshots(&store, "plant-a");

    let weld = store
        .task("t-weld-east")
        .context("demo task t-weld-east")?
        .snapshot();
    let rec = recommend_worker(&weld, &candidates, &grid, &config.scoring);
    results.push(TestResult::check(
        "score_skill_dominates",
        rec.worker_id() == Some("w-ana"),
        format!("t-weld-east → {:?}", rec.worker_id()),
    ));

    let ranked = rank_workers(&weld, &candidates, &grid, &config.scoring);
    let in_range = ranked.iter().all(|s| (0.0..=1.0).contains(&s.total));
    results.push(TestResult::check(
        "score_filter_and_range",
        ranked.len() == 2 && in_range,
        format!("{} qualified welders, totals in [0, 1]: {in_range}", ranked.len()),
    ));

    let paint = store.task("t-paint").context("demo task t-paint")?.snapshot();
    let none = recommend_worker(&paint, &candidates, &grid, &config.scoring);
    results.push(TestResult::check(
        "score_no_suitable_worker",
        none == Recommendation::NoSuitableWorker,
        serde_json::to_string(&none.to_response())?,
    ));

    let empty = recommend_worker(&weld, &[], &grid, &config.scoring);
    results.push(TestResult::check(
        "score_empty_candidates",
        empty == Recommendation::NoSuitableWorker,
        "no candidates → no worker",
    ));

    if verbose {
        for s in &ranked {
            println!(
                "    {:<4} skill={:.2} fatigue={:.2} dist={:.2} ({:.1}) total={:.3}",
                s.worker_name, s.skill, s.fatigue, s.distance, s.path_length, s.total
            );
        }
    }

    Ok(results)
}

// ── 4. Assignment ───────────────────────────────────────────────────────

fn validate_assignment(config: &EngineConfig, verbose: bool) -> Result<Vec<TestResult>> {
    println!("--- Assignment ---");
    let mut results = Vec::new();

    let store = demo_store()?;
    let sink = MemoryNotifier::new();
    let dispatched = recommend_and_assign(&store, &sink, &config.scoring, "plant-a", "t-inspect");
    let assigned_to = match &dispatched {
        Ok(DispatchOutcome::Assigned { assignment, .. }) => Some(assignment.worker.id.clone()),
        _ => None,
    };
    results.push(TestResult::check(
        "assign_dispatch",
        assigned_to.as_deref() == Some("w-dev"),
        format!("t-inspect → {assigned_to:?}"),
    ));
    results.push(TestResult::check(
        "assign_event_order",
        sink.names() == ["task:update", "worker:update"],
        sink.names().join(", "),
    ));

    let again = assign_task(&store, &NoopNotifier, "plant-a", "t-weld-east", "w-dev");
    results.push(TestResult::check(
        "assign_busy_worker_rejected",
        matches!(again, Err(AssignmentError::WorkerUnavailable { .. })),
        format!("{:?}", again.err()),
    ));

    let takeover = assign_task(&store, &NoopNotifier, "plant-a", "t-inspect", "w-ana");
    let ana = store.worker("w-ana").map(|w| w.status);
    results.push(TestResult::check(
        "assign_running_task_keeps_worker",
        matches!(takeover, Err(AssignmentError::TaskAlreadyAssigned { .. }))
            && ana == Some(WorkerStatus::Available),
        format!("{:?}", takeover.err()),
    ));

    let cross = assign_task(&store, &NoopNotifier, "plant-a", "t-weld-east", "w-fay");
    let fay = store.worker("w-fay").map(|w| w.status);
    results.push(TestResult::check(
        "assign_cross_facility_denied",
        matches!(cross, Err(AssignmentError::PermissionDenied { .. }))
            && fay == Some(WorkerStatus::Available),
        format!("{:?}", cross.err()),
    ));

    let lifecycle = MemoryNotifier::new();
    let step = advance_task_progress(&store, &lifecycle, "plant-a", "t-assembly", 30);
    let finish = advance_task_progress(&store, &lifecycle, "plant-a", "t-assembly", 30);
    let cho = store.worker("w-cho").map(|w| w.status);
    results.push(TestResult::check(
        "lifecycle_progress_to_completion",
        matches!(step, Ok(ProgressOutcome::Advanced(_)))
            && matches!(finish, Ok(ProgressOutcome::Completed(_)))
            && cho == Some(WorkerStatus::Available),
        format!("events: {}", lifecycle.names().join(", ")),
    ));

    let race_store = demo_store()?;
    let outcomes: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = ["t-weld-east", "t-inspect"]
            .into_iter()
            .map(|task_id| {
                let store = &race_store;
                s.spawn(move || assign_task(store, &NoopNotifier, "plant-a", task_id, "w-ana"))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().map_err(|_| anyhow::anyhow!("assignment thread panicked")))
            .collect::<Result<Vec<_>>>()
    })?;
    let committed = outcomes.iter().filter(|r| r.is_ok()).count();
    results.push(TestResult::check(
        "assign_concurrent_single_commit",
        committed == 1,
        format!("{committed}/2 concurrent claims on w-ana committed"),
    ));

    if verbose {
        for event in sink.events().iter().chain(lifecycle.events().iter()) {
            println!("    {}", serde_json::to_string(event)?);
        }
    }

    Ok(results)
}

// ── 5. Simulation ───────────────────────────────────────────────────────

fn validate_simulation(
    floor: &DemoFloor,
    config: &EngineConfig,
    verbose: bool,
) -> Result<(Vec<TestResult>, Vec<ScenarioReport>)> {
    println!("--- Simulation ---");
    let mut results = Vec::new();
    let mut reports = Vec::new();
    let store = demo_store()?;

    for scenario in &floor.scenarios {
        let alerts = MemoryNotifier::new();
        let report = simulate_facility(&store, &scenario.request, &config.simulation, &alerts)
            .with_context(|| format!("scenario {}", scenario.name))?;

        results.push(TestResult::check(
            &format!("sim_{}", scenario.name.replace(' ', "_")),
            report.risk_level == scenario.expect_risk,
            format!(
                "{} ({}): {} ticks, {}",
                report.risk_level,
                report.risk_reason,
                report.estimated_completion_ticks,
                report.recommendations.join(" ")
            ),
        ));

        let alerted = !alerts.events().is_empty();
        results.push(TestResult::check(
            &format!("sim_{}_alert", scenario.name.replace(' ', "_")),
            alerted == (report.risk_level != RiskLevel::Low),
            format!("alert raised: {alerted}"),
        ));

        if verbose {
            for sample in report.time_series.iter().take(6) {
                println!(
                    "    {:<8} remaining={:<4} fatigue={:.1}%",
                    sample.time_label, sample.tasks_remaining, sample.avg_fatigue
                );
            }
        }

        reports.push(ScenarioReport {
            name: scenario.name.clone(),
            report,
        });
    }

    let first = floor.scenarios.first().context("demo floor has no scenarios")?;
    let a = simulate_facility(&store, &first.request, &config.simulation, &NoopNotifier)?;
    let b = simulate_facility(&store, &first.request, &config.simulation, &NoopNotifier)?;
    results.push(TestResult::check(
        "sim_deterministic",
        a == b,
        "identical inputs → identical reports",
    ));

    let mut nobody = first.request.clone();
    nobody.facility_id = "plant-z".into();
    let empty = simulate_facility(&store, &nobody, &config.simulation, &NoopNotifier);
    results.push(TestResult::check(
        "sim_empty_workforce",
        empty.is_err(),
        format!("{:?}", empty.err()),
    ));

    Ok((results, reports))
}
