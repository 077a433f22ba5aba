//! Staffing simulation: fatigue and throughput over synthetic time.
//!
//! A deterministic loop in 30-minute ticks, capped at 30 days:
//!
//! - on-shift ticks (minute-of-day < shift length): every worker gains
//!   `0.015 × difficulty` fatigue and completes
//!   `base_speed / difficulty × tick_hours × (1 − 0.4·fatigue)` tasks;
//! - off-shift ticks: fatigue falls by 0.1, never below 0.05.
//!
//! The run stops when no tasks remain or the cap is reached, and the elapsed
//! time is compared against the deadline to classify risk and suggest
//! staffing changes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{difficulty, simulation as sim};
use crate::error::SimulationError;
use crate::events::{AlertLevel, ChangeEvent, ChangeNotifier};
use crate::model::{WorkerSnapshot, WorkerStatus};
use crate::store::{WorkerRecord, WorkforceStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Low,
    #[default]
    Medium,
    High,
}

impl Difficulty {
    /// Throughput divisor and fatigue-gain factor.
    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Low => difficulty::LOW,
            Difficulty::Medium => difficulty::MEDIUM,
            Difficulty::High => difficulty::HIGH,
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Difficulty::Low),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HIGH" => Ok(Difficulty::High),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

fn default_shift_hours() -> f64 {
    sim::DEFAULT_SHIFT_HOURS
}

fn default_deadline_hours() -> f64 {
    sim::DEFAULT_DEADLINE_HOURS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub facility_id: String,
    pub task_count: u32,
    #[serde(default)]
    pub task_difficulty: Difficulty,
    #[serde(default = "default_shift_hours")]
    pub shift_hours: f64,
    #[serde(default = "default_deadline_hours")]
    pub deadline_hours: f64,
}

impl SimulationRequest {
    pub fn new(facility_id: impl Into<String>, task_count: u32, task_difficulty: Difficulty) -> Self {
        Self {
            facility_id: facility_id.into(),
            task_count,
            task_difficulty,
            shift_hours: sim::DEFAULT_SHIFT_HOURS,
            deadline_hours: sim::DEFAULT_DEADLINE_HOURS,
        }
    }

    pub fn shift(mut self, hours: f64) -> Self {
        self.shift_hours = hours;
        self
    }

    pub fn deadline(mut self, hours: f64) -> Self {
        self.deadline_hours = hours;
        self
    }
}

/// Rates and limits of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_minutes: u32,
    pub max_days: u32,
    pub base_speed_per_hour: f64,
    pub fatigue_gain_per_tick: f64,
    pub fatigue_recovery_per_tick: f64,
    pub fatigue_floor: f64,
    pub max_fatigue_penalty: f64,
    pub max_shift_hours: f64,
    pub shift_extension_hours: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_minutes: sim::TICK_MINUTES,
            max_days: sim::MAX_DAYS,
            base_speed_per_hour: sim::BASE_SPEED_PER_HOUR,
            fatigue_gain_per_tick: sim::FATIGUE_GAIN_PER_TICK,
            fatigue_recovery_per_tick: sim::FATIGUE_RECOVERY_PER_TICK,
            fatigue_floor: sim::FATIGUE_FLOOR,
            max_fatigue_penalty: sim::MAX_FATIGUE_PENALTY,
            max_shift_hours: sim::MAX_SHIFT_HOURS,
            shift_extension_hours: sim::SHIFT_EXTENSION_HOURS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSample {
    /// `D<day> <hour>h`, days counted from 1.
    pub time_label: String,
    pub tick: u32,
    pub tasks_remaining: u32,
    /// Average fatigue in percent, one decimal.
    pub avg_fatigue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub time_series: Vec<TimeSample>,
    pub estimated_completion_ticks: u32,
    pub estimated_completion_minutes: u32,
    pub work_days: u32,
    pub tasks_completed: u32,
    pub bottleneck_risk: bool,
    pub risk_level: RiskLevel,
    pub risk_reason: String,
    pub recommendations: Vec<String>,
    /// Tasks still open when the deadline passed; 0 when it was met.
    pub late_task_count: u32,
}

/// Per-run state, owned by one call.
struct SimulationState {
    tasks_remaining: f64,
    fatigue: Vec<f64>,
    minutes: u32,
    ticks: u32,
    remaining_at_deadline: Option<f64>,
}

impl SimulationState {
    fn average_fatigue(&self) -> f64 {
        self.fatigue.iter().sum::<f64>() / self.fatigue.len() as f64
    }
}

/// Simulate a facility's non-absent workers.
pub fn simulate_facility<S: WorkforceStore>(
    store: &S,
    request: &SimulationRequest,
    config: &SimulationConfig,
    notifier: &dyn ChangeNotifier,
) -> Result<SimulationReport, SimulationError> {
    let workforce: Vec<_> = store
        .workers_in(&request.facility_id)
        .iter()
        .map(WorkerRecord::snapshot)
        .collect();
    run_simulation(request, &workforce, config, notifier)
}

/// Run one scenario. ABSENT workers are left out of the workforce; an empty
/// workforce fails before the loop starts.
pub fn run_simulation(
    request: &SimulationRequest,
    workforce: &[WorkerSnapshot],
    config: &SimulationConfig,
    notifier: &dyn ChangeNotifier,
) -> Result<SimulationReport, SimulationError> {
    let fatigue: Vec<f64> = workforce
        .iter()
        .filter(|w| w.status != WorkerStatus::Absent)
        .map(|w| w.fatigue() as f64)
        .collect();
    if fatigue.is_empty() {
        return Err(SimulationError::NoWorkforce(request.facility_id.clone()));
    }

    let mult = request.task_difficulty.multiplier();
    let tick = config.tick_minutes.max(1);
    let max_minutes = config.max_days * sim::DAY_MINUTES;
    let shift_minutes = request.shift_hours * 60.0;
    let deadline_minutes = request.deadline_hours * 60.0;

    let speed_per_hour = config.base_speed_per_hour / mult;
    let speed_per_tick = speed_per_hour * (tick as f64 / 60.0);

    let mut state = SimulationState {
        tasks_remaining: request.task_count as f64,
        fatigue,
        minutes: 0,
        ticks: 0,
        remaining_at_deadline: None,
    };
    let mut time_series = Vec::new();

    while state.tasks_remaining > 0.0 && state.minutes < max_minutes {
        if state.remaining_at_deadline.is_none() && state.minutes as f64 >= deadline_minutes {
            state.remaining_at_deadline = Some(state.tasks_remaining);
        }

        let minute_of_day = state.minutes % sim::DAY_MINUTES;
        let on_shift = (minute_of_day as f64) < shift_minutes;

        if on_shift {
            let mut throughput = 0.0;
            for f in state.fatigue.iter_mut() {
                *f = (*f + config.fatigue_gain_per_tick * mult).min(1.0);
                throughput += speed_per_tick * (1.0 - *f * config.max_fatigue_penalty);
            }
            state.tasks_remaining = (state.tasks_remaining - throughput).max(0.0);
        } else {
            for f in state.fatigue.iter_mut() {
                *f = (*f - config.fatigue_recovery_per_tick).max(config.fatigue_floor);
            }
        }

        if on_shift || minute_of_day as f64 == shift_minutes {
            time_series.push(TimeSample {
                time_label: format!(
                    "D{} {}h",
                    state.minutes / sim::DAY_MINUTES + 1,
                    minute_of_day / 60
                ),
                tick: state.ticks,
                tasks_remaining: state.tasks_remaining.round() as u32,
                avg_fatigue: (state.average_fatigue() * 1000.0).round() / 10.0,
            });
        }

        state.minutes += tick;
        state.ticks += 1;
    }

    let report = classify(request, config, &state, speed_per_hour, time_series);
    log::info!(
        "Simulation for facility {}: {} tasks, {:?}, {} workers → {} ticks, risk {}",
        request.facility_id,
        request.task_count,
        request.task_difficulty,
        state.fatigue.len(),
        report.estimated_completion_ticks,
        report.risk_level
    );

    let alert_level = match report.risk_level {
        RiskLevel::Low => None,
        RiskLevel::Medium => Some(AlertLevel::Warning),
        RiskLevel::Critical => Some(AlertLevel::Critical),
    };
    if let Some(level) = alert_level {
        notifier.notify(ChangeEvent::Alert {
            facility_id: request.facility_id.clone(),
            level,
            message: format!("Simulation risk {}: {}", report.risk_level, report.risk_reason),
        });
    }

    Ok(report)
}

fn classify(
    request: &SimulationRequest,
    config: &SimulationConfig,
    state: &SimulationState,
    speed_per_hour: f64,
    time_series: Vec<TimeSample>,
) -> SimulationReport {
    let elapsed_minutes = state.minutes as f64;
    let deadline_minutes = request.deadline_hours * 60.0;
    let missed = elapsed_minutes > deadline_minutes;

    let mut recommendations = Vec::new();
    let (risk_level, risk_reason) = if missed {
        let late_hours = (elapsed_minutes - deadline_minutes) / 60.0;

        if request.deadline_hours > 0.0 {
            let task_count = request.task_count as f64;
            let required = task_count / request.deadline_hours;
            let achieved = task_count / (elapsed_minutes / 60.0);
            let hires = ((required - achieved) / speed_per_hour).ceil();
            if hires > 0.0 {
                recommendations.push(format!("Hire {} additional workers.", hires as u64));
            }
        }
        if request.shift_hours < config.max_shift_hours {
            let extended =
                (request.shift_hours + config.shift_extension_hours).min(config.max_shift_hours);
            recommendations.push(format!(
                "Extend shift length to {} hours.",
                format_hours(extended)
            ));
        }
        (
            RiskLevel::Critical,
            format!("Deadline Missed by {late_hours:.1} hrs"),
        )
    } else if request.task_difficulty == Difficulty::High {
        recommendations.push("Schedule mandatory breaks every 2 hours.".to_string());
        (RiskLevel::Medium, "High Fatigue Risk".to_string())
    } else {
        (RiskLevel::Low, "Optimal Schedule".to_string())
    };

    if recommendations.is_empty() {
        recommendations.push("Current resources are sufficient.".to_string());
    }

    let late_task_count = if missed {
        let open = state.remaining_at_deadline.unwrap_or(state.tasks_remaining);
        whole_tasks_open(open)
    } else {
        0
    };
    let tasks_completed =
        (request.task_count as f64 - state.tasks_remaining + 1e-9).floor().max(0.0) as u32;

    SimulationReport {
        time_series,
        estimated_completion_ticks: state.ticks,
        estimated_completion_minutes: state.minutes,
        work_days: state.minutes.div_ceil(sim::DAY_MINUTES),
        tasks_completed,
        bottleneck_risk: risk_level != RiskLevel::Low,
        risk_level,
        risk_reason,
        recommendations,
        late_task_count,
    }
}

/// Partly finished tasks count as open.
fn whole_tasks_open(remaining: f64) -> u32 {
    (remaining - 1e-9).ceil().max(0.0) as u32
}

fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{hours:.0}")
    } else {
        format!("{hours}")
    }
}
