//! Worker recommendation by fixed linear weighted scoring.
//!
//! Each eligible candidate gets
//!
//! ```text
//! total = 0.5·skill + 0.3·(1 − fatigue) + 0.2·max(0, 1 − path / 141)
//! ```
//!
//! where `path` is the walking distance from [`crate::pathfinding`] on the
//! current floor grid. Candidates missing a required skill are dropped before
//! scoring. The strictly highest total wins; ties keep input order.

use serde::{Deserialize, Serialize};

use crate::constants::scoring::{
    DISTANCE_NORMALIZER, WEIGHT_DISTANCE, WEIGHT_FATIGUE, WEIGHT_SKILL,
};
use crate::layout::OccupancyGrid;
use crate::model::{TaskSnapshot, WorkerSnapshot};
use crate::pathfinding::{distance_between, PathConfig};
use crate::skills::skill_match;

/// Factor weights. Defaults are the product's fixed weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub skill: f32,
    pub fatigue: f32,
    pub distance: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill: WEIGHT_SKILL,
            fatigue: WEIGHT_FATIGUE,
            distance: WEIGHT_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// Path length at which the distance factor reaches zero.
    pub distance_normalizer: f32,
    pub path: PathConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            distance_normalizer: DISTANCE_NORMALIZER,
            path: PathConfig::default(),
        }
    }
}

/// Per-factor scores for one eligible candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub worker_id: String,
    pub worker_name: String,
    pub skill: f32,
    pub fatigue: f32,
    pub distance: f32,
    /// Walking distance used for the distance factor.
    pub path_length: f32,
    pub total: f32,
}

/// The winning candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub worker_id: String,
    pub worker_name: String,
    pub score: f32,
}

/// Scorer outcome. "No suitable worker" is a value, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    Recommended(ScoreResult),
    NoSuitableWorker,
}

/// Wire shape consumed by the dashboard and the assignment step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub recommended_worker_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Recommendation {
    pub fn worker_id(&self) -> Option<&str> {
        match self {
            Recommendation::Recommended(r) => Some(&r.worker_id),
            Recommendation::NoSuitableWorker => None,
        }
    }

    pub fn to_response(&self) -> RecommendationResponse {
        match self {
            Recommendation::Recommended(r) => RecommendationResponse {
                recommended_worker_id: Some(r.worker_id.clone()),
                score: Some(r.score),
                worker_name: Some(r.worker_name.clone()),
                message: None,
            },
            Recommendation::NoSuitableWorker => RecommendationResponse {
                recommended_worker_id: None,
                score: None,
                worker_name: None,
                message: Some("No suitable worker found.".to_string()),
            },
        }
    }
}

/// Score one candidate, or `None` if the skill filter excludes it.
pub fn score_worker(
    task: &TaskSnapshot,
    worker: &WorkerSnapshot,
    grid: &OccupancyGrid,
    config: &ScoringConfig,
) -> Option<ScoreBreakdown> {
    let skill = skill_match(task.required_skill_id.as_deref(), &worker.skills).score()?;
    let fatigue = 1.0 - worker.fatigue();

    let path_length = distance_between(
        grid,
        worker.position().as_tuple(),
        task.position().as_tuple(),
        &config.path,
    )
    .value();
    let distance = distance_factor(path_length, config.distance_normalizer);

    let w = &config.weights;
    let total = w.skill * skill + w.fatigue * fatigue + w.distance * distance;

    Some(ScoreBreakdown {
        worker_id: worker.id.clone(),
        worker_name: worker.name.clone(),
        skill,
        fatigue,
        distance,
        path_length,
        total,
    })
}

/// All eligible candidates, best first. Equal totals keep input order.
pub fn rank_workers(
    task: &TaskSnapshot,
    candidates: &[WorkerSnapshot],
    grid: &OccupancyGrid,
    config: &ScoringConfig,
) -> Vec<ScoreBreakdown> {
    let mut ranked: Vec<ScoreBreakdown> = candidates
        .iter()
        .filter_map(|w| score_worker(task, w, grid, config))
        .collect();
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
    ranked
}

/// Pick the best candidate for a task.
///
/// Callers pre-filter to AVAILABLE workers of the task's facility.
pub fn recommend_worker(
    task: &TaskSnapshot,
    candidates: &[WorkerSnapshot],
    grid: &OccupancyGrid,
    config: &ScoringConfig,
) -> Recommendation {
    let position = task.position();
    log::debug!(
        "Scoring {} candidates for task {} at [{:.1}, {:.1}]",
        candidates.len(),
        task.id,
        position.x,
        position.y
    );

    let mut best: Option<ScoreBreakdown> = None;
    for worker in candidates {
        let Some(scored) = score_worker(task, worker, grid, config) else {
            log::debug!("  worker {} lacks required skill, skipped", worker.id);
            continue;
        };
        log::debug!(
            "  worker {}: skill={:.2} fatigue={:.2} dist={:.2} ({:.1} away) total={:.3}",
            scored.worker_name,
            scored.skill,
            scored.fatigue,
            scored.distance,
            scored.path_length,
            scored.total
        );
        let better = best.as_ref().map_or(true, |b| scored.total > b.total);
        if better {
            best = Some(scored);
        }
    }

    match best {
        Some(b) => Recommendation::Recommended(ScoreResult {
            worker_id: b.worker_id,
            worker_name: b.worker_name,
            score: b.total,
        }),
        None => Recommendation::NoSuitableWorker,
    }
}

fn distance_factor(path_length: f32, normalizer: f32) -> f32 {
    if normalizer <= 0.0 {
        return 0.0;
    }
    (1.0 - path_length / normalizer).max(0.0)
}
