//! Floor analytics: occupancy heatmap and facility headline metrics.

use serde::{Deserialize, Serialize};

use crate::constants::floor::GRID_SIZE;
use crate::model::TaskStatus;
use crate::store::{TaskRecord, WorkerRecord};

/// One recorded worker position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    #[serde(default)]
    pub worker_id: Option<String>,
    pub x: f32,
    pub y: f32,
}

impl LocationSample {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            worker_id: None,
            x,
            y,
        }
    }
}

/// Bucket samples into a `buckets × buckets` grid, rows by y, and scale so
/// the busiest bucket reads 1.0. Coordinates outside the floor fall into the
/// edge buckets. No samples gives an all-zero grid.
pub fn heatmap(samples: &[LocationSample], buckets: usize) -> Vec<Vec<f32>> {
    let buckets = buckets.max(1);
    let span = GRID_SIZE as f32 / buckets as f32;
    let bucket_of = |v: f32| -> usize {
        if v.is_nan() || v <= 0.0 {
            return 0;
        }
        ((v / span).floor() as usize).min(buckets - 1)
    };

    let mut counts = vec![vec![0u32; buckets]; buckets];
    for s in samples {
        counts[bucket_of(s.y)][bucket_of(s.x)] += 1;
    }

    let max = counts.iter().flatten().copied().max().unwrap_or(0).max(1) as f32;
    counts
        .into_iter()
        .map(|row| row.into_iter().map(|c| c as f32 / max).collect())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityMetrics {
    /// Workers AVAILABLE or ON_TASK.
    pub active_workers: usize,
    /// Tasks not yet COMPLETED.
    pub open_tasks: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Percent of tasks completed; 0 with no tasks.
    pub completion_rate: f32,
}

pub fn facility_metrics(workers: &[WorkerRecord], tasks: &[TaskRecord]) -> FacilityMetrics {
    let active_workers = workers.iter().filter(|w| w.status.is_active()).count();
    let completed_tasks = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    let total_tasks = tasks.len();
    let completion_rate = if total_tasks > 0 {
        completed_tasks as f32 / total_tasks as f32 * 100.0
    } else {
        0.0
    };

    FacilityMetrics {
        active_workers,
        open_tasks: total_tasks - completed_tasks,
        total_tasks,
        completed_tasks,
        completion_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::analytics::HEATMAP_BUCKETS;
    use crate::model::{Location, TaskPriority, WorkerStatus};

    #[test]
    fn test_heatmap_buckets_and_normalizes() {
        let samples = vec![
            LocationSample::new(5.0, 5.0),
            LocationSample::new(9.9, 0.0),
            LocationSample::new(55.0, 12.0),
            LocationSample::new(100.0, 100.0),
        ];
        let grid = heatmap(&samples, HEATMAP_BUCKETS);
        assert_eq!(grid.len(), 10);
        assert!(grid.iter().all(|row| row.len() == 10));
        assert_eq!(grid[0][0], 1.0);
        assert_eq!(grid[1][5], 0.5);
        assert_eq!(grid[9][9], 0.5);
        assert_eq!(grid.iter().flatten().filter(|v| **v > 0.0).count(), 3);
    }

    #[test]
    fn test_heatmap_clamps_outliers() {
        let samples = vec![LocationSample::new(-20.0, 250.0), LocationSample::new(f32::NAN, 3.0)];
        let grid = heatmap(&samples, 10);
        assert_eq!(grid[9][0], 1.0);
        assert_eq!(grid[0][0], 1.0);
    }

    #[test]
    fn test_empty_heatmap_is_zero() {
        let grid = heatmap(&[], 4);
        assert_eq!(grid, vec![vec![0.0; 4]; 4]);
    }

    fn worker(id: &str, status: WorkerStatus) -> WorkerRecord {
        WorkerRecord {
            id: id.into(),
            name: id.into(),
            facility_id: "f1".into(),
            status,
            fatigue_level: 0.0,
            location: Location::default(),
            skills: vec![],
        }
    }

    fn task(id: &str, status: TaskStatus) -> TaskRecord {
        TaskRecord {
            id: id.into(),
            facility_id: "f1".into(),
            description: String::new(),
            status,
            priority: TaskPriority::Medium,
            required_skill_id: None,
            location: None,
            assigned_worker_id: None,
            progress: 0,
        }
    }

    #[test]
    fn test_facility_metrics() {
        let workers = vec![
            worker("a", WorkerStatus::Available),
            worker("b", WorkerStatus::OnTask),
            worker("c", WorkerStatus::OnBreak),
            worker("d", WorkerStatus::Absent),
        ];
        let tasks = vec![
            task("1", TaskStatus::Completed),
            task("2", TaskStatus::InProgress),
            task("3", TaskStatus::Pending),
            task("4", TaskStatus::Completed),
        ];
        let m = facility_metrics(&workers, &tasks);
        assert_eq!(m.active_workers, 2);
        assert_eq!(m.open_tasks, 2);
        assert_eq!(m.completed_tasks, 2);
        assert_eq!(m.completion_rate, 50.0);
    }

    #[test]
    fn test_metrics_without_tasks() {
        let m = facility_metrics(&[], &[]);
        assert_eq!(m.completion_rate, 0.0);
        assert_eq!(m.open_tasks, 0);
    }
}
