//! Read-only snapshots of workers and tasks.
//!
//! Snapshots are flat, already-resolved values built by the caller for one
//! scoring or simulation call (see [`crate::store`] for the conversion from
//! stored records). Nothing in this crate mutates them.

use serde::{Deserialize, Serialize};

use crate::constants::floor::MIDPOINT;
use crate::skills::SkillLevel;

/// A point in the normalized 0–100 floor space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f32,
    pub y: f32,
}

impl Location {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint() -> Self {
        Self::new(MIDPOINT.0, MIDPOINT.1)
    }

    pub fn as_tuple(self) -> (f32, f32) {
        (self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerStatus {
    Available,
    OnTask,
    OnBreak,
    Absent,
}

impl WorkerStatus {
    /// Counted as present on the floor.
    pub fn is_active(self) -> bool {
        matches!(self, WorkerStatus::Available | WorkerStatus::OnTask)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Worker as seen by the scorer and simulator.
///
/// `fatigue_level` and `location` may be missing on partially hydrated
/// records; both then read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSnapshot {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub fatigue_level: Option<f32>,
    #[serde(default)]
    pub skills: Vec<SkillLevel>,
    pub status: WorkerStatus,
}

impl WorkerSnapshot {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: Some(Location::default()),
            fatigue_level: Some(0.0),
            skills: Vec::new(),
            status: WorkerStatus::Available,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.location = Some(Location::new(x, y));
        self
    }

    pub fn with_fatigue(mut self, fatigue: f32) -> Self {
        self.fatigue_level = Some(fatigue);
        self
    }

    pub fn with_skill(mut self, skill_id: impl Into<String>, proficiency: u8) -> Self {
        self.skills.push(SkillLevel::new(skill_id, proficiency));
        self
    }

    pub fn with_status(mut self, status: WorkerStatus) -> Self {
        self.status = status;
        self
    }

    /// Fatigue in `[0, 1]`; missing or non-finite reads as rested.
    pub fn fatigue(&self) -> f32 {
        match self.fatigue_level {
            Some(f) if f.is_finite() => f.clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Location, or the floor origin when unknown.
    pub fn position(&self) -> Location {
        self.location.unwrap_or_default()
    }
}

/// Task as seen by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub id: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub required_skill_id: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub status: TaskStatus,
}

impl TaskSnapshot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location: None,
            required_skill_id: None,
            priority: TaskPriority::default(),
            status: TaskStatus::Pending,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.location = Some(Location::new(x, y));
        self
    }

    pub fn requiring(mut self, skill_id: impl Into<String>) -> Self {
        self.required_skill_id = Some(skill_id.into());
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Task location, defaulting to the factory midpoint.
    pub fn position(&self) -> Location {
        self.location.unwrap_or_else(Location::midpoint)
    }
}
