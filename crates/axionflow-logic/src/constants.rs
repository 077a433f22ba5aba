//! Fixed model constants for the floor, scoring and simulation.
//!
//! These are plain values with no database dependency. Anything a deployment
//! may want to tune is mirrored by a field in [`crate::config`] whose default
//! is taken from here.

pub mod floor {
    /// Cells per axis. The normalized 0–100 coordinate space maps 1:1 onto cells.
    pub const GRID_SIZE: usize = 100;
    /// Largest valid cell coordinate.
    pub const MAX_CELL: f32 = (GRID_SIZE - 1) as f32;
    /// Factory midpoint, used when a task has no location.
    pub const MIDPOINT: (f32, f32) = (50.0, 50.0);
}

pub mod pathing {
    /// Distance reported when two open cells are not connected.
    pub const UNREACHABLE_DISTANCE: f32 = 999.0;
    /// Cost of an orthogonal move.
    pub const ORTHOGONAL_COST: f32 = 1.0;
    /// Cost of a diagonal move.
    pub const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;
}

pub mod scoring {
    /// Skill fit dominates.
    pub const WEIGHT_SKILL: f32 = 0.5;
    pub const WEIGHT_FATIGUE: f32 = 0.3;
    pub const WEIGHT_DISTANCE: f32 = 0.2;
    /// Longest meaningful commute: the floor diagonal, rounded.
    pub const DISTANCE_NORMALIZER: f32 = 141.0;
    /// Proficiency ratings run 1..=5.
    pub const MAX_PROFICIENCY: u8 = 5;
}

pub mod simulation {
    pub const TICK_MINUTES: u32 = 30;
    pub const DAY_MINUTES: u32 = 24 * 60;
    /// Hard stop for infeasible scenarios.
    pub const MAX_DAYS: u32 = 30;
    /// Tasks one rested worker finishes per hour at MEDIUM difficulty.
    pub const BASE_SPEED_PER_HOUR: f64 = 1.0;
    /// Fatigue gained per on-shift tick, before the difficulty multiplier.
    pub const FATIGUE_GAIN_PER_TICK: f64 = 0.015;
    /// Fatigue shed per off-shift tick.
    pub const FATIGUE_RECOVERY_PER_TICK: f64 = 0.1;
    /// Rest never takes a worker below this.
    pub const FATIGUE_FLOOR: f64 = 0.05;
    /// Output lost at full fatigue.
    pub const MAX_FATIGUE_PENALTY: f64 = 0.4;
    pub const MAX_SHIFT_HOURS: f64 = 12.0;
    pub const SHIFT_EXTENSION_HOURS: f64 = 4.0;
    pub const DEFAULT_SHIFT_HOURS: f64 = 8.0;
    pub const DEFAULT_DEADLINE_HOURS: f64 = 24.0;
}

pub mod difficulty {
    pub const LOW: f64 = 0.6;
    pub const MEDIUM: f64 = 1.0;
    pub const HIGH: f64 = 2.0;
}

pub mod analytics {
    /// Buckets per axis for the occupancy heatmap.
    pub const HEATMAP_BUCKETS: usize = 10;
}
