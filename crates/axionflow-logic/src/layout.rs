//! Floor-plan rasterization into a fixed-resolution occupancy grid.
//!
//! A factory layout is a list of rectangular [`Obstacle`]s in the normalized
//! 0–100 coordinate space. [`build_grid`] turns it into an [`OccupancyGrid`]
//! of 100×100 cells where a cell is blocked iff some obstacle covers it.
//!
//! Malformed input is absorbed, never rejected: coordinates are clamped, sizes
//! are truncated, and anything that is not a list of obstacles yields an
//! all-open grid. The clamping lives in [`sanitize_obstacle`] alone, so a
//! stricter policy such as [`sanitize_obstacle_strict`] can be swapped in via
//! [`build_grid_with`] without touching rasterization.

use serde::{Deserialize, Serialize};

use crate::constants::floor::{GRID_SIZE, MAX_CELL};

/// A rectangular obstacle on the factory floor.
///
/// Layout records from the dashboard use `w`/`h`; both spellings deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    #[serde(alias = "w")]
    pub width: f32,
    #[serde(alias = "h")]
    pub height: f32,
    pub label: Option<String>,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            label: None,
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Half-open cell range `[x0, x1) × [y0, y1)`, already inside grid bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl CellRect {
    /// Number of cells covered.
    pub fn area(&self) -> usize {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }
}

/// Maps an obstacle to the cells it covers, or `None` to ignore it.
pub type SanitizePolicy = fn(&Obstacle) -> Option<CellRect>;

/// Permissive policy: clamp the origin to `[0, 99]`, truncate everything,
/// and intersect with the grid. Negative or zero sizes cover nothing.
pub fn sanitize_obstacle(obs: &Obstacle) -> Option<CellRect> {
    let x = obs.x.clamp(0.0, MAX_CELL).floor() as i64;
    let y = obs.y.clamp(0.0, MAX_CELL).floor() as i64;
    let w = obs.width.floor() as i64;
    let h = obs.height.floor() as i64;
    clip_to_grid(x, y, w, h)
}

/// Strict policy: drop obstacles whose origin lies outside the floor or whose
/// size is not positive, instead of clamping them into place.
pub fn sanitize_obstacle_strict(obs: &Obstacle) -> Option<CellRect> {
    let finite = [obs.x, obs.y, obs.width, obs.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite
        || obs.x < 0.0
        || obs.y < 0.0
        || obs.x > MAX_CELL
        || obs.y > MAX_CELL
        || obs.width <= 0.0
        || obs.height <= 0.0
    {
        return None;
    }
    clip_to_grid(
        obs.x.floor() as i64,
        obs.y.floor() as i64,
        obs.width.floor() as i64,
        obs.height.floor() as i64,
    )
}

fn clip_to_grid(x: i64, y: i64, w: i64, h: i64) -> Option<CellRect> {
    let size = GRID_SIZE as i64;
    let x0 = x.clamp(0, size);
    let y0 = y.clamp(0, size);
    let x1 = x.saturating_add(w).clamp(0, size);
    let y1 = y.saturating_add(h).clamp(0, size);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(CellRect {
        x0: x0 as usize,
        y0: y0 as usize,
        x1: x1 as usize,
        y1: y1 as usize,
    })
}

/// Boolean occupancy grid, row-major. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    blocked: Vec<bool>,
}

impl OccupancyGrid {
    /// An all-open grid at the standard floor resolution.
    pub fn open() -> Self {
        Self {
            width: GRID_SIZE,
            height: GRID_SIZE,
            blocked: vec![false; GRID_SIZE * GRID_SIZE],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Whether a cell is blocked. Out-of-bounds cells count as blocked.
    pub fn is_blocked(&self, x: i64, y: i64) -> bool {
        if !self.in_bounds(x, y) {
            return true;
        }
        self.blocked[y as usize * self.width + x as usize]
    }

    pub fn is_walkable(&self, x: i64, y: i64) -> bool {
        !self.is_blocked(x, y)
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|&&b| b).count()
    }

    fn fill(&mut self, rect: CellRect) {
        for row in rect.y0..rect.y1 {
            let start = row * self.width;
            self.blocked[start + rect.x0..start + rect.x1].fill(true);
        }
    }
}

impl Default for OccupancyGrid {
    fn default() -> Self {
        Self::open()
    }
}

/// Rasterize a layout with the permissive [`sanitize_obstacle`] policy.
pub fn build_grid(obstacles: &[Obstacle]) -> OccupancyGrid {
    build_grid_with(obstacles, sanitize_obstacle)
}

/// Rasterize a layout with a caller-chosen sanitize policy.
pub fn build_grid_with(obstacles: &[Obstacle], policy: SanitizePolicy) -> OccupancyGrid {
    let mut grid = OccupancyGrid::open();
    let mut ignored = 0usize;
    for obs in obstacles {
        match policy(obs) {
            Some(rect) => grid.fill(rect),
            None => ignored += 1,
        }
    }
    if ignored > 0 {
        log::debug!(
            "Layout rasterized: {} obstacles, {} covered nothing",
            obstacles.len(),
            ignored
        );
    }
    grid
}

/// Read a stored layout value into obstacles.
///
/// Anything other than a JSON array yields no obstacles; array entries that
/// cannot be read as an obstacle are skipped; missing fields default to 0.
pub fn parse_layout(value: &serde_json::Value) -> Vec<Obstacle> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| Obstacle::deserialize(entry).ok())
        .collect()
}
