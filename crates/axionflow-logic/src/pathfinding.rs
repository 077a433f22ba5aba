//! Obstacle-aware walking distance over the occupancy grid.
//!
//! A* over the 8-connected cell graph with the octile heuristic. Orthogonal
//! moves cost 1, diagonal moves cost √2, and a diagonal move is only taken
//! when the [`DiagonalPolicy`] allows it past the two orthogonal neighbours.
//!
//! The grid is only ever borrowed; every call owns its own search state, so
//! one [`OccupancyGrid`] can serve concurrent scoring requests.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::constants::floor::MAX_CELL;
use crate::constants::pathing::{DIAGONAL_COST, ORTHOGONAL_COST, UNREACHABLE_DISTANCE};
use crate::layout::OccupancyGrid;

/// Integer cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Truncate a normalized floor point to its cell, clamped to `[0, 99]`.
    pub fn from_point(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(0.0, MAX_CELL).floor() as usize,
            y: y.clamp(0.0, MAX_CELL).floor() as usize,
        }
    }

    fn euclidean(self, other: Cell) -> f32 {
        let dx = self.x as f32 - other.x as f32;
        let dy = self.y as f32 - other.y as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// When a diagonal step may pass a blocked orthogonal neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagonalPolicy {
    /// Both orthogonal neighbours must be open.
    #[default]
    NoCornerCutting,
    /// At most one orthogonal neighbour may be blocked.
    AllowOneBlockedCorner,
}

/// Tunables for the distance function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Reported when two open cells are not connected.
    pub unreachable_distance: f32,
    pub diagonal: DiagonalPolicy,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            unreachable_distance: UNREACHABLE_DISTANCE,
            diagonal: DiagonalPolicy::default(),
        }
    }
}

/// How a distance was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceEstimate {
    /// A walkable route exists. `steps` counts cell-to-cell moves.
    Path { length: f32, steps: usize },
    /// An endpoint sits in a blocked cell; straight-line fallback.
    Straight(f32),
    /// Both endpoints open but disconnected; carries the sentinel.
    Unreachable(f32),
}

impl DistanceEstimate {
    pub fn value(&self) -> f32 {
        match *self {
            DistanceEstimate::Path { length, .. } => length,
            DistanceEstimate::Straight(d) | DistanceEstimate::Unreachable(d) => d,
        }
    }

    pub fn is_reachable(&self) -> bool {
        !matches!(self, DistanceEstimate::Unreachable(_))
    }
}

/// Distance between two floor points, in cell units.
pub fn path_distance(
    grid: &OccupancyGrid,
    from: (f32, f32),
    to: (f32, f32),
    config: &PathConfig,
) -> f32 {
    distance_between(grid, from, to, config).value()
}

/// Distance between two floor points, with how it was obtained.
pub fn distance_between(
    grid: &OccupancyGrid,
    from: (f32, f32),
    to: (f32, f32),
    config: &PathConfig,
) -> DistanceEstimate {
    let start = Cell::from_point(from.0, from.1);
    let goal = Cell::from_point(to.0, to.1);

    if is_blocked(grid, start) || is_blocked(grid, goal) {
        let d = start.euclidean(goal);
        log::warn!(
            "Endpoint blocked ({},{})→({},{}); using straight-line {:.1}",
            start.x,
            start.y,
            goal.x,
            goal.y,
            d
        );
        return DistanceEstimate::Straight(d);
    }

    match find_path(grid, start, goal, config.diagonal) {
        Some(path) => DistanceEstimate::Path {
            length: route_length(&path),
            steps: path.len() - 1,
        },
        None => DistanceEstimate::Unreachable(config.unreachable_distance),
    }
}

/// Cell route from `start` to `goal`, both inclusive.
///
/// Returns `[start]` when they coincide and `None` when either endpoint is
/// blocked or no route exists.
pub fn find_path(
    grid: &OccupancyGrid,
    start: Cell,
    goal: Cell,
    diagonal: DiagonalPolicy,
) -> Option<Vec<Cell>> {
    if is_blocked(grid, start) || is_blocked(grid, goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let width = grid.width();
    let size = width * grid.height();
    let index = |c: Cell| c.y * width + c.x;

    let mut cost = vec![f32::INFINITY; size];
    let mut came_from = vec![usize::MAX; size];
    let mut closed = vec![false; size];
    let mut frontier = BinaryHeap::new();

    cost[index(start)] = 0.0;
    let h = octile(start, goal);
    frontier.push(Frontier {
        f: h,
        h,
        idx: index(start),
    });

    while let Some(Frontier { idx, .. }) = frontier.pop() {
        if closed[idx] {
            continue;
        }
        closed[idx] = true;

        let current = Cell::new(idx % width, idx / width);
        if current == goal {
            return Some(reconstruct(&came_from, idx, width));
        }

        for (next, step) in neighbors(grid, current, diagonal) {
            let n = index(next);
            if closed[n] {
                continue;
            }
            let candidate = cost[idx] + step;
            if candidate < cost[n] {
                cost[n] = candidate;
                came_from[n] = idx;
                let h = octile(next, goal);
                frontier.push(Frontier {
                    f: candidate + h,
                    h,
                    idx: n,
                });
            }
        }
    }

    None
}

/// Walked length of a route: 1 per orthogonal move, √2 per diagonal.
///
/// Counts are summed as integers first so a route and its reverse yield the
/// same value bit for bit.
pub fn route_length(path: &[Cell]) -> f32 {
    let (mut orthogonal, mut diagonal) = (0u32, 0u32);
    for pair in path.windows(2) {
        if pair[0].x != pair[1].x && pair[0].y != pair[1].y {
            diagonal += 1;
        } else {
            orthogonal += 1;
        }
    }
    orthogonal as f32 * ORTHOGONAL_COST + diagonal as f32 * DIAGONAL_COST
}

fn is_blocked(grid: &OccupancyGrid, c: Cell) -> bool {
    grid.is_blocked(c.x as i64, c.y as i64)
}

/// Admissible and consistent for 8-way movement with √2 diagonals.
fn octile(a: Cell, b: Cell) -> f32 {
    let dx = a.x.abs_diff(b.x) as f32;
    let dy = a.y.abs_diff(b.y) as f32;
    let (short, long) = if dx < dy { (dx, dy) } else { (dy, dx) };
    short * DIAGONAL_COST + (long - short) * ORTHOGONAL_COST
}

const DIRECTIONS: [(i64, i64); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

fn neighbors(
    grid: &OccupancyGrid,
    c: Cell,
    diagonal: DiagonalPolicy,
) -> impl Iterator<Item = (Cell, f32)> + '_ {
    let (x, y) = (c.x as i64, c.y as i64);
    DIRECTIONS.iter().filter_map(move |&(dx, dy)| {
        let (nx, ny) = (x + dx, y + dy);
        if grid.is_blocked(nx, ny) {
            return None;
        }
        if dx != 0 && dy != 0 {
            let side_a = grid.is_blocked(nx, y);
            let side_b = grid.is_blocked(x, ny);
            let allowed = match diagonal {
                DiagonalPolicy::NoCornerCutting => !side_a && !side_b,
                DiagonalPolicy::AllowOneBlockedCorner => !(side_a && side_b),
            };
            if !allowed {
                return None;
            }
            return Some((Cell::new(nx as usize, ny as usize), DIAGONAL_COST));
        }
        Some((Cell::new(nx as usize, ny as usize), ORTHOGONAL_COST))
    })
}

fn reconstruct(came_from: &[usize], goal: usize, width: usize) -> Vec<Cell> {
    let mut path = vec![Cell::new(goal % width, goal / width)];
    let mut node = goal;
    while came_from[node] != usize::MAX {
        node = came_from[node];
        path.push(Cell::new(node % width, node / width));
    }
    path.reverse();
    path
}

/// Min-heap entry: lowest `f` first, ties broken toward the goal, then by index.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    f: f32,
    h: f32,
    idx: usize,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}
