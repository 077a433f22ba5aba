//! Worker–task matching and staffing simulation for AxionFlow.
//!
//! This crate holds the decision logic of the operations platform and
//! nothing else: no HTTP, no database driver, no socket layer. Functions take
//! plain snapshots and return results; the two stateful operations
//! (assignment and the task lifecycle) go through the [`store::WorkforceStore`]
//! port and report changes through an [`events::ChangeNotifier`].
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`analytics`] | Occupancy heatmap and facility headline metrics |
//! | [`assignment`] | Task creation, atomic assignment, progress and completion |
//! | [`config`] | Engine configuration with JSON overrides |
//! | [`constants`] | Floor size, scoring weights, simulation rates |
//! | [`error`] | Typed errors for assignment, simulation and config |
//! | [`events`] | Change events and notifier sinks |
//! | [`layout`] | Obstacle sanitizing and the 100×100 occupancy grid |
//! | [`model`] | Worker and task snapshots, status enums |
//! | [`pathfinding`] | A* walking distance with corner rules |
//! | [`scoring`] | Weighted worker recommendation |
//! | [`simulation`] | Fatigue/throughput staffing simulation |
//! | [`skills`] | Proficiency lookup and the hard skill filter |
//! | [`store`] | Persistence port and in-memory store |

pub mod analytics;
pub mod assignment;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod layout;
pub mod model;
pub mod pathfinding;
pub mod scoring;
pub mod simulation;
pub mod skills;
pub mod store;
