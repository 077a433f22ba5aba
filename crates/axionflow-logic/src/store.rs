//! The persistence boundary.
//!
//! Authoritative worker and task records live with an external store. This
//! module defines what the core needs from it (read access plus a
//! serializable unit of work) and an in-memory implementation used by the
//! harness and tests. Records are converted to snapshots explicitly by
//! [`WorkerRecord::snapshot`] / [`TaskRecord::snapshot`]; nothing here loads
//! relations lazily.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{AssignmentError, AssignmentResult};
use crate::layout::Obstacle;
use crate::model::{Location, TaskPriority, TaskSnapshot, TaskStatus, WorkerSnapshot, WorkerStatus};
use crate::skills::SkillLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRecord {
    pub id: String,
    pub name: String,
    pub facility_id: String,
    pub status: WorkerStatus,
    #[serde(default)]
    pub fatigue_level: f32,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub skills: Vec<SkillLevel>,
}

impl WorkerRecord {
    pub fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            location: Some(self.location),
            fatigue_level: Some(self.fatigue_level),
            skills: self.skills.clone(),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub facility_id: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub required_skill_id: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub assigned_worker_id: Option<String>,
    /// Percent complete, 0–100.
    #[serde(default)]
    pub progress: u8,
}

impl TaskRecord {
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id.clone(),
            location: self.location,
            required_skill_id: self.required_skill_id.clone(),
            priority: self.priority,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Raw layout as stored; read with [`crate::layout::parse_layout`].
    #[serde(default)]
    pub layout: serde_json::Value,
}

/// Reads and writes visible inside one unit of work.
pub trait UnitOfWork {
    fn task(&self, id: &str) -> Option<&TaskRecord>;
    fn worker(&self, id: &str) -> Option<&WorkerRecord>;
    fn put_task(&mut self, task: TaskRecord);
    fn put_worker(&mut self, worker: WorkerRecord);
}

/// What the core needs from the authoritative store.
pub trait WorkforceStore: Send + Sync {
    /// Obstacles of a facility's floor. Unknown facilities have an open floor.
    fn facility_layout(&self, facility_id: &str) -> Vec<Obstacle>;

    /// Workers of a facility, in a stable order.
    fn workers_in(&self, facility_id: &str) -> Vec<WorkerRecord>;

    /// Tasks of a facility, in a stable order.
    fn tasks_in(&self, facility_id: &str) -> Vec<TaskRecord>;

    fn task(&self, id: &str) -> Option<TaskRecord>;

    /// Run `work` as one serializable unit. Writes become visible only if it
    /// returns `Ok`; on `Err` nothing it wrote is kept.
    fn transact<R, F>(&self, work: F) -> AssignmentResult<R>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> AssignmentResult<R>;
}

#[derive(Debug, Clone, Default)]
struct Tables {
    facilities: BTreeMap<String, FacilityRecord>,
    workers: BTreeMap<String, WorkerRecord>,
    tasks: BTreeMap<String, TaskRecord>,
}

impl UnitOfWork for Tables {
    fn task(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.get(id)
    }

    fn worker(&self, id: &str) -> Option<&WorkerRecord> {
        self.workers.get(id)
    }

    fn put_task(&mut self, task: TaskRecord) {
        self.tasks.insert(task.id.clone(), task);
    }

    fn put_worker(&mut self, worker: WorkerRecord) {
        self.workers.insert(worker.id.clone(), worker);
    }
}

/// Writes of one unit of work, layered over the committed tables.
struct Staged<'a> {
    base: &'a Tables,
    tasks: BTreeMap<String, TaskRecord>,
    workers: BTreeMap<String, WorkerRecord>,
}

impl<'a> Staged<'a> {
    fn over(base: &'a Tables) -> Self {
        Self {
            base,
            tasks: BTreeMap::new(),
            workers: BTreeMap::new(),
        }
    }
}

impl UnitOfWork for Staged<'_> {
    fn task(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.get(id).or_else(|| self.base.tasks.get(id))
    }

    fn worker(&self, id: &str) -> Option<&WorkerRecord> {
        self.workers.get(id).or_else(|| self.base.workers.get(id))
    }

    fn put_task(&mut self, task: TaskRecord) {
        self.tasks.insert(task.id.clone(), task);
    }

    fn put_worker(&mut self, worker: WorkerRecord) {
        self.workers.insert(worker.id.clone(), worker);
    }
}

/// Seed data for [`InMemoryStore::from_json_str`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreFixture {
    pub facilities: Vec<FacilityRecord>,
    pub workers: Vec<WorkerRecord>,
    pub tasks: Vec<TaskRecord>,
}

/// Mutex-guarded tables. A unit of work holds the lock throughout and
/// writes to an overlay of touched records, merged into the tables only on
/// success.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: StoreFixture) -> Self {
        let store = Self::new();
        for f in fixture.facilities {
            store.insert_facility(f);
        }
        for w in fixture.workers {
            store.insert_worker(w);
        }
        for t in fixture.tasks {
            store.insert_task(t);
        }
        store
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let fixture: StoreFixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn insert_facility(&self, facility: FacilityRecord) {
        self.with_tables(|t| {
            t.facilities.insert(facility.id.clone(), facility);
        });
    }

    pub fn insert_worker(&self, worker: WorkerRecord) {
        self.with_tables(|t| t.put_worker(worker));
    }

    pub fn insert_task(&self, task: TaskRecord) {
        self.with_tables(|t| t.put_task(task));
    }

    pub fn worker(&self, id: &str) -> Option<WorkerRecord> {
        self.read(|t| t.workers.get(id).cloned())
    }

    fn with_tables(&self, f: impl FnOnce(&mut Tables)) {
        match self.tables.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        match self.tables.lock() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

impl WorkforceStore for InMemoryStore {
    fn facility_layout(&self, facility_id: &str) -> Vec<Obstacle> {
        self.read(|t| {
            t.facilities
                .get(facility_id)
                .map(|f| crate::layout::parse_layout(&f.layout))
                .unwrap_or_default()
        })
    }

    fn workers_in(&self, facility_id: &str) -> Vec<WorkerRecord> {
        self.read(|t| {
            t.workers
                .values()
                .filter(|w| w.facility_id == facility_id)
                .cloned()
                .collect()
        })
    }

    fn tasks_in(&self, facility_id: &str) -> Vec<TaskRecord> {
        self.read(|t| {
            t.tasks
                .values()
                .filter(|task| task.facility_id == facility_id)
                .cloned()
                .collect()
        })
    }

    fn task(&self, id: &str) -> Option<TaskRecord> {
        self.read(|t| t.tasks.get(id).cloned())
    }

    fn transact<R, F>(&self, work: F) -> AssignmentResult<R>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> AssignmentResult<R>,
    {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| AssignmentError::Store("store lock poisoned".into()))?;
        let mut staged = Staged::over(&guard);
        let out = work(&mut staged)?;
        let Staged { tasks, workers, .. } = staged;
        guard.tasks.extend(tasks);
        guard.workers.extend(workers);
        Ok(out)
    }
}
