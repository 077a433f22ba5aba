//! Assignment transaction and task lifecycle.
//!
//! [`assign_task`] links a worker to a task inside one unit of work of the
//! [`WorkforceStore`]: both facility checks, the completed-task and
//! already-assigned checks and the AVAILABLE check run against the state
//! inside the unit, so two concurrent requests for the same worker cannot
//! both commit. A task holds at most one worker; handing it to another one
//! requires completing it first. Change notifications go
//! out only after the commit, task first, then worker.

use serde::Serialize;

use crate::error::{AssignmentError, AssignmentResult};
use crate::events::{ChangeEvent, ChangeNotifier};
use crate::layout::build_grid;
use crate::model::{TaskStatus, WorkerStatus};
use crate::scoring::{recommend_worker, Recommendation, ScoringConfig};
use crate::store::{TaskRecord, UnitOfWork, WorkerRecord, WorkforceStore};

/// Both records as committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub task: TaskRecord,
    pub worker: WorkerRecord,
}

/// Result of [`recommend_and_assign`].
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Assigned { assignment: Assignment, score: f32 },
    NoSuitableWorker,
}

/// Result of [`advance_task_progress`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressOutcome {
    Advanced(TaskRecord),
    Completed(Completion),
}

/// A completed task and the workers released from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub task: TaskRecord,
    pub released: Vec<WorkerRecord>,
}

/// Assign `worker_id` to `task_id` within `facility_id`.
pub fn assign_task<S: WorkforceStore>(
    store: &S,
    notifier: &dyn ChangeNotifier,
    facility_id: &str,
    task_id: &str,
    worker_id: &str,
) -> AssignmentResult<Assignment> {
    let committed = store.transact(|uow| {
        let mut task = load_task(uow, facility_id, task_id)?;
        if task.status == TaskStatus::Completed {
            return Err(AssignmentError::TaskAlreadyCompleted(task.id));
        }
        if let Some(current) = task.assigned_worker_id.as_deref() {
            if task.status == TaskStatus::InProgress && current != worker_id {
                return Err(AssignmentError::TaskAlreadyAssigned {
                    task_id: task.id.clone(),
                    worker_id: current.to_string(),
                });
            }
        }

        let mut worker = load_worker(uow, facility_id, worker_id)?;
        if worker.status != WorkerStatus::Available {
            return Err(AssignmentError::WorkerUnavailable {
                id: worker.id,
                status: worker.status,
            });
        }

        task.status = TaskStatus::InProgress;
        task.assigned_worker_id = Some(worker.id.clone());
        worker.status = WorkerStatus::OnTask;

        uow.put_task(task.clone());
        uow.put_worker(worker.clone());
        Ok(Assignment { task, worker })
    });

    match committed {
        Ok(assignment) => {
            log::info!(
                "Assigned worker {} to task {} in facility {}",
                assignment.worker.id,
                assignment.task.id,
                facility_id
            );
            notifier.notify(ChangeEvent::TaskUpdated(assignment.task.clone()));
            notifier.notify(ChangeEvent::WorkerUpdated(assignment.worker.clone()));
            Ok(assignment)
        }
        Err(e) => {
            log::warn!("Assignment of task {task_id} to worker {worker_id} rejected: {e}");
            Err(e)
        }
    }
}

/// Open a new PENDING task in `facility_id`.
///
/// Status, progress and worker link of `task` are reset; the facility comes
/// from the caller, not the record.
pub fn create_task<S: WorkforceStore>(
    store: &S,
    notifier: &dyn ChangeNotifier,
    facility_id: &str,
    mut task: TaskRecord,
) -> AssignmentResult<TaskRecord> {
    task.facility_id = facility_id.to_string();
    task.status = TaskStatus::Pending;
    task.progress = 0;
    task.assigned_worker_id = None;

    let created = store.transact(|uow| {
        if uow.task(&task.id).is_some() {
            return Err(AssignmentError::TaskAlreadyExists(task.id.clone()));
        }
        uow.put_task(task.clone());
        Ok(task)
    })?;

    log::info!("Created task {} in facility {}", created.id, facility_id);
    notifier.notify(ChangeEvent::TaskCreated(created.clone()));
    Ok(created)
}

/// Score the facility's AVAILABLE workers for a task and assign the winner.
///
/// The grid is rebuilt from the current layout on every call. Candidates are
/// read before the unit of work begins; [`assign_task`] re-checks them inside
/// it, so a worker taken in between surfaces as `WorkerUnavailable`.
pub fn recommend_and_assign<S: WorkforceStore>(
    store: &S,
    notifier: &dyn ChangeNotifier,
    config: &ScoringConfig,
    facility_id: &str,
    task_id: &str,
) -> AssignmentResult<DispatchOutcome> {
    let task = store
        .task(task_id)
        .ok_or_else(|| AssignmentError::TaskNotFound(task_id.to_string()))?;
    ensure_facility("task", &task.id, &task.facility_id, facility_id)?;

    let grid = build_grid(&store.facility_layout(facility_id));
    let candidates: Vec<_> = store
        .workers_in(facility_id)
        .iter()
        .filter(|w| w.status == WorkerStatus::Available)
        .map(WorkerRecord::snapshot)
        .collect();

    match recommend_worker(&task.snapshot(), &candidates, &grid, config) {
        Recommendation::Recommended(best) => {
            let assignment = assign_task(store, notifier, facility_id, task_id, &best.worker_id)?;
            Ok(DispatchOutcome::Assigned {
                assignment,
                score: best.score,
            })
        }
        Recommendation::NoSuitableWorker => {
            log::info!("No suitable worker for task {task_id} in facility {facility_id}");
            Ok(DispatchOutcome::NoSuitableWorker)
        }
    }
}

/// Mark an in-progress task completed and release its worker.
///
/// Emits the released worker's update before the task update.
pub fn complete_task<S: WorkforceStore>(
    store: &S,
    notifier: &dyn ChangeNotifier,
    facility_id: &str,
    task_id: &str,
) -> AssignmentResult<Completion> {
    let completion = store.transact(|uow| {
        let task = load_task(uow, facility_id, task_id)?;
        require_in_progress(&task)?;
        Ok(finish(uow, task))
    })?;
    announce_completion(notifier, &completion);
    Ok(completion)
}

/// Add `increment` percent to an in-progress task; at 100 it completes.
pub fn advance_task_progress<S: WorkforceStore>(
    store: &S,
    notifier: &dyn ChangeNotifier,
    facility_id: &str,
    task_id: &str,
    increment: u8,
) -> AssignmentResult<ProgressOutcome> {
    let outcome = store.transact(|uow| {
        let mut task = load_task(uow, facility_id, task_id)?;
        require_in_progress(&task)?;
        let progress = task.progress.saturating_add(increment);
        if progress >= 100 {
            return Ok(ProgressOutcome::Completed(finish(uow, task)));
        }
        task.progress = progress;
        uow.put_task(task.clone());
        Ok(ProgressOutcome::Advanced(task))
    })?;

    match &outcome {
        ProgressOutcome::Advanced(task) => {
            notifier.notify(ChangeEvent::TaskUpdated(task.clone()));
        }
        ProgressOutcome::Completed(completion) => announce_completion(notifier, completion),
    }
    Ok(outcome)
}

fn finish(uow: &mut dyn UnitOfWork, mut task: TaskRecord) -> Completion {
    task.status = TaskStatus::Completed;
    task.progress = 100;

    let mut released = Vec::new();
    if let Some(worker_id) = &task.assigned_worker_id {
        if let Some(mut worker) = uow.worker(worker_id).cloned() {
            if worker.status == WorkerStatus::OnTask {
                worker.status = WorkerStatus::Available;
                uow.put_worker(worker.clone());
                released.push(worker);
            }
        }
    }
    uow.put_task(task.clone());
    Completion { task, released }
}

fn announce_completion(notifier: &dyn ChangeNotifier, completion: &Completion) {
    log::info!(
        "Task {} completed, {} worker(s) released",
        completion.task.id,
        completion.released.len()
    );
    for worker in &completion.released {
        notifier.notify(ChangeEvent::WorkerUpdated(worker.clone()));
    }
    notifier.notify(ChangeEvent::TaskUpdated(completion.task.clone()));
}

fn require_in_progress(task: &TaskRecord) -> AssignmentResult<()> {
    match task.status {
        TaskStatus::InProgress => Ok(()),
        TaskStatus::Completed => Err(AssignmentError::TaskAlreadyCompleted(task.id.clone())),
        TaskStatus::Pending => Err(AssignmentError::TaskNotInProgress(task.id.clone())),
    }
}

fn load_task(uow: &dyn UnitOfWork, facility_id: &str, task_id: &str) -> AssignmentResult<TaskRecord> {
    let task = uow
        .task(task_id)
        .cloned()
        .ok_or_else(|| AssignmentError::TaskNotFound(task_id.to_string()))?;
    ensure_facility("task", &task.id, &task.facility_id, facility_id)?;
    Ok(task)
}

fn load_worker(
    uow: &dyn UnitOfWork,
    facility_id: &str,
    worker_id: &str,
) -> AssignmentResult<WorkerRecord> {
    let worker = uow
        .worker(worker_id)
        .cloned()
        .ok_or_else(|| AssignmentError::WorkerNotFound(worker_id.to_string()))?;
    ensure_facility("worker", &worker.id, &worker.facility_id, facility_id)?;
    Ok(worker)
}

fn ensure_facility(
    entity: &'static str,
    id: &str,
    owner: &str,
    facility_id: &str,
) -> AssignmentResult<()> {
    if owner == facility_id {
        Ok(())
    } else {
        Err(AssignmentError::PermissionDenied {
            entity,
            id: id.to_string(),
            facility_id: facility_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemoryNotifier;
    use crate::model::Location;
    use crate::skills::SkillLevel;
    use crate::store::InMemoryStore;

    fn worker(id: &str, facility: &str, status: WorkerStatus) -> WorkerRecord {
        WorkerRecord {
            id: id.into(),
            name: id.to_uppercase(),
            facility_id: facility.into(),
            status,
            fatigue_level: 0.1,
            location: Location::new(10.0, 10.0),
            skills: vec![SkillLevel::new("weld", 4)],
        }
    }

    fn task(id: &str, facility: &str, status: TaskStatus) -> TaskRecord {
        TaskRecord {
            id: id.into(),
            facility_id: facility.into(),
            description: format!("task {id}"),
            status,
            priority: Default::default(),
            required_skill_id: None,
            location: None,
            assigned_worker_id: None,
            progress: 0,
        }
    }

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_worker(worker("w1", "f1", WorkerStatus::Available));
        store.insert_worker(worker("w2", "f2", WorkerStatus::Available));
        store.insert_worker(worker("busy", "f1", WorkerStatus::OnTask));
        store.insert_task(task("t1", "f1", TaskStatus::Pending));
        store.insert_task(task("t2", "f1", TaskStatus::Pending));
        store.insert_task(task("done", "f1", TaskStatus::Completed));
        store.insert_task(task("other", "f2", TaskStatus::Pending));
        store
    }

    fn second_welder(store: &InMemoryStore) {
        store.insert_worker(worker("w3", "f1", WorkerStatus::Available));
    }

    #[test]
    fn test_assign_updates_both_and_notifies_in_order() {
        let store = seeded();
        let sink = MemoryNotifier::new();
        let a = assign_task(&store, &sink, "f1", "t1", "w1").unwrap();

        assert_eq!(a.task.status, TaskStatus::InProgress);
        assert_eq!(a.task.assigned_worker_id.as_deref(), Some("w1"));
        assert_eq!(a.worker.status, WorkerStatus::OnTask);
        assert_eq!(store.task("t1").unwrap(), a.task);
        assert_eq!(store.worker("w1").unwrap(), a.worker);
        assert_eq!(sink.names(), vec!["task:update", "worker:update"]);
    }

    #[test]
    fn test_precondition_failures_have_no_side_effects() {
        let cases = [
            ("f1", "missing", "w1"),
            ("f1", "t1", "missing"),
            ("f1", "other", "w1"),
            ("f1", "t1", "w2"),
            ("f1", "done", "w1"),
            ("f1", "t1", "busy"),
        ];
        for (facility, t, w) in cases {
            let store = seeded();
            let sink = MemoryNotifier::new();
            let err = assign_task(&store, &sink, facility, t, w).unwrap_err();
            assert!(sink.events().is_empty(), "{err}");
            assert_eq!(store.task("t1").unwrap().status, TaskStatus::Pending);
            assert_eq!(store.worker("w1").unwrap().status, WorkerStatus::Available);
        }
    }

    #[test]
    fn test_error_kinds() {
        let store = seeded();
        let sink = MemoryNotifier::new();
        assert_eq!(
            assign_task(&store, &sink, "f1", "nope", "w1"),
            Err(AssignmentError::TaskNotFound("nope".into()))
        );
        assert_eq!(
            assign_task(&store, &sink, "f1", "t1", "nope"),
            Err(AssignmentError::WorkerNotFound("nope".into()))
        );
        assert!(matches!(
            assign_task(&store, &sink, "f1", "t1", "w2"),
            Err(AssignmentError::PermissionDenied { entity: "worker", .. })
        ));
        assert!(matches!(
            assign_task(&store, &sink, "f1", "other", "w1"),
            Err(AssignmentError::PermissionDenied { entity: "task", .. })
        ));
        assert_eq!(
            assign_task(&store, &sink, "f1", "done", "w1"),
            Err(AssignmentError::TaskAlreadyCompleted("done".into()))
        );
        assert_eq!(
            assign_task(&store, &sink, "f1", "t1", "busy"),
            Err(AssignmentError::WorkerUnavailable {
                id: "busy".into(),
                status: WorkerStatus::OnTask
            })
        );
    }

    #[test]
    fn test_worker_cannot_take_two_tasks() {
        let store = seeded();
        let sink = MemoryNotifier::new();
        assign_task(&store, &sink, "f1", "t1", "w1").unwrap();
        let err = assign_task(&store, &sink, "f1", "t2", "w1").unwrap_err();
        assert!(matches!(err, AssignmentError::WorkerUnavailable { .. }));
        assert_eq!(store.task("t2").unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn test_task_in_progress_cannot_change_hands() {
        let store = seeded();
        second_welder(&store);
        let sink = MemoryNotifier::new();
        assign_task(&store, &sink, "f1", "t1", "w1").unwrap();

        let err = assign_task(&store, &sink, "f1", "t1", "w3").unwrap_err();
        assert_eq!(
            err,
            AssignmentError::TaskAlreadyAssigned {
                task_id: "t1".into(),
                worker_id: "w1".into()
            }
        );
        assert_eq!(store.task("t1").unwrap().assigned_worker_id.as_deref(), Some("w1"));
        assert_eq!(store.worker("w3").unwrap().status, WorkerStatus::Available);
        assert_eq!(sink.events().len(), 2);

        // completion frees the only worker the task ever held
        let done = complete_task(&store, &sink, "f1", "t1").unwrap();
        assert_eq!(done.released.len(), 1);
        assert_eq!(done.released[0].id, "w1");
        assert_eq!(store.worker("w1").unwrap().status, WorkerStatus::Available);
        assert_eq!(store.worker("w3").unwrap().status, WorkerStatus::Available);

        assign_task(&store, &sink, "f1", "t2", "w3").unwrap();
        assign_task(&store, &sink, "f1", "t2", "w1").unwrap_err();
    }

    #[test]
    fn test_create_task_opens_pending_task() {
        let store = seeded();
        let sink = MemoryNotifier::new();
        let mut draft = task("t9", "elsewhere", TaskStatus::Completed);
        draft.progress = 70;
        draft.assigned_worker_id = Some("w1".into());

        let created = create_task(&store, &sink, "f1", draft).unwrap();
        assert_eq!(created.facility_id, "f1");
        assert_eq!(created.status, TaskStatus::Pending);
        assert_eq!(created.progress, 0);
        assert_eq!(created.assigned_worker_id, None);
        assert_eq!(store.task("t9").unwrap(), created);
        assert_eq!(sink.names(), vec!["task:create"]);

        assign_task(&store, &sink, "f1", "t9", "w1").unwrap();
        assert_eq!(store.task("t9").unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn test_create_task_rejects_taken_id() {
        let store = seeded();
        let sink = MemoryNotifier::new();
        let err = create_task(&store, &sink, "f1", task("t1", "f1", TaskStatus::Pending));
        assert_eq!(err, Err(AssignmentError::TaskAlreadyExists("t1".into())));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_complete_releases_worker() {
        let store = seeded();
        let sink = MemoryNotifier::new();
        assign_task(&store, &sink, "f1", "t1", "w1").unwrap();

        let done = complete_task(&store, &sink, "f1", "t1").unwrap();
        assert_eq!(done.task.status, TaskStatus::Completed);
        assert_eq!(done.task.progress, 100);
        assert_eq!(done.released.len(), 1);
        assert_eq!(store.worker("w1").unwrap().status, WorkerStatus::Available);
        assert_eq!(
            sink.names(),
            vec!["task:update", "worker:update", "worker:update", "task:update"]
        );
    }

    #[test]
    fn test_complete_requires_in_progress() {
        let store = seeded();
        let sink = MemoryNotifier::new();
        assert_eq!(
            complete_task(&store, &sink, "f1", "t1"),
            Err(AssignmentError::TaskNotInProgress("t1".into()))
        );
        assert_eq!(
            complete_task(&store, &sink, "f1", "done"),
            Err(AssignmentError::TaskAlreadyCompleted("done".into()))
        );
    }

    #[test]
    fn test_progress_advances_then_completes() {
        let store = seeded();
        let sink = MemoryNotifier::new();
        assign_task(&store, &sink, "f1", "t1", "w1").unwrap();

        let out = advance_task_progress(&store, &sink, "f1", "t1", 60).unwrap();
        assert!(matches!(out, ProgressOutcome::Advanced(ref t) if t.progress == 60));

        let out = advance_task_progress(&store, &sink, "f1", "t1", 60).unwrap();
        match out {
            ProgressOutcome::Completed(c) => {
                assert_eq!(c.task.progress, 100);
                assert_eq!(c.released[0].id, "w1");
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(store.task("t1").unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_recommend_and_assign_picks_skilled_worker() {
        let store = seeded();
        let mut unskilled = worker("w3", "f1", WorkerStatus::Available);
        unskilled.skills.clear();
        unskilled.fatigue_level = 0.0;
        store.insert_worker(unskilled);
        let mut welding = task("weld-job", "f1", TaskStatus::Pending);
        welding.required_skill_id = Some("weld".into());
        store.insert_task(welding);

        let sink = MemoryNotifier::new();
        let out = recommend_and_assign(&store, &sink, &ScoringConfig::default(), "f1", "weld-job")
            .unwrap();
        match out {
            DispatchOutcome::Assigned { assignment, score } => {
                assert_eq!(assignment.worker.id, "w1");
                assert!(score > 0.0 && score <= 1.0);
            }
            DispatchOutcome::NoSuitableWorker => panic!("expected an assignment"),
        }
    }

    #[test]
    fn test_recommend_and_assign_without_candidates() {
        let store = seeded();
        let mut welding = task("weld-job", "f2", TaskStatus::Pending);
        welding.required_skill_id = Some("Welding".into());
        store.insert_task(welding);

        let sink = MemoryNotifier::new();
        let out = recommend_and_assign(&store, &sink, &ScoringConfig::default(), "f2", "weld-job")
            .unwrap();
        assert_eq!(out, DispatchOutcome::NoSuitableWorker);
        assert!(sink.events().is_empty());
    }
}
