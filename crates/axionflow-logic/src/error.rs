//! Typed errors for the operations that can fail.
//!
//! Grid building, distance and scoring absorb bad input instead of failing,
//! so they have no error type.

use thiserror::Error;

use crate::model::WorkerStatus;

/// Precondition failures of the assignment transaction and task lifecycle.
/// Any of these aborts the unit of work with no mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssignmentError {
    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("worker not found: {0}")]
    WorkerNotFound(String),

    /// The record exists but belongs to another facility.
    #[error("{entity} {id} does not belong to facility {facility_id}")]
    PermissionDenied {
        entity: &'static str,
        id: String,
        facility_id: String,
    },

    #[error("task already exists: {0}")]
    TaskAlreadyExists(String),

    #[error("task already completed: {0}")]
    TaskAlreadyCompleted(String),

    #[error("task {0} is not in progress")]
    TaskNotInProgress(String),

    /// The task is already IN_PROGRESS with another worker.
    #[error("task {task_id} is already assigned to worker {worker_id}")]
    TaskAlreadyAssigned { task_id: String, worker_id: String },

    #[error("worker {id} is not available (status {status:?})")]
    WorkerUnavailable { id: String, status: WorkerStatus },

    #[error("store error: {0}")]
    Store(String),
}

pub type AssignmentResult<T> = std::result::Result<T, AssignmentError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("no workers available to simulate in facility {0}")]
    NoWorkforce(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_presentable() {
        let e = AssignmentError::PermissionDenied {
            entity: "worker",
            id: "w1".into(),
            facility_id: "f2".into(),
        };
        assert_eq!(e.to_string(), "worker w1 does not belong to facility f2");

        let e = AssignmentError::WorkerUnavailable {
            id: "w1".into(),
            status: WorkerStatus::OnTask,
        };
        assert_eq!(e.to_string(), "worker w1 is not available (status OnTask)");

        let e = AssignmentError::TaskAlreadyAssigned {
            task_id: "t1".into(),
            worker_id: "w1".into(),
        };
        assert_eq!(e.to_string(), "task t1 is already assigned to worker w1");
    }

    #[test]
    fn test_parse_error_converts() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: ConfigError = err.into();
        assert!(matches!(e, ConfigError::Parse(_)));
    }
}
