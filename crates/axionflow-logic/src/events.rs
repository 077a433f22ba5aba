//! Change notifications for downstream broadcast.
//!
//! The core never reaches for a global emitter. Operations that change state
//! take a `&dyn ChangeNotifier` and report what changed after the change is
//! committed; delivery (WebSocket, queue, log) is the caller's business.

use std::sync::Mutex;

use serde::Serialize;

use crate::store::{TaskRecord, WorkerRecord};

/// Severity of an operational alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all_fields = "camelCase")]
pub enum ChangeEvent {
    #[serde(rename = "task:create")]
    TaskCreated(TaskRecord),
    #[serde(rename = "task:update")]
    TaskUpdated(TaskRecord),
    #[serde(rename = "worker:update")]
    WorkerUpdated(WorkerRecord),
    #[serde(rename = "alert:new")]
    Alert {
        facility_id: String,
        level: AlertLevel,
        message: String,
    },
}

impl ChangeEvent {
    /// Channel name used by live clients.
    pub fn name(&self) -> &'static str {
        match self {
            ChangeEvent::TaskCreated(_) => "task:create",
            ChangeEvent::TaskUpdated(_) => "task:update",
            ChangeEvent::WorkerUpdated(_) => "worker:update",
            ChangeEvent::Alert { .. } => "alert:new",
        }
    }
}

/// Sink for committed changes.
pub trait ChangeNotifier: Send + Sync {
    fn notify(&self, event: ChangeEvent);
}

/// Any `Fn(ChangeEvent)` closure is a notifier.
impl<F> ChangeNotifier for F
where
    F: Fn(ChangeEvent) + Send + Sync,
{
    fn notify(&self, event: ChangeEvent) {
        self(event)
    }
}

/// Discards every event.
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn notify(&self, _event: ChangeEvent) {}
}

/// Records events in order, for tests and the harness.
#[derive(Default)]
pub struct MemoryNotifier {
    events: Mutex<Vec<ChangeEvent>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(ChangeEvent::name).collect()
    }
}

impl ChangeNotifier for MemoryNotifier {
    fn notify(&self, event: ChangeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
