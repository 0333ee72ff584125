//! Task fixtures and a scripted backend shared by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex as StdMutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    domain::{Priority, TaskId},
    protocol::{parse_timestamp, HealthStatus, Task, TaskPatch},
};
use tokio::sync::oneshot;

use crate::{SyncError, TaskApi};

pub(crate) fn at(raw: &str) -> DateTime<Utc> {
    parse_timestamp(raw).expect("valid fixture timestamp")
}

pub(crate) fn task(id: &str, priority: Priority) -> Task {
    let created = at("2025-01-01T00:00:00Z");
    Task {
        id: TaskId::from(id),
        task_name: format!("task {id}"),
        assignee: None,
        due_date_time: None,
        priority,
        original_text: Some(format!("do task {id}")),
        created_at: created,
        updated_at: created,
    }
}

pub(crate) fn due(mut task: Task, raw: &str) -> Task {
    task.due_date_time = Some(at(raw));
    task
}

pub(crate) fn created(mut task: Task, raw: &str) -> Task {
    task.created_at = at(raw);
    task.updated_at = task.created_at;
    task
}

pub(crate) fn touched(mut task: Task, raw: &str) -> Task {
    task.updated_at = at(raw);
    task
}

pub(crate) fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.id.as_str()).collect()
}

/// Scripted [`TaskApi`]. Each method pops its next scripted result; a gate
/// holds a call in flight until the test releases it.
#[derive(Default)]
pub(crate) struct FakeApi {
    parse: StdMutex<VecDeque<Result<Task, SyncError>>>,
    list: StdMutex<VecDeque<Result<Vec<Task>, SyncError>>>,
    get: StdMutex<VecDeque<Result<Task, SyncError>>>,
    update: StdMutex<VecDeque<Result<Task, SyncError>>>,
    delete: StdMutex<VecDeque<Result<(), SyncError>>>,
    health: StdMutex<VecDeque<Result<HealthStatus, SyncError>>>,
    calls: StdMutex<Vec<&'static str>>,
    gates: StdMutex<HashMap<&'static str, oneshot::Receiver<()>>>,
}

impl FakeApi {
    pub(crate) fn script_parse(&self, result: Result<Task, SyncError>) -> &Self {
        self.parse.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn script_list(&self, result: Result<Vec<Task>, SyncError>) -> &Self {
        self.list.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn script_get(&self, result: Result<Task, SyncError>) -> &Self {
        self.get.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn script_update(&self, result: Result<Task, SyncError>) -> &Self {
        self.update.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn script_delete(&self, result: Result<(), SyncError>) -> &Self {
        self.delete.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn script_health(&self, result: Result<HealthStatus, SyncError>) -> &Self {
        self.health.lock().unwrap().push_back(result);
        self
    }

    /// Holds the next call to `method` until the returned sender fires.
    pub(crate) fn gate(&self, method: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(method, rx);
        tx
    }

    pub(crate) fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == method)
            .count()
    }

    async fn enter(&self, method: &'static str) {
        self.calls.lock().unwrap().push(method);
        let gate = self.gates.lock().unwrap().remove(method);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

fn next<T>(queue: &StdMutex<VecDeque<Result<T, SyncError>>>, method: &str) -> Result<T, SyncError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(SyncError::server(None, format!("unscripted {method} call"))))
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn parse_task(&self, _text: &str) -> Result<Task, SyncError> {
        self.enter("parse").await;
        next(&self.parse, "parse")
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, SyncError> {
        self.enter("list").await;
        next(&self.list, "list")
    }

    async fn get_task(&self, _id: &TaskId) -> Result<Task, SyncError> {
        self.enter("get").await;
        next(&self.get, "get")
    }

    async fn update_task(&self, _id: &TaskId, _patch: &TaskPatch) -> Result<Task, SyncError> {
        self.enter("update").await;
        next(&self.update, "update")
    }

    async fn delete_task(&self, _id: &TaskId) -> Result<(), SyncError> {
        self.enter("delete").await;
        next(&self.delete, "delete")
    }

    async fn health_check(&self) -> Result<HealthStatus, SyncError> {
        self.enter("health").await;
        next(&self.health, "health")
    }
}

pub(crate) fn healthy() -> HealthStatus {
    HealthStatus {
        status: "healthy".to_string(),
        message: Some("API is running successfully".to_string()),
    }
}

pub(crate) fn unreachable() -> SyncError {
    SyncError::NetworkUnavailable {
        cause: "connection refused".to_string(),
    }
}

/// Lets spawned tasks run until they park.
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
