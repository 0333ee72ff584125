//! Orchestration of user intents: sync call, then store mutation, then banner.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use async_trait::async_trait;
use shared::{
    domain::TaskId,
    protocol::{Task, TaskPatch},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    connectivity::{Connectivity, ConnectivityMonitor},
    error::SyncError,
    notification::NotificationController,
    ordering::TaskView,
    store::{InsertOutcome, RemoveOutcome, ReplaceOutcome, TaskStore},
    TaskApi,
};

pub const CREATED_MESSAGE: &str = "Task created successfully!";
pub const UPDATED_MESSAGE: &str = "Task updated successfully!";
pub const DELETED_MESSAGE: &str = "Task deleted successfully!";
pub const REFRESHED_MESSAGE: &str = "Tasks refreshed";
pub const BACKEND_DOWN_MESSAGE: &str =
    "Backend server is not running. Please start the API server.";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this task?";

#[async_trait]
pub trait ConfirmationPort: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

pub struct FixedConfirmation(pub bool);

#[async_trait]
impl ConfirmationPort for FixedConfirmation {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PendingAction {
    Create,
    Refresh,
    Edit(TaskId),
    Delete(TaskId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Failed(SyncError),
    Declined,
    AlreadyPending,
}

/// Removes its key from the pending set when dropped, including when the
/// action future is dropped mid-flight.
struct PendingGuard<'a> {
    pending: &'a StdMutex<HashSet<PendingAction>>,
    action: PendingAction,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.action);
    }
}

pub struct AppController {
    api: Arc<dyn TaskApi>,
    confirmation: Arc<dyn ConfirmationPort>,
    store: Mutex<TaskStore>,
    pending: StdMutex<HashSet<PendingAction>>,
    notifications: NotificationController,
    connectivity: ConnectivityMonitor,
}

impl AppController {
    pub fn new(api: Arc<dyn TaskApi>, confirmation: Arc<dyn ConfirmationPort>) -> Self {
        Self {
            api,
            confirmation,
            store: Mutex::new(TaskStore::new()),
            pending: StdMutex::new(HashSet::new()),
            notifications: NotificationController::new(),
            connectivity: ConnectivityMonitor::new(),
        }
    }

    pub fn notifications(&self) -> &NotificationController {
        &self.notifications
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn is_pending(&self, action: &PendingAction) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(action)
    }

    /// Probes the backend and loads the initial collection concurrently. The
    /// listing is skipped if a refresh is already in flight.
    pub async fn startup(&self) -> Connectivity {
        let guard = self.begin(PendingAction::Refresh);
        let since = self.store.lock().await.revision();
        let listing = async {
            match guard {
                Some(_) => Some(self.api.list_tasks().await),
                None => None,
            }
        };
        let (connectivity, listing) =
            futures::join!(self.connectivity.probe(self.api.as_ref()), listing);

        match listing {
            Some(Ok(tasks)) => {
                let count = self.store.lock().await.hydrate(tasks, since);
                info!(count, "hydrated task store");
            }
            Some(Err(err)) => {
                warn!(error = %err, "initial task listing failed");
                if connectivity == Connectivity::Connected {
                    self.notifications.error(err.to_string());
                }
            }
            None => debug!("refresh already in flight, startup listing skipped"),
        }
        if connectivity == Connectivity::Disconnected {
            self.notifications.error(BACKEND_DOWN_MESSAGE);
        }
        connectivity
    }

    pub async fn create(&self, text: &str) -> ActionOutcome {
        let Some(_guard) = self.begin(PendingAction::Create) else {
            return ActionOutcome::AlreadyPending;
        };

        match self.api.parse_task(text).await {
            Ok(task) => {
                let id = task.id.clone();
                let outcome = self.store.lock().await.insert(task);
                if outcome == InsertOutcome::ReplacedExisting {
                    warn!(task_id = %id, "created task was already mirrored");
                }
                info!(task_id = %id, "task created");
                self.notifications.success(CREATED_MESSAGE);
                ActionOutcome::Applied
            }
            Err(err) => self.fail("create", err),
        }
    }

    pub async fn edit(&self, id: &TaskId, patch: &TaskPatch) -> ActionOutcome {
        let Some(_guard) = self.begin(PendingAction::Edit(id.clone())) else {
            return ActionOutcome::AlreadyPending;
        };

        match self.api.update_task(id, patch).await {
            Ok(task) => {
                match self.store.lock().await.replace(id, task) {
                    ReplaceOutcome::Replaced => info!(task_id = %id, "task updated"),
                    ReplaceOutcome::Missing => {
                        warn!(task_id = %id, "updated task is no longer mirrored locally")
                    }
                    ReplaceOutcome::Stale => {
                        warn!(task_id = %id, "ignored update older than the mirrored task")
                    }
                }
                self.notifications.success(UPDATED_MESSAGE);
                ActionOutcome::Applied
            }
            Err(err) => self.fail("edit", err),
        }
    }

    pub async fn delete(&self, id: &TaskId) -> ActionOutcome {
        let action = PendingAction::Delete(id.clone());
        if self.is_pending(&action) {
            return ActionOutcome::AlreadyPending;
        }
        if !self.confirmation.confirm(DELETE_PROMPT).await {
            info!(task_id = %id, "delete declined");
            return ActionOutcome::Declined;
        }
        let Some(_guard) = self.begin(action) else {
            return ActionOutcome::AlreadyPending;
        };

        match self.api.delete_task(id).await {
            Ok(()) => {
                if self.store.lock().await.remove(id) == RemoveOutcome::Missing {
                    warn!(task_id = %id, "deleted task was not mirrored locally");
                }
                info!(task_id = %id, "task deleted");
                self.notifications.success(DELETED_MESSAGE);
                ActionOutcome::Applied
            }
            Err(err) => self.fail("delete", err),
        }
    }

    pub async fn refresh(&self) -> ActionOutcome {
        let Some(_guard) = self.begin(PendingAction::Refresh) else {
            return ActionOutcome::AlreadyPending;
        };

        let since = self.store.lock().await.revision();
        match self.api.list_tasks().await {
            Ok(tasks) => {
                let count = self.store.lock().await.hydrate(tasks, since);
                info!(count, "task store refreshed");
                self.notifications.success(REFRESHED_MESSAGE);
                ActionOutcome::Applied
            }
            Err(err) => self.fail("refresh", err),
        }
    }

    /// Fetches the server's copy of one task and reconciles it into the store
    /// if it is mirrored. Unknown tasks are returned but never inserted.
    pub async fn inspect(&self, id: &TaskId) -> Result<Task, SyncError> {
        match self.api.get_task(id).await {
            Ok(task) => {
                let outcome = self.store.lock().await.replace(id, task.clone());
                info!(task_id = %id, ?outcome, "task inspected");
                Ok(task)
            }
            Err(err) => {
                warn!(task_id = %id, error = %err, "task lookup failed");
                self.notifications.error(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn cached(&self, id: &TaskId) -> Option<Task> {
        self.store.lock().await.get(id).cloned()
    }

    pub async fn view(&self) -> TaskView {
        TaskView::from_tasks(self.store.lock().await.tasks())
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.store.lock().await.tasks().to_vec()
    }

    fn begin(&self, action: PendingAction) -> Option<PendingGuard<'_>> {
        let inserted = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(action.clone());
        inserted.then(|| PendingGuard {
            pending: &self.pending,
            action,
        })
    }

    fn fail(&self, action: &'static str, err: SyncError) -> ActionOutcome {
        warn!(action, error = %err, status = ?err.status(), "action failed");
        self.notifications.error(err.to_string());
        ActionOutcome::Failed(err)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
