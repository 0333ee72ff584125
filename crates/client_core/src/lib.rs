use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use shared::{
    domain::TaskId,
    error::message_from_body,
    protocol::{Acknowledgement, HealthStatus, ParseTaskRequest, Task, TaskEnvelope, TaskPatch},
};
use tracing::{debug, warn};
use url::Url;

pub mod connectivity;
pub mod controller;
pub mod error;
pub mod notification;
pub mod ordering;
pub mod store;

#[cfg(test)]
mod test_support;

pub use connectivity::{Connectivity, ConnectivityMonitor};
pub use controller::{
    ActionOutcome, AppController, ConfirmationPort, FixedConfirmation, PendingAction,
};
pub use error::SyncError;
pub use notification::{Banner, Notification, NotificationController, NotificationKind};
pub use ordering::{arrange, compare_tasks, PriorityGroup, TaskView};
pub use store::{InsertOutcome, RemoveOutcome, ReplaceOutcome, TaskStore};

pub const MAX_TASK_TEXT_CHARS: usize = 500;
const CREATE_FAILED_MESSAGE: &str = "Failed to create task";
const UPDATE_FAILED_MESSAGE: &str = "Failed to update task";
const DELETE_FAILED_MESSAGE: &str = "Failed to delete task";
const MALFORMED_RESPONSE_MESSAGE: &str = "Received an unreadable response from the server";

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn parse_task(&self, text: &str) -> Result<Task, SyncError>;
    async fn list_tasks(&self) -> Result<Vec<Task>, SyncError>;
    async fn get_task(&self, id: &TaskId) -> Result<Task, SyncError>;
    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, SyncError>;
    async fn delete_task(&self, id: &TaskId) -> Result<(), SyncError>;
    async fn health_check(&self) -> Result<HealthStatus, SyncError>;
}

pub fn validate_task_text(text: &str) -> Result<&str, SyncError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SyncError::validation("Please enter a task description"));
    }
    if trimmed.chars().count() > MAX_TASK_TEXT_CHARS {
        return Err(SyncError::validation(format!(
            "Task description must be at most {MAX_TASK_TEXT_CHARS} characters"
        )));
    }
    Ok(trimmed)
}

pub fn validate_patch(patch: &TaskPatch) -> Result<(), SyncError> {
    if patch.is_empty() {
        return Err(SyncError::validation("No fields to update"));
    }
    if patch
        .task_name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return Err(SyncError::validation("Task name must not be empty"));
    }
    Ok(())
}

pub struct HttpTaskClient {
    http: Client,
    base_url: Url,
}

impl HttpTaskClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    fn endpoint(&self, segments: &[&str], trailing_slash: bool) -> Result<Url, SyncError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                SyncError::validation(format!("invalid API base URL '{}'", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
            if trailing_slash {
                path.push("");
            }
        }
        Ok(url)
    }

    fn tasks_endpoint(&self, id: Option<&TaskId>) -> Result<Url, SyncError> {
        match id {
            Some(id) => self.endpoint(&["api", "tasks", id.as_str()], false),
            None => self.endpoint(&["api", "tasks"], true),
        }
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&(impl serde::Serialize + Sync)>,
    ) -> Result<Vec<u8>, SyncError> {
        debug!("making {method} request to {url}");
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            warn!(%method, %url, error = %err, "request failed without a response");
            SyncError::network(&err)
        })?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| {
            warn!(
                %method,
                %url,
                status = status.as_u16(),
                error = %err,
                "response body interrupted"
            );
            SyncError::server(Some(status.as_u16()), MALFORMED_RESPONSE_MESSAGE)
        })?;

        if !status.is_success() {
            let message = message_from_body(&bytes);
            warn!(%method, %url, status = status.as_u16(), %message, "server rejected request");
            return Err(SyncError::server(Some(status.as_u16()), message));
        }
        Ok(bytes.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&(impl serde::Serialize + Sync)>,
    ) -> Result<T, SyncError> {
        let bytes = self.send(method, url.clone(), body).await?;
        serde_json::from_slice(&bytes).map_err(|err| {
            warn!(%url, error = %err, "could not decode response body");
            SyncError::server(None, MALFORMED_RESPONSE_MESSAGE)
        })
    }
}

const NO_BODY: Option<&()> = None;

#[async_trait]
impl TaskApi for HttpTaskClient {
    async fn parse_task(&self, text: &str) -> Result<Task, SyncError> {
        let text = validate_task_text(text)?;
        let url = self.endpoint(&["api", "tasks", "parse"], false)?;
        let envelope: TaskEnvelope = self
            .send_json(
                Method::POST,
                url,
                Some(&ParseTaskRequest {
                    text: text.to_string(),
                }),
            )
            .await?;
        unwrap_envelope(envelope, CREATE_FAILED_MESSAGE)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, SyncError> {
        let url = self.tasks_endpoint(None)?;
        self.send_json(Method::GET, url, NO_BODY).await
    }

    async fn get_task(&self, id: &TaskId) -> Result<Task, SyncError> {
        let url = self.tasks_endpoint(Some(id))?;
        self.send_json(Method::GET, url, NO_BODY).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, SyncError> {
        validate_patch(patch)?;
        let url = self.tasks_endpoint(Some(id))?;
        let envelope: TaskEnvelope = self.send_json(Method::PUT, url, Some(patch)).await?;
        unwrap_envelope(envelope, UPDATE_FAILED_MESSAGE)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), SyncError> {
        let url = self.tasks_endpoint(Some(id))?;
        let ack: Acknowledgement = self.send_json(Method::DELETE, url, NO_BODY).await?;
        if ack.success {
            Ok(())
        } else {
            Err(SyncError::server(
                None,
                ack.message.unwrap_or_else(|| DELETE_FAILED_MESSAGE.to_string()),
            ))
        }
    }

    async fn health_check(&self) -> Result<HealthStatus, SyncError> {
        let url = self.endpoint(&["health"], false)?;
        self.send_json(Method::GET, url, NO_BODY).await
    }
}

fn unwrap_envelope(envelope: TaskEnvelope, fallback: &str) -> Result<Task, SyncError> {
    match envelope {
        TaskEnvelope {
            success: true,
            data: Some(task),
            ..
        } => Ok(task),
        TaskEnvelope {
            success: true,
            data: None,
            ..
        } => {
            warn!("successful envelope carried no task");
            Err(SyncError::server(None, fallback))
        }
        TaskEnvelope { message, .. } => Err(SyncError::server(
            None,
            message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        )),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
