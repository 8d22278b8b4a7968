//! Todoist REST API client.

use reqwest::Url;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::ApiToken;
use crate::error::ServiceErrorKind;
use crate::http::error_body;
use crate::models::{CreatedTask, Due, TaskRequest};
use crate::{Error, Result};

/// Body of `POST /tasks`.
#[derive(Debug, Serialize)]
struct CreateTaskBody<'a> {
    content: &'a str,
    project_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_datetime: Option<String>,
}

impl<'a> From<&'a TaskRequest> for CreateTaskBody<'a> {
    fn from(request: &'a TaskRequest) -> Self {
        let (due_date, due_datetime) = match request.due {
            Due::Date(_) => (Some(request.due.to_string()), None),
            Due::DateTime(_) => (None, Some(request.due.to_string())),
        };
        Self {
            content: &request.title,
            project_id: &request.project_id,
            description: request.description.as_deref(),
            due_date,
            due_datetime,
        }
    }
}

/// Thin client over the Todoist task endpoints.
pub struct TodoistClient {
    http: reqwest::Client,
    tasks_url: String,
    token: ApiToken,
}

impl TodoistClient {
    pub fn new(http: reqwest::Client, api_base: &Url, token: ApiToken) -> Self {
        Self {
            http,
            tasks_url: format!("{}/tasks", api_base.as_str().trim_end_matches('/')),
            token,
        }
    }

    /// Create one task; errors are scoped to this request.
    pub async fn create_task(&self, request: &TaskRequest) -> Result<CreatedTask> {
        let body = CreateTaskBody::from(request);

        let response = self
            .http
            .post(&self.tasks_url)
            .bearer_auth(self.token.expose())
            .header("X-Request-Id", Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Service {
                kind: ServiceErrorKind::Transport,
                message: format!("Create task request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = error_body(response).await;
            return Err(Error::Service {
                kind: ServiceErrorKind::from_status(status.as_u16()),
                message: format!("Todoist returned {}: {}", status, text),
            });
        }

        let created: CreatedTask = response.json().await.map_err(|e| Error::Service {
            kind: ServiceErrorKind::Unavailable,
            message: format!("Failed to parse create task response: {}", e),
        })?;

        info!(
            "Created task {} for '{}' ({})",
            created.id,
            request.title,
            created.url.as_deref().unwrap_or("no url")
        );
        Ok(created)
    }
}
