use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::config::EditorConfig;
use crate::types::{RunId, WebhookId, WorkflowId};

use super::api::{ServiceError, WorkflowDraft, WorkflowRecord, WorkflowService};
use super::sse::RunStream;

#[derive(Deserialize)]
struct CreatedWorkflow {
    workflow_id: WorkflowId,
}

#[derive(Deserialize)]
struct StartedRun {
    run_id: RunId,
}

#[derive(Deserialize)]
struct RegisteredWebhook {
    webhook_id: WebhookId,
}

/// [`WorkflowService`] over HTTP, using the crate-wide `reqwest` client
/// configuration (JSON bodies, rustls, streaming responses).
pub struct HttpWorkflowService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWorkflowService {
    #[must_use]
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
        }
    }

    /// Uses a preconfigured client, e.g. with custom timeouts.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn ensure_success(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ServiceError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl WorkflowService for HttpWorkflowService {
    #[instrument(skip(self, draft), fields(name = %draft.name), err)]
    async fn save_workflow(&self, draft: WorkflowDraft) -> Result<WorkflowId, ServiceError> {
        let response = self
            .client
            .post(self.url("/workflows"))
            .json(&draft)
            .send()
            .await?;
        let created: CreatedWorkflow = Self::ensure_success(response, "POST /workflows")?
            .json()
            .await?;
        Ok(created.workflow_id)
    }

    #[instrument(skip(self), err)]
    async fn list_workflows(&self) -> Result<Vec<WorkflowRecord>, ServiceError> {
        let response = self.client.get(self.url("/workflows")).send().await?;
        Ok(Self::ensure_success(response, "GET /workflows")?
            .json()
            .await?)
    }

    #[instrument(skip(self), fields(workflow = %id), err)]
    async fn fetch_workflow(&self, id: &WorkflowId) -> Result<WorkflowRecord, ServiceError> {
        let endpoint = format!("/workflows/{id}");
        let response = self.client.get(self.url(&endpoint)).send().await?;
        Ok(Self::ensure_success(response, &endpoint)?.json().await?)
    }

    #[instrument(skip(self), fields(workflow = %id), err)]
    async fn start_run(&self, id: &WorkflowId) -> Result<RunId, ServiceError> {
        let endpoint = format!("/workflows/{id}/run");
        let response = self.client.post(self.url(&endpoint)).send().await?;
        let started: StartedRun = Self::ensure_success(response, &endpoint)?.json().await?;
        Ok(started.run_id)
    }

    #[instrument(skip(self), fields(workflow = %id, run = %run), err)]
    async fn open_run_stream(
        &self,
        id: &WorkflowId,
        run: &RunId,
    ) -> Result<RunStream, ServiceError> {
        let endpoint = format!("/workflows/{id}/runs/{run}/stream");
        let response = self
            .client
            .get(self.url(&endpoint))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = Self::ensure_success(response, &endpoint)?;
        Ok(RunStream::from_response(response))
    }

    #[instrument(skip(self), fields(workflow = %id, node = %node_id), err)]
    async fn register_webhook(
        &self,
        id: &WorkflowId,
        node_id: &str,
    ) -> Result<WebhookId, ServiceError> {
        let response = self
            .client
            .post(self.url("/webhooks/register"))
            .json(&json!({"workflow_id": id, "node_id": node_id}))
            .send()
            .await?;
        let registered: RegisteredWebhook =
            Self::ensure_success(response, "POST /webhooks/register")?
                .json()
                .await?;
        Ok(registered.webhook_id)
    }
}
