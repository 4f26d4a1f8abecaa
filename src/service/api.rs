use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{Edge, Node};
use crate::types::{RunId, WebhookId, WorkflowId};

use super::sse::RunStream;

/// Errors raised by the persistence service boundary.
///
/// All of these are the transport class: inside a run they surface as a
/// synthetic log entry and terminate the stream; outside a run they bubble
/// to the caller for retry.
#[derive(Debug, Error, Diagnostic)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    #[diagnostic(
        code(weaveboard::service::transport),
        help("Check that the workflow service is reachable at the configured base URL.")
    )]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} answered {status}")]
    #[diagnostic(code(weaveboard::service::status))]
    UnexpectedStatus { endpoint: String, status: u16 },

    #[error("response decode failed: {0}")]
    #[diagnostic(code(weaveboard::service::decode))]
    Decode(#[from] serde_json::Error),
}

/// A workflow as the client submits it for persistence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowDraft {
    pub name: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// A persisted workflow as the service returns it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub id: WorkflowId,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// The persistence/run/webhook backend, specified at its interface boundary.
///
/// One implementation per transport; the controller holds it as
/// `Arc<dyn WorkflowService>` so tests can script responses and count calls.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    /// `POST /workflows` — persists the draft, returns the workflow ID.
    async fn save_workflow(&self, draft: WorkflowDraft) -> Result<WorkflowId, ServiceError>;

    /// `GET /workflows` — every persisted workflow the client can see.
    async fn list_workflows(&self) -> Result<Vec<WorkflowRecord>, ServiceError>;

    /// `GET /workflows/{id}` — one persisted workflow.
    async fn fetch_workflow(&self, id: &WorkflowId) -> Result<WorkflowRecord, ServiceError>;

    /// `POST /workflows/{id}/run` — starts an asynchronous run.
    async fn start_run(&self, id: &WorkflowId) -> Result<RunId, ServiceError>;

    /// Opens the event stream for `(workflow, run)`.
    async fn open_run_stream(
        &self,
        id: &WorkflowId,
        run: &RunId,
    ) -> Result<RunStream, ServiceError>;

    /// `POST /webhooks/register` — registers a webhook for one node.
    async fn register_webhook(
        &self,
        id: &WorkflowId,
        node_id: &str,
    ) -> Result<WebhookId, ServiceError>;
}
