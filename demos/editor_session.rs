//! Demo: A Full Editor Session
//!
//! This demonstration walks one editor session end to end against an
//! in-process workflow service, so it runs without a backend. It covers
//! graph editing, semantic edges, validation gating, run monitoring, and
//! webhook polling.
//!
//! What You'll Learn:
//! 1. Graph Editing: Nodes with allocator-issued IDs, typed edges
//! 2. Semantic Links: `model_config` ↔ `llm` connections and their side effects
//! 3. Validation Gating: Why an unconfigured `llm` node blocks a run
//! 4. Run Monitoring: Pumping stream signals and reading the live log
//! 5. Webhook Polling: Payload changes merged on the poll timer
//!
//! Running This Demo:
//! ```bash
//! cargo run --example editor_session
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;
use miette::Result;
use serde_json::json;
use tracing::info;
use weaveboard::config::EditorConfig;
use weaveboard::controller::EditorController;
use weaveboard::graph::{data_keys, NodeKind, Position};
use weaveboard::service::{
    RunStream, ServiceError, WorkflowDraft, WorkflowRecord, WorkflowService,
};
use weaveboard::types::{RunId, WebhookId, WorkflowId};

/// In-memory workflow service: persists drafts, streams a canned run, and
/// issues webhook IDs. Stands in for the HTTP backend.
#[derive(Default)]
struct LocalService {
    records: Mutex<Vec<WorkflowRecord>>,
    next_id: AtomicUsize,
}

impl LocalService {
    fn issue(&self, prefix: &str) -> String {
        format!("{prefix}_{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl WorkflowService for LocalService {
    async fn save_workflow(&self, draft: WorkflowDraft) -> Result<WorkflowId, ServiceError> {
        let id = WorkflowId::new(self.issue("wf"));
        self.records.lock().unwrap().push(WorkflowRecord {
            id: id.clone(),
            name: draft.name,
            nodes: draft.nodes,
            edges: draft.edges,
        });
        Ok(id)
    }

    async fn list_workflows(&self) -> Result<Vec<WorkflowRecord>, ServiceError> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn fetch_workflow(&self, id: &WorkflowId) -> Result<WorkflowRecord, ServiceError> {
        // Simulate a webhook delivery landing between polls.
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| ServiceError::UnexpectedStatus {
                endpoint: format!("/workflows/{id}"),
                status: 404,
            })?;
        for node in &mut record.nodes {
            if node.kind.is_webhook_trigger() && node.webhook_id().is_some() {
                node.data.insert(
                    data_keys::LAST_PAYLOAD.to_string(),
                    json!({"event": "order.created", "order_id": 1042}),
                );
            }
        }
        Ok(record.clone())
    }

    async fn start_run(&self, _id: &WorkflowId) -> Result<RunId, ServiceError> {
        Ok(RunId::new(self.issue("run")))
    }

    async fn open_run_stream(
        &self,
        _id: &WorkflowId,
        _run: &RunId,
    ) -> Result<RunStream, ServiceError> {
        let events = vec![
            json!({"step": "trigger", "status": "Running", "node_id": "dndnode_0"}),
            json!({"step": "trigger", "status": "Completed", "node_id": "dndnode_0"}),
            json!({"step": "llm call", "status": "Running", "node_id": "dndnode_1"}),
            json!({"step": "llm call", "status": "Completed", "node_id": "dndnode_1"}),
            json!({"step": "End", "status": "Completed"}),
            json!({"step": "__END__", "status": ""}),
        ];
        Ok(RunStream::from_stream(stream::iter(
            events.into_iter().map(|e| Ok(e.to_string())),
        )))
    }

    async fn register_webhook(
        &self,
        _id: &WorkflowId,
        _node_id: &str,
    ) -> Result<WebhookId, ServiceError> {
        Ok(WebhookId::new(self.issue("wh")))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    weaveboard::telemetry::init();

    let config = EditorConfig::default()
        .with_poll_interval(Duration::from_millis(200))
        .with_status_linger(Duration::from_millis(400));
    let mut editor = EditorController::new(Arc::new(LocalService::default()), config);
    editor.set_workflow_name("demo session");

    // --- Edit: build a small workflow ------------------------------------
    let trigger = editor.add_node(NodeKind::Trigger, Position::new(0.0, 0.0));
    let llm = editor.add_node(NodeKind::Llm, Position::new(200.0, 0.0));
    let cfg = editor.add_node(NodeKind::ModelConfig, Position::new(200.0, 150.0));
    editor.connect(&trigger, &llm)?;
    info!(%trigger, %llm, %cfg, "nodes created");

    // The llm node is flagged until it gets a model configuration.
    info!(errors = ?editor.validation_errors(), "validation before linking");
    editor.connect(&cfg, &llm)?;
    info!(errors = ?editor.validation_errors(), "validation after linking");

    // --- Persist and run --------------------------------------------------
    let workflow_id = editor.save().await?;
    info!(%workflow_id, "workflow saved");

    let run_id = editor.start_run().await?;
    info!(%run_id, "run started; pumping stream signals");
    editor.run_to_termination().await;

    for entry in editor.log() {
        info!(step = %entry.step, status = %entry.status, node = ?entry.node_id, "log entry");
    }

    // Node statuses linger briefly after the End step, then clear.
    tokio::time::sleep(Duration::from_millis(600)).await;
    editor.drain_pending().await;
    info!(
        status = ?editor.store().node(&llm).and_then(|n| n.data_str(data_keys::STATUS)),
        "llm status after linger"
    );

    // --- Webhooks ---------------------------------------------------------
    let hook_node = editor.add_node(NodeKind::WebhookTrigger, Position::new(0.0, 150.0));
    let webhook_id = editor.register_webhook(&hook_node).await?;
    // Persist the webhook binding so polls can see deliveries.
    editor.save().await?;
    info!(%webhook_id, polling = editor.poller_running(), "webhook registered");

    // Wait out one poll period and apply whatever arrived.
    tokio::time::sleep(Duration::from_millis(300)).await;
    editor.drain_pending().await;
    info!(
        payload = ?editor.store().node(&hook_node).and_then(|n| n.data.get(data_keys::LAST_PAYLOAD)),
        "payload after poll"
    );

    editor.teardown();
    Ok(())
}
