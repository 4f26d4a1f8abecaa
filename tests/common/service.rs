#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;
use weaveboard::service::{
    RunStream, ServiceError, WorkflowDraft, WorkflowRecord, WorkflowService,
};
use weaveboard::types::{RunId, WebhookId, WorkflowId};

/// Per-endpoint call counters, for asserting "no network call was made".
#[derive(Debug, Default)]
pub struct CallCounts {
    pub save: AtomicUsize,
    pub list: AtomicUsize,
    pub fetch: AtomicUsize,
    pub start_run: AtomicUsize,
    pub open_stream: AtomicUsize,
    pub register_webhook: AtomicUsize,
}

/// In-memory [`WorkflowService`] with scripted responses.
///
/// Tests seed `records` with persisted workflows (and mutate them mid-test
/// to simulate out-of-band webhook deliveries) and `stream_script` with the
/// messages one run stream should yield.
#[derive(Default)]
pub struct ScriptedService {
    pub records: Mutex<Vec<WorkflowRecord>>,
    pub stream_script: Mutex<Option<Vec<Result<String, ServiceError>>>>,
    pub fail_start_run: std::sync::atomic::AtomicBool,
    pub calls: CallCounts,
    next_id: AtomicUsize,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, record: WorkflowRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// Scripts the next opened run stream; the stream ends (EOF) after the
    /// last message unless a sentinel terminates it earlier.
    pub fn script_stream(&self, messages: Vec<Result<String, ServiceError>>) {
        *self.stream_script.lock().unwrap() = Some(messages);
    }

    /// Replaces a persisted node's data entry, as an out-of-band webhook
    /// delivery would.
    pub fn set_persisted_data(&self, workflow: &str, node: &str, key: &str, value: serde_json::Value) {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id.as_str() == workflow)
            .expect("workflow seeded");
        let node = record
            .nodes
            .iter_mut()
            .find(|n| n.id == node)
            .expect("node present");
        node.data.insert(key.to_string(), value);
    }
}

fn not_found(endpoint: &str) -> ServiceError {
    ServiceError::UnexpectedStatus {
        endpoint: endpoint.to_string(),
        status: 404,
    }
}

#[async_trait]
impl WorkflowService for ScriptedService {
    async fn save_workflow(&self, draft: WorkflowDraft) -> Result<WorkflowId, ServiceError> {
        self.calls.save.fetch_add(1, Ordering::SeqCst);
        let id = WorkflowId::new(format!("wf_{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.records.lock().unwrap().push(WorkflowRecord {
            id: id.clone(),
            name: draft.name,
            nodes: draft.nodes,
            edges: draft.edges,
        });
        Ok(id)
    }

    async fn list_workflows(&self) -> Result<Vec<WorkflowRecord>, ServiceError> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().clone())
    }

    async fn fetch_workflow(&self, id: &WorkflowId) -> Result<WorkflowRecord, ServiceError> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| not_found("GET /workflows/{id}"))
    }

    async fn start_run(&self, _id: &WorkflowId) -> Result<RunId, ServiceError> {
        self.calls.start_run.fetch_add(1, Ordering::SeqCst);
        if self.fail_start_run.load(Ordering::SeqCst) {
            return Err(ServiceError::UnexpectedStatus {
                endpoint: "POST /workflows/{id}/run".to_string(),
                status: 500,
            });
        }
        Ok(RunId::new(format!(
            "run_{}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        )))
    }

    async fn open_run_stream(
        &self,
        _id: &WorkflowId,
        _run: &RunId,
    ) -> Result<RunStream, ServiceError> {
        self.calls.open_stream.fetch_add(1, Ordering::SeqCst);
        let script = self
            .stream_script
            .lock()
            .unwrap()
            .take()
            .unwrap_or_default();
        Ok(RunStream::from_stream(stream::iter(script)))
    }

    async fn register_webhook(
        &self,
        _id: &WorkflowId,
        _node_id: &str,
    ) -> Result<WebhookId, ServiceError> {
        self.calls.register_webhook.fetch_add(1, Ordering::SeqCst);
        Ok(WebhookId::new(format!(
            "wh_{}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        )))
    }
}
