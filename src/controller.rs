//! The stateful editor controller.
//!
//! [`EditorController`] owns the graph store, the ID allocator, the run
//! monitor, the webhook poller, and the service handle; every mutation path
//! runs through it. Asynchronous sources never touch the graph — they send
//! signals, and the controller applies them one at a time when its owner
//! pumps [`next_signal`](EditorController::next_signal) /
//! [`handle_signal`](EditorController::handle_signal). Signal application is
//! synchronous and non-reentrant, so each application sees and leaves one
//! consistent graph.

use std::sync::Arc;

use miette::Diagnostic;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::instrument;

use crate::config::EditorConfig;
use crate::graph::{
    data_keys, Edge, EdgeChange, GraphError, GraphStore, Node, NodeKind, NodePatch, Position,
};
use crate::ids::IdAllocator;
use crate::monitor::{ExecutionMonitor, LogEntry, RunEffect, RunPhase, RunSignal};
use crate::poller::{has_eligible_webhook_nodes, WebhookPoller};
use crate::semantics;
use crate::service::{ServiceError, WorkflowDraft, WorkflowRecord, WorkflowService};
use crate::types::{RunId, WebhookId, WorkflowId};
use crate::validation;

/// Errors surfaced by controller entry points.
#[derive(Debug, Error, Diagnostic)]
pub enum EditorError {
    #[error("no workflow is loaded")]
    #[diagnostic(
        code(weaveboard::editor::no_workflow),
        help("Save or load a workflow before starting a run or registering webhooks.")
    )]
    NoWorkflow,

    #[error("validation blocks the run: {} node(s) invalid", nodes.len())]
    #[diagnostic(
        code(weaveboard::editor::validation_blocked),
        help("Fix the per-node validation annotations, then retry.")
    )]
    ValidationBlocked { nodes: Vec<String> },

    #[error(transparent)]
    #[diagnostic(code(weaveboard::editor::service))]
    Service(#[from] ServiceError),

    #[error(transparent)]
    #[diagnostic(code(weaveboard::editor::graph))]
    Graph(#[from] GraphError),
}

/// One pending unit of work for the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorSignal {
    /// From the run monitor's stream reader or linger timer.
    Run(RunSignal),
    /// From the webhook poll timer.
    PollTick,
}

/// Owns all editor state and applies every mutation.
pub struct EditorController {
    store: GraphStore,
    allocator: IdAllocator,
    monitor: ExecutionMonitor,
    poller: WebhookPoller,
    service: Arc<dyn WorkflowService>,
    workflow_id: Option<WorkflowId>,
    workflow_name: String,
}

impl EditorController {
    #[must_use]
    pub fn new(service: Arc<dyn WorkflowService>, config: EditorConfig) -> Self {
        Self {
            store: GraphStore::new(),
            allocator: IdAllocator::new(),
            monitor: ExecutionMonitor::new(config.status_linger),
            poller: WebhookPoller::new(config.poll_interval),
            service,
            workflow_id: None,
            workflow_name: "Untitled workflow".to_string(),
        }
    }

    // ---- read side -------------------------------------------------------

    #[must_use]
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    #[must_use]
    pub fn workflow_id(&self) -> Option<&WorkflowId> {
        self.workflow_id.as_ref()
    }

    #[must_use]
    pub fn run_phase(&self) -> RunPhase {
        self.monitor.phase()
    }

    /// The active run's visible log, in arrival order.
    #[must_use]
    pub fn log(&self) -> &[LogEntry] {
        self.monitor.log()
    }

    /// Current validation annotations, freshly derived.
    #[must_use]
    pub fn validation_errors(&self) -> rustc_hash::FxHashMap<String, &'static str> {
        validation::validate(self.store.nodes())
    }

    #[must_use]
    pub fn poller_running(&self) -> bool {
        self.poller.is_running()
    }

    pub fn set_workflow_name(&mut self, name: impl Into<String>) {
        self.workflow_name = name.into();
    }

    // ---- user edits ------------------------------------------------------

    /// Creates a node with a fresh `dndnode_<n>` identifier.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> String {
        self.add_node_with_data(kind, position, Map::new())
    }

    /// Creates a node with seeded configuration data.
    pub fn add_node_with_data(
        &mut self,
        kind: NodeKind,
        position: Position,
        data: Map<String, Value>,
    ) -> String {
        let id = self.allocator.next();
        let mut node = Node::new(id.clone(), kind, position);
        node.data = data;
        // Allocator IDs are fresh by construction.
        self.store
            .add_node(node)
            .unwrap_or_else(|err| unreachable!("fresh id collided: {err}"));
        self.after_graph_change();
        id
    }

    /// Removes a node, cascading incident edges and their side effects.
    pub fn remove_node(&mut self, id: &str) {
        if let Some((_, removed_edges)) = self.store.remove_node(id) {
            let patches = semantics::removal_patches(&removed_edges, self.store.nodes());
            self.store.patch_nodes(patches);
            self.after_graph_change();
        }
    }

    /// Shallow-merges `patch` into the node's data.
    pub fn patch_node_data(
        &mut self,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<(), EditorError> {
        if self.store.patch_node_data(id, patch)? {
            self.after_graph_change();
        }
        Ok(())
    }

    /// Connects two nodes, inferring the edge kind from their types.
    ///
    /// A `model_config`/`llm` pair (either direction) becomes the animated
    /// `modelConfig` edge and sets `model_config_id` on the `llm` node; any
    /// other pair becomes a plain `default` edge.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<(), EditorError> {
        match semantics::model_config_pair(self.store.nodes(), source, target) {
            Some((config_id, llm_id)) => {
                let (config_id, llm_id) = (config_id.to_string(), llm_id.to_string());
                semantics::link_model_config(&mut self.store, &config_id, &llm_id)?;
            }
            None => {
                self.store.add_edge(Edge::new(
                    Edge::deterministic_id(source, target),
                    source,
                    target,
                ))?;
            }
        }
        self.after_graph_change();
        Ok(())
    }

    /// Applies a batched structural edge diff, then the removal side effects.
    pub fn apply_edge_changes(&mut self, changes: Vec<EdgeChange>) {
        let outcome = self.store.apply_edge_changes(changes);
        if !outcome.changed {
            return;
        }
        let patches = semantics::removal_patches(&outcome.removed, self.store.nodes());
        self.store.patch_nodes(patches);
        self.after_graph_change();
    }

    // ---- persistence -----------------------------------------------------

    /// Persists the current graph; the returned ID addresses every
    /// workflow-scoped operation afterwards.
    #[instrument(skip(self), err)]
    pub async fn save(&mut self) -> Result<WorkflowId, EditorError> {
        let snapshot = self.store.serialize();
        let draft = WorkflowDraft {
            name: self.workflow_name.clone(),
            nodes: snapshot.nodes,
            edges: snapshot.edges,
        };
        let id = self.service.save_workflow(draft).await?;
        self.workflow_id = Some(id.clone());
        self.refresh_poller();
        Ok(id)
    }

    /// Loads a persisted workflow, reconciling IDs and edge kinds.
    ///
    /// Allocator reconciliation runs before any new node can be created;
    /// edge kinds are re-derived from current node types rather than trusted
    /// from the persistence layer.
    #[instrument(skip(self), fields(workflow = %id), err)]
    pub async fn load(&mut self, id: &WorkflowId) -> Result<(), EditorError> {
        let record = self.service.fetch_workflow(id).await?;
        self.allocator.reconcile(record.nodes.iter().map(|n| n.id.as_str()));
        let (edges, patches) = semantics::reconcile_loaded(&record.nodes, record.edges);
        self.store.replace(record.nodes, edges);
        self.store.patch_nodes(patches);
        self.workflow_id = Some(record.id);
        self.workflow_name = record.name;
        self.after_graph_change();
        Ok(())
    }

    /// Lists known workflows, reconciling the allocator against every node
    /// ID they contain so cross-workflow collisions stay impossible.
    #[instrument(skip(self), err)]
    pub async fn refresh_workflows(&mut self) -> Result<Vec<WorkflowRecord>, EditorError> {
        let records = self.service.list_workflows().await?;
        self.allocator.reconcile(
            records
                .iter()
                .flat_map(|r| r.nodes.iter().map(|n| n.id.as_str())),
        );
        Ok(records)
    }

    /// Registers a webhook for a `webhook_trigger` node and stores the
    /// issued ID in its data, which makes the node eligible for polling.
    #[instrument(skip(self), fields(node = %node_id), err)]
    pub async fn register_webhook(&mut self, node_id: &str) -> Result<WebhookId, EditorError> {
        let workflow_id = self.workflow_id.clone().ok_or(EditorError::NoWorkflow)?;
        if self.store.node(node_id).is_none() {
            return Err(GraphError::UnknownNode {
                id: node_id.to_string(),
            }
            .into());
        }
        let webhook_id = self.service.register_webhook(&workflow_id, node_id).await?;
        self.store.patch_node_data(
            node_id,
            [(
                data_keys::WEBHOOK_ID.to_string(),
                Value::String(webhook_id.to_string()),
            )]
            .into_iter()
            .collect(),
        )?;
        self.after_graph_change();
        Ok(webhook_id)
    }

    // ---- runs ------------------------------------------------------------

    /// Requests a run of the persisted workflow.
    ///
    /// Preconditions — a loaded workflow and an empty validation map — are
    /// checked before any network call; a rejected request leaves the run
    /// state untouched. A live prior stream is force-closed first: at most
    /// one per editor instance.
    #[instrument(skip(self), err)]
    pub async fn start_run(&mut self) -> Result<RunId, EditorError> {
        let workflow_id = self.workflow_id.clone().ok_or(EditorError::NoWorkflow)?;
        let errors = validation::validate(self.store.nodes());
        if !errors.is_empty() {
            let mut nodes: Vec<String> = errors.into_keys().collect();
            nodes.sort();
            return Err(EditorError::ValidationBlocked { nodes });
        }

        self.monitor.begin_start();
        let run_id = match self.service.start_run(&workflow_id).await {
            Ok(run_id) => run_id,
            Err(err) => {
                let effects = self.monitor.fail_start(err.to_string());
                self.project(effects);
                return Err(err.into());
            }
        };
        let stream = match self.service.open_run_stream(&workflow_id, &run_id).await {
            Ok(stream) => stream,
            Err(err) => {
                let effects = self.monitor.fail_start(err.to_string());
                self.project(effects);
                return Err(err.into());
            }
        };
        tracing::info!(workflow = %workflow_id, run = %run_id, "run stream opened");
        let effects = self.monitor.attach(run_id.clone(), stream);
        self.project(effects);
        Ok(run_id)
    }

    // ---- signal pumping --------------------------------------------------

    /// Waits for the next pending signal from any async source.
    pub async fn next_signal(&self) -> EditorSignal {
        let run_rx = self.monitor.signals();
        let tick_rx = self.poller.ticks();
        tokio::select! {
            signal = run_rx.recv_async() => match signal {
                Ok(signal) => EditorSignal::Run(signal),
                Err(_) => std::future::pending().await,
            },
            tick = tick_rx.recv_async() => match tick {
                Ok(_) => EditorSignal::PollTick,
                Err(_) => std::future::pending().await,
            },
        }
    }

    /// Applies one signal. Synchronous with respect to every other signal;
    /// the only await inside is the poll cycle's service round-trip.
    pub async fn handle_signal(&mut self, signal: EditorSignal) {
        match signal {
            EditorSignal::Run(signal) => {
                let effects = self.monitor.apply(signal);
                self.project(effects);
            }
            EditorSignal::PollTick => self.poll_webhooks().await,
        }
    }

    /// Applies every already-queued signal without waiting for more.
    pub async fn drain_pending(&mut self) {
        loop {
            if let Ok(signal) = self.monitor.signals().try_recv() {
                self.handle_signal(EditorSignal::Run(signal)).await;
            } else if self.poller.ticks().try_recv().is_ok() {
                self.handle_signal(EditorSignal::PollTick).await;
            } else {
                break;
            }
        }
    }

    /// Pumps run signals until the active run terminates.
    pub async fn run_to_termination(&mut self) {
        let run_rx = self.monitor.signals();
        while self.monitor.phase() == RunPhase::Starting
            || self.monitor.phase() == RunPhase::Streaming
        {
            match run_rx.recv_async().await {
                Ok(signal) => self.handle_signal(EditorSignal::Run(signal)).await,
                Err(_) => break,
            }
        }
    }

    /// Closes the live stream and clears every pending timer. Nothing writes
    /// after teardown.
    pub fn teardown(&mut self) {
        self.monitor.cancel();
        self.poller.stop();
    }

    // ---- internals -------------------------------------------------------

    /// Projects run effects onto the graph under the change-only write
    /// discipline; patches for nodes no longer present are skipped.
    fn project(&mut self, effects: Vec<RunEffect>) {
        for effect in effects {
            match effect {
                RunEffect::ProjectStatus { node_id, status } => {
                    self.store.patch_nodes(vec![NodePatch::set(
                        node_id,
                        data_keys::STATUS,
                        Value::String(status),
                    )]);
                }
                RunEffect::ClearStatuses => {
                    let patches: Vec<NodePatch> = self
                        .store
                        .nodes()
                        .iter()
                        .filter(|n| n.data.contains_key(data_keys::STATUS))
                        .map(|n| NodePatch::clear(n.id.clone(), data_keys::STATUS))
                        .collect();
                    self.store.patch_nodes(patches);
                }
                RunEffect::CloseStream | RunEffect::ScheduleStatusClear => {
                    unreachable!("resource effects are absorbed by the monitor")
                }
            }
        }
    }

    /// Runs after every graph mutation: revalidate (change-only), then
    /// start or stop the poller as a pure function of graph contents.
    fn after_graph_change(&mut self) {
        validation::apply(&mut self.store);
        self.refresh_poller();
    }

    fn refresh_poller(&mut self) {
        let should_poll =
            self.workflow_id.is_some() && has_eligible_webhook_nodes(self.store.nodes());
        if should_poll {
            self.poller.start();
        } else {
            self.poller.stop();
        }
    }

    /// One webhook poll cycle: fetch the persisted workflow, merge changed
    /// `last_payload` values in one batched update. Any missing piece —
    /// workflow ID, eligible nodes, the fetch itself — skips the cycle
    /// silently.
    async fn poll_webhooks(&mut self) {
        let Some(workflow_id) = self.workflow_id.clone() else {
            return;
        };
        if !has_eligible_webhook_nodes(self.store.nodes()) {
            return;
        }
        let record = match self.service.fetch_workflow(&workflow_id).await {
            Ok(record) => record,
            Err(err) => {
                tracing::debug!(workflow = %workflow_id, error = %err, "poll fetch failed; skipping cycle");
                return;
            }
        };

        let patches: Vec<NodePatch> = self
            .store
            .nodes()
            .iter()
            .filter(|n| n.kind.is_webhook_trigger() && n.webhook_id().is_some())
            .filter_map(|node| {
                let fetched = record.nodes.iter().find(|f| f.id == node.id)?;
                let incoming = fetched.data.get(data_keys::LAST_PAYLOAD);
                let current = node.data.get(data_keys::LAST_PAYLOAD);
                if incoming == current {
                    return None;
                }
                Some(NodePatch::set(
                    node.id.clone(),
                    data_keys::LAST_PAYLOAD,
                    incoming.cloned().unwrap_or(Value::Null),
                ))
            })
            .collect();

        if !patches.is_empty() {
            tracing::debug!(count = patches.len(), "webhook payloads changed");
            self.store.patch_nodes(patches);
        }
    }
}
