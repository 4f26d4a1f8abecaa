//! # Weaveboard: Editor-State Engine for Workflow Graphs
//!
//! Weaveboard is the headless core of a visual editor for directed workflow
//! graphs. It keeps an in-memory node/edge graph consistent while the graph is
//! simultaneously mutated by direct user edits, round-trips to a persistence
//! service, a streamed sequence of execution events, and out-of-band polling
//! for webhook payloads.
//!
//! ## Core Concepts
//!
//! - **GraphStore**: The single owner of the node and edge lists; every
//!   mutation goes through its API
//! - **IdAllocator**: Monotonic, collision-free `dndnode_<n>` identifiers
//! - **EdgeSemantics**: Typed-edge inference kept in sync with node fields
//! - **ValidationEngine**: Per-node error annotations derived from topology
//! - **ExecutionMonitor**: Run lifecycle as an explicit state machine fed by a
//!   server-sent event stream
//! - **WebhookPoller**: Cancellable periodic reconciliation of externally
//!   arriving payloads
//!
//! ## Concurrency Model
//!
//! One [`controller::EditorController`] owns all mutable state. Asynchronous
//! sources (the run event stream's reader task, the poll timer) never touch
//! the graph directly; they forward typed signals over `flume` channels and
//! the controller applies them synchronously, one at a time, when its owner
//! pumps it. Within one signal application the graph mutates atomically with
//! respect to every other signal.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use weaveboard::config::EditorConfig;
//! use weaveboard::controller::EditorController;
//! use weaveboard::graph::{NodeKind, Position};
//! use weaveboard::service::HttpWorkflowService;
//!
//! # async fn example() -> miette::Result<()> {
//! let config = EditorConfig::from_env();
//! let service = Arc::new(HttpWorkflowService::new(&config));
//! let mut editor = EditorController::new(service, config);
//!
//! // Assemble a graph.
//! let llm = editor.add_node(NodeKind::Llm, Position::new(120.0, 40.0));
//! let cfg = editor.add_node(NodeKind::ModelConfig, Position::new(40.0, 40.0));
//! editor.connect(&cfg, &llm)?;
//!
//! // Persist it and start a run.
//! editor.save().await?;
//! editor.start_run().await?;
//!
//! // Pump signals until the run terminates.
//! editor.run_to_termination().await;
//! for entry in editor.log() {
//!     println!("{} {}", entry.step, entry.status);
//! }
//!
//! editor.teardown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`graph`] - Node/edge data model and the owning [`graph::GraphStore`]
//! - [`ids`] - The `dndnode_<n>` identifier allocator
//! - [`semantics`] - Model-config edge classification and its side effects
//! - [`validation`] - Per-node validation annotations
//! - [`monitor`] - Run state machine and live stream consumption
//! - [`poller`] - Webhook payload polling
//! - [`service`] - Persistence-service contracts and the HTTP implementation
//! - [`controller`] - The stateful controller tying everything together
//! - [`config`] - Environment-driven editor configuration
//! - [`telemetry`] - Tracing subscriber setup for demos and tests

pub mod config;
pub mod controller;
pub mod graph;
pub mod ids;
pub mod monitor;
pub mod poller;
pub mod semantics;
pub mod service;
pub mod telemetry;
pub mod types;
pub mod validation;
