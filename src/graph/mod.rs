//! Workflow graph data model and the owning store.
//!
//! This module defines the wire-faithful [`Node`] and [`Edge`] types and the
//! [`GraphStore`] that exclusively owns both lists. Every other component —
//! validation, edge semantics, run-status projection, webhook reconciliation
//! — mutates the graph only through the store's API, which is what makes the
//! change-only write discipline enforceable in one place.
//!
//! # Core Types
//!
//! - [`Node`] / [`NodeKind`]: A typed, positioned unit of the workflow, with
//!   a free-form JSON `data` map holding configuration and transient fields
//! - [`Edge`] / [`EdgeKind`]: A typed directed link between two nodes
//! - [`GraphStore`]: Mutation API with batched edge changes and shallow-merge
//!   node patches
//! - [`NodePatch`]: One shallow-merge request against a node's `data`
//!
//! # Change Tracking
//!
//! The store carries a [`GraphStore::revision`] counter bumped only by
//! mutations that actually change state. Idempotent re-application of a patch
//! leaves the revision untouched, which is what downstream components rely on
//! to avoid update storms.

mod edge;
mod node;
mod store;

pub use edge::{Edge, EdgeChange, EdgeChangeOutcome, EdgeKind};
pub use node::{data_keys, Node, NodeKind, Position};
pub use store::{GraphError, GraphSnapshot, GraphStore, NodePatch};
