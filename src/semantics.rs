//! Typed-edge inference and its node-field side effects.
//!
//! An edge between a `model_config` node and an `llm` node (in either
//! direction) is the distinguished `modelConfig` edge: it is animated, and
//! the `llm` node's `model_config_id` mirrors the link. This module keeps the
//! two representations in sync through three pure entry points plus a pair
//! of idempotent store helpers:
//!
//! - [`classify`] decides an edge's kind from its endpoint node kinds
//! - [`reconcile_loaded`] re-derives every persisted edge's kind on load
//! - [`removal_patches`] turns a batch of committed edge removals into the
//!   `model_config_id` clears they imply
//! - [`link_model_config`] / [`unlink_model_config`] maintain the edge and
//!   the field together, tolerating either source/target order
//!
//! The pure functions never touch the store; the controller applies their
//! outputs after the triggering mutation commits, so the side effect fires
//! exactly once per removed edge and never for `default` edges.

use serde_json::Value;

use crate::graph::{data_keys, Edge, EdgeKind, GraphError, GraphStore, Node, NodePatch};

/// Classifies a prospective edge from its endpoint kinds.
#[must_use]
pub fn classify(source: &crate::graph::NodeKind, target: &crate::graph::NodeKind) -> EdgeKind {
    let pair_matches = (source.is_model_config() && target.is_llm())
        || (source.is_llm() && target.is_model_config());
    if pair_matches {
        EdgeKind::ModelConfig
    } else {
        EdgeKind::Default
    }
}

/// Splits a model-config pair into `(config_id, llm_id)`, in either
/// source/target order. `None` for any other pair or missing endpoint.
#[must_use]
pub fn model_config_pair<'a>(nodes: &'a [Node], source: &str, target: &str) -> Option<(&'a str, &'a str)> {
    let source = nodes.iter().find(|n| n.id == source)?;
    let target = nodes.iter().find(|n| n.id == target)?;
    if source.kind.is_model_config() && target.kind.is_llm() {
        Some((&source.id, &target.id))
    } else if source.kind.is_llm() && target.kind.is_model_config() {
        Some((&target.id, &source.id))
    } else {
        None
    }
}

/// Re-derives edge kinds for a freshly loaded workflow.
///
/// Persisted kinds are not trusted: an edge saved before a node's type
/// changed, or by an older schema, is re-typed from the current endpoint
/// kinds. Returns the re-typed edges together with the `model_config_id`
/// patches implied by every edge that came out `modelConfig`.
///
/// Runs once per load, after nodes are known, before edges are committed.
#[must_use]
pub fn reconcile_loaded(nodes: &[Node], edges: Vec<Edge>) -> (Vec<Edge>, Vec<NodePatch>) {
    let mut patches = Vec::new();
    let reconciled = edges
        .into_iter()
        .map(|mut edge| {
            match model_config_pair(nodes, &edge.source, &edge.target) {
                Some((config_id, llm_id)) => {
                    edge.kind = EdgeKind::ModelConfig;
                    edge.animated = true;
                    patches.push(NodePatch::set(
                        llm_id,
                        data_keys::MODEL_CONFIG_ID,
                        Value::String(config_id.to_string()),
                    ));
                }
                None => {
                    edge.kind = EdgeKind::Default;
                }
            }
            edge
        })
        .collect();
    (reconciled, patches)
}

/// The node patches implied by a batch of committed edge removals.
///
/// For each removed `modelConfig` edge, one patch clearing `model_config_id`
/// on whichever endpoint is the `llm` node. `default` edges imply nothing.
#[must_use]
pub fn removal_patches(removed: &[Edge], nodes: &[Node]) -> Vec<NodePatch> {
    removed
        .iter()
        .filter(|edge| edge.kind == EdgeKind::ModelConfig)
        .filter_map(|edge| {
            let llm = [&edge.source, &edge.target].into_iter().find(|id| {
                nodes
                    .iter()
                    .any(|n| &n.id == *id && n.kind.is_llm())
            })?;
            Some(NodePatch::clear(llm.clone(), data_keys::MODEL_CONFIG_ID))
        })
        .collect()
}

/// Links a `model_config` node to an `llm` node.
///
/// Idempotent: if an edge between the two already exists (in either order)
/// nothing happens. Otherwise any existing model-config edge on the `llm`
/// node is removed first (at most one per `llm` node), the animated
/// `modelConfig` edge is added, and `model_config_id` is set. Returns whether
/// anything changed.
pub fn link_model_config(
    store: &mut GraphStore,
    config_id: &str,
    llm_id: &str,
) -> Result<bool, GraphError> {
    if store
        .edges()
        .iter()
        .any(|e| e.kind == EdgeKind::ModelConfig && e.links(config_id, llm_id))
    {
        return Ok(false);
    }

    let displaced: Vec<crate::graph::EdgeChange> = store
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::ModelConfig && e.touches(llm_id))
        .map(|e| crate::graph::EdgeChange::Remove(e.id.clone()))
        .collect();
    if !displaced.is_empty() {
        store.apply_edge_changes(displaced);
    }

    store.add_edge(
        Edge::new(Edge::deterministic_id(config_id, llm_id), config_id, llm_id)
            .with_kind(EdgeKind::ModelConfig)
            .animated(),
    )?;
    store.patch_node_data(
        llm_id,
        [(
            data_keys::MODEL_CONFIG_ID.to_string(),
            Value::String(config_id.to_string()),
        )]
        .into_iter()
        .collect(),
    )?;
    Ok(true)
}

/// Removes the model-config link between two nodes, tolerating either
/// source/target order, and clears `model_config_id` on the `llm` node.
/// Returns whether anything changed.
pub fn unlink_model_config(store: &mut GraphStore, config_id: &str, llm_id: &str) -> bool {
    let removals: Vec<crate::graph::EdgeChange> = store
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::ModelConfig && e.links(config_id, llm_id))
        .map(|e| crate::graph::EdgeChange::Remove(e.id.clone()))
        .collect();
    if removals.is_empty() {
        return false;
    }
    let outcome = store.apply_edge_changes(removals);
    let patches = removal_patches(&outcome.removed, store.nodes());
    store.patch_nodes(patches);
    true
}
