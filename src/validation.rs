//! Per-node validation annotations derived from graph topology.
//!
//! [`validate`] is a pure function of the node list; [`apply`] writes the
//! derived annotations back into node data under a change-only discipline:
//! a node is patched only when its annotation actually differs from the one
//! it carries. Without that comparison every validation pass would itself
//! mutate the graph and re-trigger validation.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::graph::{data_keys, GraphStore, Node, NodePatch};

/// Annotation attached to an `llm` node that has neither an own model nor a
/// resolvable model-config reference.
pub const LLM_NEEDS_MODEL_CONFIG: &str = "LLM node needs a model configuration";

/// Derives the error map for the current node list.
///
/// An `llm` node is valid when it has a non-empty own `model` value or a
/// `model_config_id` referencing a `model_config` node present in the list.
/// Nodes without an error are absent from the map.
#[must_use]
pub fn validate(nodes: &[Node]) -> FxHashMap<String, &'static str> {
    let mut errors = FxHashMap::default();
    for node in nodes.iter().filter(|n| n.kind.is_llm()) {
        let has_own_model = node
            .data_str(data_keys::MODEL)
            .is_some_and(|model| !model.is_empty());
        let has_config = node.model_config_id().is_some_and(|config_id| {
            nodes
                .iter()
                .any(|n| n.id == config_id && n.kind.is_model_config())
        });
        if !has_own_model && !has_config {
            errors.insert(node.id.clone(), LLM_NEEDS_MODEL_CONFIG);
        }
    }
    errors
}

/// Writes the derived annotations back into the store, change-only.
///
/// Returns whether anything was written. Re-running on an unchanged graph
/// performs zero writes and leaves the store revision untouched.
pub fn apply(store: &mut GraphStore) -> bool {
    let errors = validate(store.nodes());
    let patches: Vec<NodePatch> = store
        .nodes()
        .iter()
        .filter_map(|node| {
            let current = node.data_str(data_keys::VALIDATION_ERROR);
            match errors.get(&node.id) {
                Some(error) if current != Some(error) => Some(NodePatch::set(
                    node.id.clone(),
                    data_keys::VALIDATION_ERROR,
                    Value::String((*error).to_string()),
                )),
                None if current.is_some() => Some(NodePatch::clear(
                    node.id.clone(),
                    data_keys::VALIDATION_ERROR,
                )),
                _ => None,
            }
        })
        .collect();
    store.patch_nodes(patches)
}
