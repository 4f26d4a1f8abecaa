use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::edge::{Edge, EdgeChange, EdgeChangeOutcome};
use super::node::Node;

/// Errors raised by [`GraphStore`] mutations.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node already exists: {id}")]
    #[diagnostic(code(weaveboard::graph::duplicate_node))]
    DuplicateNode { id: String },

    #[error("unknown node: {id}")]
    #[diagnostic(code(weaveboard::graph::unknown_node))]
    UnknownNode { id: String },

    #[error("edge already exists: {id}")]
    #[diagnostic(code(weaveboard::graph::duplicate_edge))]
    DuplicateEdge { id: String },
}

/// One shallow-merge request against a node's `data`.
///
/// A `Value::Null` entry removes the key, which is how transient fields
/// (`status`, `validationError`, `model_config_id`) are cleared through the
/// same merge API that sets them.
#[derive(Clone, Debug, PartialEq)]
pub struct NodePatch {
    pub node_id: String,
    pub data: Map<String, Value>,
}

impl NodePatch {
    #[must_use]
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            data: Map::new(),
        }
    }

    /// A single-key patch setting `key` to `value`.
    #[must_use]
    pub fn set(node_id: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self::new(node_id).with(key, value)
    }

    /// A single-key patch removing `key`.
    #[must_use]
    pub fn clear(node_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(node_id).with(key, Value::Null)
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// Serialized form of the graph, as persisted by the workflow service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// The single owner of the node and edge lists.
///
/// All mutations are synchronous and non-reentrant; callers observe one
/// consistent graph per call. The [`revision`](Self::revision) counter is
/// bumped only by mutations that actually change state, so an unchanged
/// revision across a pass proves the pass wrote nothing.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    revision: u64,
}

impl GraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Change counter; bumped once per state-changing mutation (batches bump
    /// once for the whole batch).
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.node(&node.id).is_some() {
            return Err(GraphError::DuplicateNode { id: node.id });
        }
        self.nodes.push(node);
        self.revision += 1;
        Ok(())
    }

    /// Removes a node and every incident edge.
    ///
    /// Returns the node together with the cascaded edge removals so their
    /// side effects (clearing `model_config_id` for removed model-config
    /// edges) can be applied by the caller.
    pub fn remove_node(&mut self, id: &str) -> Option<(Node, Vec<Edge>)> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);
        let mut removed_edges = Vec::new();
        self.edges.retain(|edge| {
            if edge.touches(id) {
                removed_edges.push(edge.clone());
                false
            } else {
                true
            }
        });
        self.revision += 1;
        Some((node, removed_edges))
    }

    /// Shallow-merges `patch` into the node's `data`.
    ///
    /// `Value::Null` entries remove their key; entries equal to the current
    /// value are no-ops. Returns whether anything changed; a no-op merge
    /// leaves the revision untouched, so re-applying the same patch is
    /// idempotent and triggers no downstream recomputation.
    pub fn patch_node_data(
        &mut self,
        id: &str,
        patch: Map<String, Value>,
    ) -> Result<bool, GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode { id: id.to_string() })?;
        let changed = merge_data(&mut node.data, patch);
        if changed {
            self.revision += 1;
        }
        Ok(changed)
    }

    /// Applies a batch of node patches with one revision bump for the batch.
    ///
    /// Patches addressing nodes no longer in the graph are skipped; the
    /// sources of batched patches (webhook polls, status projection) race
    /// benignly with node deletion.
    pub fn patch_nodes(&mut self, patches: Vec<NodePatch>) -> bool {
        let mut changed = false;
        for patch in patches {
            match self.nodes.iter_mut().find(|n| n.id == patch.node_id) {
                Some(node) => changed |= merge_data(&mut node.data, patch.data),
                None => {
                    tracing::debug!(node_id = %patch.node_id, "patch target missing; skipping");
                }
            }
        }
        if changed {
            self.revision += 1;
        }
        changed
    }

    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        self.check_endpoints(&edge)?;
        if self.edges.iter().any(|e| e.id == edge.id) {
            return Err(GraphError::DuplicateEdge { id: edge.id });
        }
        self.edges.push(edge);
        self.revision += 1;
        Ok(())
    }

    /// Applies a batched structural edge diff atomically.
    ///
    /// Invalid additions (unknown endpoint, duplicate ID) are dropped with a
    /// warning rather than failing the batch; removals of unknown IDs are
    /// ignored. The outcome carries every removed edge, in change order, for
    /// the removal side-effect hook.
    pub fn apply_edge_changes(&mut self, changes: Vec<EdgeChange>) -> EdgeChangeOutcome {
        let mut outcome = EdgeChangeOutcome::default();
        for change in changes {
            match change {
                EdgeChange::Add(edge) => {
                    if self.check_endpoints(&edge).is_err()
                        || self.edges.iter().any(|e| e.id == edge.id)
                    {
                        tracing::warn!(edge_id = %edge.id, "invalid edge addition dropped");
                        continue;
                    }
                    self.edges.push(edge);
                    outcome.changed = true;
                }
                EdgeChange::Replace(edge) => {
                    if self.check_endpoints(&edge).is_err() {
                        tracing::warn!(edge_id = %edge.id, "invalid edge replacement dropped");
                        continue;
                    }
                    match self.edges.iter_mut().find(|e| e.id == edge.id) {
                        Some(existing) if *existing != edge => {
                            *existing = edge;
                            outcome.changed = true;
                        }
                        Some(_) => {}
                        None => {
                            self.edges.push(edge);
                            outcome.changed = true;
                        }
                    }
                }
                EdgeChange::Remove(id) => {
                    if let Some(index) = self.edges.iter().position(|e| e.id == id) {
                        outcome.removed.push(self.edges.remove(index));
                        outcome.changed = true;
                    }
                }
            }
        }
        if outcome.changed {
            self.revision += 1;
        }
        outcome
    }

    /// Replaces the whole graph, as on workflow load.
    ///
    /// Edges referencing missing nodes are dropped with a warning rather than
    /// kept dangling.
    pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        self.nodes = nodes;
        self.edges = edges
            .into_iter()
            .filter(|edge| {
                let valid = self.node(&edge.source).is_some() && self.node(&edge.target).is_some();
                if !valid {
                    tracing::warn!(
                        edge_id = %edge.id,
                        source = %edge.source,
                        target = %edge.target,
                        "dropping edge with missing endpoint"
                    );
                }
                valid
            })
            .collect();
        self.revision += 1;
    }

    /// Clones the graph into its persisted form.
    #[must_use]
    pub fn serialize(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    fn check_endpoints(&self, edge: &Edge) -> Result<(), GraphError> {
        for id in [&edge.source, &edge.target] {
            if self.node(id).is_none() {
                return Err(GraphError::UnknownNode { id: id.clone() });
            }
        }
        Ok(())
    }
}

/// Shallow merge with the Null-removes-key rule; returns whether `data`
/// changed.
fn merge_data(data: &mut Map<String, Value>, patch: Map<String, Value>) -> bool {
    let mut changed = false;
    for (key, value) in patch {
        if value.is_null() {
            changed |= data.remove(&key).is_some();
        } else if data.get(&key) != Some(&value) {
            data.insert(key, value);
            changed = true;
        }
    }
    changed
}
