use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the type of a directed link between two nodes.
///
/// The kind is *derived* from the endpoint node types (see
/// [`crate::semantics`]); persisted kinds are re-derived on load rather than
/// trusted, so edges created before a node's type changed stay consistent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    /// Plain data/control link.
    #[default]
    Default,
    /// Distinguished link between a `model_config` node and an `llm` node.
    ModelConfig,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Default => f.write_str("default"),
            EdgeKind::ModelConfig => f.write_str("modelConfig"),
        }
    }
}

/// A typed directed link between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    #[serde(default)]
    pub animated: bool,
}

impl Edge {
    /// A plain `default` edge.
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Default,
            animated: false,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: EdgeKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn animated(mut self) -> Self {
        self.animated = true;
        self
    }

    /// Deterministic ID for programmatically created edges.
    ///
    /// Loaded edges keep whatever ID the persistence layer assigned.
    #[must_use]
    pub fn deterministic_id(source: &str, target: &str) -> String {
        format!("edge-{source}-{target}")
    }

    /// Returns `true` if the edge connects `a` and `b` in either direction.
    #[must_use]
    pub fn links(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    /// Returns `true` if either endpoint is `node_id`.
    #[must_use]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// One element of a batched structural edge diff.
///
/// Mirrors the add/update/remove change lists the rendering layer produces;
/// the store applies a whole batch atomically and reports the removals so the
/// model-config side effects can fire exactly once per removed edge.
#[derive(Clone, Debug, PartialEq)]
pub enum EdgeChange {
    /// Insert a new edge; duplicate IDs and unknown endpoints are rejected.
    Add(Edge),
    /// Replace the edge with the same ID, or insert it when absent.
    Replace(Edge),
    /// Remove the edge with this ID; unknown IDs are ignored.
    Remove(String),
}

/// What a committed batch of [`EdgeChange`]s actually did.
#[derive(Clone, Debug, Default)]
pub struct EdgeChangeOutcome {
    /// Edges removed by the batch, in change order.
    pub removed: Vec<Edge>,
    /// Whether the batch changed the edge list at all.
    pub changed: bool,
}
