use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Wire spellings of the node-`data` keys other components read and write.
///
/// `data` mixes user-entered configuration with transient fields maintained
/// by the engine; these constants are the only place the transient spellings
/// appear.
pub mod data_keys {
    /// Most recent execution status, projected from the active run.
    pub const STATUS: &str = "status";
    /// Validation annotation, present only while the node is invalid.
    pub const VALIDATION_ERROR: &str = "validationError";
    /// Reference from an `llm` node to its `model_config` node.
    pub const MODEL_CONFIG_ID: &str = "model_config_id";
    /// Server-issued webhook registration, on `webhook_trigger` nodes.
    pub const WEBHOOK_ID: &str = "webhook_id";
    /// Last externally delivered payload, on `webhook_trigger` nodes.
    pub const LAST_PAYLOAD: &str = "last_payload";
    /// Outcome of the node's most recent test execution.
    pub const TEST_SUCCESS: &str = "testSuccess";
    /// Directly configured model name on an `llm` node.
    pub const MODEL: &str = "model";
}

/// Identifies the type of a node within a workflow graph.
///
/// The closed variants cover every node type the editor ships; `Other`
/// carries unknown wire strings through a save/load round trip unchanged so
/// a newer backend schema never breaks an older client.
///
/// # Examples
///
/// ```rust
/// use weaveboard::graph::NodeKind;
///
/// let kind = NodeKind::from("llm");
/// assert_eq!(kind, NodeKind::Llm);
/// assert_eq!(kind.encode(), "llm");
///
/// // Unknown types survive untouched.
/// assert_eq!(NodeKind::from("shiny_new").encode(), "shiny_new");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    /// Manual start trigger.
    Trigger,
    /// Generic processing step.
    DefaultNode,
    /// LLM call; requires a model or a model-config reference.
    Llm,
    /// Code execution step.
    Code,
    /// Outbound HTTP call.
    ApiConsumer,
    /// Outbound webhook delivery.
    WebhookAction,
    /// Inbound webhook trigger; receives externally delivered payloads.
    WebhookTrigger,
    /// Reusable model configuration, linked to `llm` nodes.
    ModelConfig,
    /// Forward-compatibility passthrough for unrecognized wire strings.
    Other(String),
}

impl NodeKind {
    /// The persisted wire string for this kind.
    #[must_use]
    pub fn encode(&self) -> &str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::DefaultNode => "defaultnode",
            NodeKind::Llm => "llm",
            NodeKind::Code => "code",
            NodeKind::ApiConsumer => "api_consumer",
            NodeKind::WebhookAction => "webhook_action",
            NodeKind::WebhookTrigger => "webhook_trigger",
            NodeKind::ModelConfig => "model_config",
            NodeKind::Other(s) => s,
        }
    }

    /// Returns `true` for `llm` nodes.
    #[must_use]
    pub fn is_llm(&self) -> bool {
        matches!(self, Self::Llm)
    }

    /// Returns `true` for `model_config` nodes.
    #[must_use]
    pub fn is_model_config(&self) -> bool {
        matches!(self, Self::ModelConfig)
    }

    /// Returns `true` for `webhook_trigger` nodes.
    #[must_use]
    pub fn is_webhook_trigger(&self) -> bool {
        matches!(self, Self::WebhookTrigger)
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "trigger" => NodeKind::Trigger,
            "defaultnode" => NodeKind::DefaultNode,
            "llm" => NodeKind::Llm,
            "code" => NodeKind::Code,
            "api_consumer" => NodeKind::ApiConsumer,
            "webhook_action" => NodeKind::WebhookAction,
            "webhook_trigger" => NodeKind::WebhookTrigger,
            "model_config" => NodeKind::ModelConfig,
            other => NodeKind::Other(other.to_string()),
        }
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        NodeKind::from(s.as_str())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.encode().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encode())
    }
}

/// Canvas position of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A typed, positioned unit of the workflow graph.
///
/// Identity (`id`) is immutable once created. The `data` map holds
/// type-specific configuration plus the transient fields listed in
/// [`data_keys`]; mutate it only through
/// [`GraphStore::patch_node_data`](crate::graph::GraphStore::patch_node_data)
/// so change tracking stays accurate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Node {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Position) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            data: Map::new(),
        }
    }

    /// Seeds a `data` entry during construction.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Borrows a `data` entry as a string, if present and a string.
    #[must_use]
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// The `model_config_id` reference, on `llm` nodes that carry one.
    #[must_use]
    pub fn model_config_id(&self) -> Option<&str> {
        self.data_str(data_keys::MODEL_CONFIG_ID)
    }

    /// The registered webhook ID, on `webhook_trigger` nodes that carry one.
    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.data_str(data_keys::WEBHOOK_ID)
    }
}
