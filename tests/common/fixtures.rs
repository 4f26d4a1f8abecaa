#![allow(dead_code)]

use serde_json::json;
use weaveboard::graph::{data_keys, Edge, Node, NodeKind, Position};
use weaveboard::service::WorkflowRecord;
use weaveboard::types::WorkflowId;

pub fn node(id: &str, kind: NodeKind) -> Node {
    Node::new(id, kind, Position::default())
}

pub fn llm_node(id: &str) -> Node {
    node(id, NodeKind::Llm)
}

pub fn llm_node_with_model(id: &str, model: &str) -> Node {
    llm_node(id).with_data(data_keys::MODEL, json!(model))
}

pub fn model_config_node(id: &str) -> Node {
    node(id, NodeKind::ModelConfig)
}

pub fn trigger_node(id: &str) -> Node {
    node(id, NodeKind::Trigger)
}

pub fn webhook_trigger_node(id: &str, webhook_id: &str) -> Node {
    node(id, NodeKind::WebhookTrigger).with_data(data_keys::WEBHOOK_ID, json!(webhook_id))
}

pub fn edge(id: &str, source: &str, target: &str) -> Edge {
    Edge::new(id, source, target)
}

pub fn record(id: &str, nodes: Vec<Node>, edges: Vec<Edge>) -> WorkflowRecord {
    WorkflowRecord {
        id: WorkflowId::new(id),
        name: format!("workflow {id}"),
        nodes,
        edges,
    }
}
