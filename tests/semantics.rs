mod common;
use common::*;

use serde_json::json;
use weaveboard::graph::{data_keys, EdgeKind, GraphStore, NodeKind};
use weaveboard::semantics::{
    classify, link_model_config, model_config_pair, reconcile_loaded, removal_patches,
    unlink_model_config,
};

fn store_with(nodes: Vec<weaveboard::graph::Node>) -> GraphStore {
    let mut store = GraphStore::new();
    for node in nodes {
        store.add_node(node).unwrap();
    }
    store
}

#[test]
fn classify_matches_the_pair_in_either_direction() {
    assert_eq!(classify(&NodeKind::ModelConfig, &NodeKind::Llm), EdgeKind::ModelConfig);
    assert_eq!(classify(&NodeKind::Llm, &NodeKind::ModelConfig), EdgeKind::ModelConfig);
    assert_eq!(classify(&NodeKind::Trigger, &NodeKind::Llm), EdgeKind::Default);
    assert_eq!(classify(&NodeKind::ModelConfig, &NodeKind::ModelConfig), EdgeKind::Default);
}

#[test]
fn link_creates_one_animated_edge_and_sets_the_reference() {
    let mut store = store_with(vec![model_config_node("dndnode_0"), llm_node("dndnode_1")]);

    let changed = link_model_config(&mut store, "dndnode_0", "dndnode_1").unwrap();
    assert!(changed);
    assert_eq!(store.edges().len(), 1);
    let edge = &store.edges()[0];
    assert_eq!(edge.kind, EdgeKind::ModelConfig);
    assert!(edge.animated);
    assert_eq!(
        store.node("dndnode_1").unwrap().model_config_id(),
        Some("dndnode_0")
    );
}

#[test]
fn link_is_idempotent_in_either_order() {
    let mut store = store_with(vec![model_config_node("dndnode_0"), llm_node("dndnode_1")]);
    link_model_config(&mut store, "dndnode_0", "dndnode_1").unwrap();
    let revision = store.revision();

    let changed = link_model_config(&mut store, "dndnode_0", "dndnode_1").unwrap();
    assert!(!changed);
    assert_eq!(store.revision(), revision);
    assert_eq!(store.edges().len(), 1);
}

#[test]
fn linking_a_second_config_displaces_the_first() {
    let mut store = store_with(vec![
        model_config_node("dndnode_0"),
        model_config_node("dndnode_1"),
        llm_node("dndnode_2"),
    ]);
    link_model_config(&mut store, "dndnode_0", "dndnode_2").unwrap();
    link_model_config(&mut store, "dndnode_1", "dndnode_2").unwrap();

    // At most one model-config edge per llm node.
    let model_edges: Vec<_> = store
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::ModelConfig)
        .collect();
    assert_eq!(model_edges.len(), 1);
    assert!(model_edges[0].links("dndnode_1", "dndnode_2"));
    assert_eq!(
        store.node("dndnode_2").unwrap().model_config_id(),
        Some("dndnode_1")
    );
}

#[test]
fn unlink_clears_the_reference_and_leaves_no_edge() {
    let mut store = store_with(vec![model_config_node("dndnode_0"), llm_node("dndnode_1")]);
    link_model_config(&mut store, "dndnode_0", "dndnode_1").unwrap();

    // Either argument order finds the link.
    assert!(unlink_model_config(&mut store, "dndnode_0", "dndnode_1"));
    assert!(store.edges().is_empty());
    assert_eq!(store.node("dndnode_1").unwrap().model_config_id(), None);

    // Removing again is a no-op.
    assert!(!unlink_model_config(&mut store, "dndnode_1", "dndnode_0"));
}

#[test]
fn loaded_edges_are_reclassified_from_current_node_kinds() {
    // The persisted edge says `default`; the endpoints say otherwise.
    let nodes = vec![model_config_node("dndnode_3"), llm_node("dndnode_7")];
    let edges = vec![edge("e1", "dndnode_3", "dndnode_7")];

    let (edges, patches) = reconcile_loaded(&nodes, edges);
    assert_eq!(edges[0].kind, EdgeKind::ModelConfig);
    assert!(edges[0].animated);
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].node_id, "dndnode_7");
    assert_eq!(
        patches[0].data.get(data_keys::MODEL_CONFIG_ID),
        Some(&json!("dndnode_3"))
    );
}

#[test]
fn stale_model_config_kind_is_demoted_on_load() {
    // An edge persisted as modelConfig whose endpoint is no longer an llm.
    let nodes = vec![model_config_node("dndnode_0"), trigger_node("dndnode_1")];
    let edges = vec![edge("e1", "dndnode_0", "dndnode_1").with_kind(EdgeKind::ModelConfig)];

    let (edges, patches) = reconcile_loaded(&nodes, edges);
    assert_eq!(edges[0].kind, EdgeKind::Default);
    assert!(patches.is_empty());
}

#[test]
fn removal_patches_fire_once_per_model_config_edge_only() {
    let nodes = vec![
        model_config_node("dndnode_0"),
        llm_node("dndnode_1"),
        trigger_node("dndnode_2"),
    ];
    let removed = vec![
        edge("e1", "dndnode_0", "dndnode_1").with_kind(EdgeKind::ModelConfig),
        edge("e2", "dndnode_2", "dndnode_1"),
    ];

    let patches = removal_patches(&removed, &nodes);
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].node_id, "dndnode_1");
    assert_eq!(patches[0].data.get(data_keys::MODEL_CONFIG_ID), Some(&json!(null)));
}

#[test]
fn model_config_pair_resolves_order_and_rejects_other_pairs() {
    let nodes = vec![model_config_node("a"), llm_node("b"), trigger_node("c")];
    assert_eq!(model_config_pair(&nodes, "a", "b"), Some(("a", "b")));
    assert_eq!(model_config_pair(&nodes, "b", "a"), Some(("a", "b")));
    assert_eq!(model_config_pair(&nodes, "c", "b"), None);
    assert_eq!(model_config_pair(&nodes, "a", "missing"), None);
}
