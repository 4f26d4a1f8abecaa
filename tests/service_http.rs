mod common;
use common::*;

use httpmock::prelude::*;
use serde_json::json;
use weaveboard::service::{HttpWorkflowService, ServiceError, WorkflowDraft, WorkflowService};
use weaveboard::types::{RunId, WorkflowId};

fn service_for(server: &MockServer) -> HttpWorkflowService {
    HttpWorkflowService::with_client(reqwest::Client::new(), server.base_url())
}

#[tokio::test]
async fn save_posts_the_draft_and_returns_the_issued_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/workflows")
                .json_body_partial(r#"{"name": "checkout flow"}"#);
            then.status(201).json_body(json!({"workflow_id": "wf_9"}));
        })
        .await;

    let draft = WorkflowDraft {
        name: "checkout flow".to_string(),
        nodes: vec![trigger_node("dndnode_0")],
        edges: vec![],
    };
    let id = service_for(&server).save_workflow(draft).await.unwrap();

    mock.assert_async().await;
    assert_eq!(id.as_str(), "wf_9");
}

#[tokio::test]
async fn list_and_fetch_decode_records() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/workflows");
            then.status(200).json_body(json!([
                {"id": "wf_1", "name": "one"},
                {"id": "wf_2", "name": "two"}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/workflows/wf_1");
            then.status(200).json_body(json!({
                "id": "wf_1",
                "name": "one",
                "nodes": [{"id": "dndnode_0", "type": "trigger"}],
                "edges": []
            }));
        })
        .await;

    let service = service_for(&server);

    // Records missing nodes/edges default to empty lists.
    let listed = service.list_workflows().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].nodes.is_empty());

    let fetched = service
        .fetch_workflow(&WorkflowId::new("wf_1"))
        .await
        .unwrap();
    assert_eq!(fetched.nodes.len(), 1);
    assert_eq!(fetched.nodes[0].id, "dndnode_0");
}

#[tokio::test]
async fn start_run_returns_the_run_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/workflows/wf_1/run");
            then.status(200).json_body(json!({"run_id": "run_42"}));
        })
        .await;

    let run = service_for(&server)
        .start_run(&WorkflowId::new("wf_1"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(run.as_str(), "run_42");
}

#[tokio::test]
async fn register_webhook_sends_workflow_and_node() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/webhooks/register")
                .json_body(json!({"workflow_id": "wf_1", "node_id": "dndnode_4"}));
            then.status(200).json_body(json!({"webhook_id": "wh_7"}));
        })
        .await;

    let webhook = service_for(&server)
        .register_webhook(&WorkflowId::new("wf_1"), "dndnode_4")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(webhook.as_str(), "wh_7");
}

#[tokio::test]
async fn non_success_status_maps_to_unexpected_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/workflows/wf_missing");
            then.status(404);
        })
        .await;

    let err = service_for(&server)
        .fetch_workflow(&WorkflowId::new("wf_missing"))
        .await
        .unwrap_err();
    match err {
        ServiceError::UnexpectedStatus { endpoint, status } => {
            assert_eq!(endpoint, "/workflows/wf_missing");
            assert_eq!(status, 404);
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn stream_open_failure_is_reported_before_any_event() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/workflows/wf_1/runs/run_1/stream");
            then.status(500);
        })
        .await;

    let err = service_for(&server)
        .open_run_stream(&WorkflowId::new("wf_1"), &RunId::new("run_1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::UnexpectedStatus { status: 500, .. }
    ));
}
