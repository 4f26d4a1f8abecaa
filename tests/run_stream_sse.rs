use std::{convert::Infallible, time::Duration};

use async_stream::stream;
use axum::{
    response::sse::{Event as SseEvent, Sse},
    routing::get,
    Router,
};
use reqwest::Client;
use serde_json::json;
use tokio::{net::TcpListener, time::timeout};
use weaveboard::service::{HttpWorkflowService, WorkflowService};
use weaveboard::types::{RunId, WorkflowId};

async fn handler() -> Sse<impl futures_util::Stream<Item = Result<SseEvent, Infallible>>> {
    let sse_stream = stream! {
        let entries = [
            json!({"step": "trigger", "status": "Running", "node_id": "dndnode_0"}),
            json!({"step": "trigger", "status": "Completed", "node_id": "dndnode_0"}),
            json!({"step": "End", "status": "Completed"}),
            json!({"step": "__END__", "status": ""}),
        ];
        for entry in entries {
            yield Ok(SseEvent::default().json_data(entry).unwrap());
        }
    };
    Sse::new(sse_stream)
}

#[tokio::test(flavor = "multi_thread")]
async fn run_stream_decodes_live_sse_events() -> Result<(), Box<dyn std::error::Error>> {
    let router = Router::new().route("/workflows/wf_1/runs/run_1/stream", get(handler));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router.into_make_service()).await {
            tracing::error!("axum server error: {err:?}");
        }
    });

    let service = HttpWorkflowService::with_client(Client::new(), format!("http://{addr}"));
    let mut stream = service
        .open_run_stream(&WorkflowId::new("wf_1"), &RunId::new("run_1"))
        .await?;

    let mut steps = Vec::new();
    while let Some(message) = timeout(Duration::from_secs(2), stream.next()).await? {
        let value: serde_json::Value = serde_json::from_str(&message?)?;
        let step = value["step"].as_str().unwrap().to_string();
        let done = step == "__END__";
        steps.push(step);
        if done {
            break;
        }
    }

    // One decoded message per event, framing stripped, order preserved.
    assert_eq!(steps, vec!["trigger", "trigger", "End", "__END__"]);

    server.abort();
    Ok(())
}
