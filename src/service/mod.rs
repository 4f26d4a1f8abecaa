//! Persistence-service contracts and their HTTP implementation.
//!
//! [`WorkflowService`] is the seam between the editor and the remote
//! backend: save/list/fetch workflows, start runs, open run event streams,
//! register webhooks. [`HttpWorkflowService`] implements it over `reqwest`;
//! tests substitute scripted implementations.
//!
//! The run event stream arrives as server-sent events; [`RunStream`] wraps
//! the byte stream behind an incremental [`SseFrameDecoder`] and yields one
//! raw `data:` payload per message.

mod api;
mod http;
mod sse;

pub use api::{ServiceError, WorkflowDraft, WorkflowRecord, WorkflowService};
pub use http::HttpWorkflowService;
pub use sse::{RunStream, SseFrameDecoder};
