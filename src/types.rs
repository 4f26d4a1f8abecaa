//! Core identifier types for the weaveboard editor engine.
//!
//! Everything the persistence service issues is addressed by one of these
//! newtypes: a workflow, a run of a workflow, or a registered webhook. They
//! are deliberately thin — serde-transparent wrappers over the wire strings —
//! so they can flow through request/response types unchanged while still
//! keeping call sites honest about which kind of identifier they hold.
//!
//! Node identifiers are *not* wrapped: node IDs are embedded inside graph
//! data (`dndnode_<n>`, see [`crate::ids`]) and are passed around as plain
//! `&str`/`String` the same way the graph wire format carries them.
//!
//! # Examples
//!
//! ```rust
//! use weaveboard::types::{RunId, WorkflowId};
//!
//! let workflow: WorkflowId = "wf_42".into();
//! let run = RunId::new("run_7");
//!
//! assert_eq!(workflow.as_str(), "wf_42");
//! assert_eq!(format!("{workflow}/{run}"), "wf_42/run_7");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrows the underlying wire string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper, returning the wire string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

id_type! {
    /// Server-issued identifier of a persisted workflow.
    ///
    /// Returned by `POST /workflows` and used to address every
    /// workflow-scoped endpoint afterwards.
    WorkflowId
}

id_type! {
    /// Server-issued identifier of one execution attempt.
    ///
    /// A run only exists as a live event-stream session; the ID is never
    /// persisted into the graph.
    RunId
}

id_type! {
    /// Server-issued identifier of a registered webhook endpoint.
    ///
    /// Stored into the owning `webhook_trigger` node's data under
    /// `webhook_id`, which is what makes the node eligible for payload
    /// polling.
    WebhookId
}
