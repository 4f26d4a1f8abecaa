use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stream sentinel terminating a run's event sequence.
///
/// Consumed by the state machine, never appended to the visible log.
pub const END_SENTINEL: &str = "__END__";

/// Overall-run end marker, distinct from the sentinel.
///
/// Appended to the log like any other entry; additionally schedules the
/// delayed clear of per-node statuses so the UI can linger on terminal
/// colors before nodes return to idle.
pub const RUN_END_STEP: &str = "End";

/// Status carried by synthetic entries for unparseable stream messages.
pub const PARSE_FAILURE_STATUS: &str = "ParseError";

/// Status carried by synthetic entries for transport failures.
pub const STREAM_FAILURE_STATUS: &str = "StreamError";

/// One timestamped event in a run's execution log.
///
/// Arrives as the JSON payload of one stream message; arrival order is the
/// only ordering guarantee, so entries are appended as received and never
/// reordered by timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub status: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_data: Option<Value>,
}

impl LogEntry {
    #[must_use]
    pub fn new(step: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: status.into(),
            timestamp: Utc::now(),
            node_id: None,
            error: None,
            input_data: None,
            output_data: None,
        }
    }

    #[must_use]
    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Synthetic entry for a stream message that failed to parse.
    #[must_use]
    pub fn parse_failure(message: impl Into<String>) -> Self {
        let mut entry = Self::new("Stream", PARSE_FAILURE_STATUS);
        entry.error = Some(message.into());
        entry
    }

    /// Synthetic entry for a transport failure.
    #[must_use]
    pub fn stream_failure(message: impl Into<String>) -> Self {
        let mut entry = Self::new("Stream", STREAM_FAILURE_STATUS);
        entry.error = Some(message.into());
        entry
    }

    /// Whether this is a synthetic transport-failure entry.
    #[must_use]
    pub fn is_stream_failure(&self) -> bool {
        self.status == STREAM_FAILURE_STATUS
    }

    /// Whether this is the end-of-stream sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.step == END_SENTINEL
    }
}
