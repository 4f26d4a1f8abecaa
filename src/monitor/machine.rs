use rustc_hash::FxHashMap;

use crate::types::RunId;

use super::log::{LogEntry, RUN_END_STEP};

/// Lifecycle phase of the run monitor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunPhase {
    /// No run has been requested.
    #[default]
    Idle,
    /// A run was requested; the service has not yet answered.
    Starting,
    /// The event stream is open and being consumed.
    Streaming,
    /// The stream closed (sentinel, error, or cancellation).
    Terminated,
}

/// Graph- or resource-facing instruction returned by a machine transition.
///
/// The machine performs no I/O itself; the shell interprets `CloseStream`
/// and `ScheduleStatusClear`, and the controller projects the rest onto the
/// graph.
#[derive(Clone, Debug, PartialEq)]
pub enum RunEffect {
    /// Write `status` into the node's data.
    ProjectStatus { node_id: String, status: String },
    /// Remove `status` from every node that carries one.
    ClearStatuses,
    /// Arm the delayed status clear (the UI linger after a run ends).
    ScheduleStatusClear,
    /// Close and discard the live stream connection.
    CloseStream,
}

/// Pure run-lifecycle state machine.
///
/// Owns the append-only log and the node-status map; every transition takes
/// the current state plus one input and returns the effects it implies.
/// Idle → Starting → Streaming → Terminated, looping back to Starting only
/// via a new run request.
#[derive(Debug, Default)]
pub struct RunMachine {
    phase: RunPhase,
    run_id: Option<RunId>,
    log: Vec<LogEntry>,
    statuses: FxHashMap<String, String>,
}

impl RunMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    #[must_use]
    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    /// The visible log sequence, in arrival order.
    #[must_use]
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Node ID → most recent execution status within the active run.
    #[must_use]
    pub fn statuses(&self) -> &FxHashMap<String, String> {
        &self.statuses
    }

    /// A run request was accepted; the service call is in flight.
    pub fn begin_start(&mut self) {
        self.phase = RunPhase::Starting;
        self.run_id = None;
    }

    /// The stream for `run_id` opened; resets the log and statuses.
    pub fn stream_opened(&mut self, run_id: RunId) -> Vec<RunEffect> {
        self.phase = RunPhase::Streaming;
        self.run_id = Some(run_id);
        self.log.clear();
        self.statuses.clear();
        vec![RunEffect::ClearStatuses]
    }

    /// One inbound stream message, still in its raw JSON form.
    pub fn message(&mut self, raw: &str) -> Vec<RunEffect> {
        if self.phase != RunPhase::Streaming {
            tracing::debug!(phase = ?self.phase, "stream message outside Streaming; dropped");
            return vec![];
        }

        let entry = match serde_json::from_str::<LogEntry>(raw) {
            Ok(entry) => entry,
            Err(err) => {
                self.log
                    .push(LogEntry::parse_failure(format!("unreadable stream message: {err}")));
                return vec![];
            }
        };

        if entry.is_sentinel() {
            self.phase = RunPhase::Terminated;
            return vec![RunEffect::CloseStream];
        }

        let mut effects = Vec::new();
        if let Some(node_id) = &entry.node_id {
            self.statuses.insert(node_id.clone(), entry.status.clone());
            effects.push(RunEffect::ProjectStatus {
                node_id: node_id.clone(),
                status: entry.status.clone(),
            });
        }
        if entry.step == RUN_END_STEP {
            effects.push(RunEffect::ScheduleStatusClear);
        }
        self.log.push(entry);
        effects
    }

    /// A transport failure, from `Starting` (the run request or stream open
    /// failed) or `Streaming` (the connection broke).
    ///
    /// Appends one synthetic entry, suppressing consecutive duplicates so a
    /// flapping connection does not flood the log, then terminates.
    pub fn transport_error(&mut self, message: impl Into<String>) -> Vec<RunEffect> {
        if self.phase == RunPhase::Terminated || self.phase == RunPhase::Idle {
            return vec![];
        }
        if !self.log.last().is_some_and(LogEntry::is_stream_failure) {
            self.log.push(LogEntry::stream_failure(message));
        }
        self.statuses.clear();
        self.phase = RunPhase::Terminated;
        vec![RunEffect::ClearStatuses, RunEffect::CloseStream]
    }

    /// The delayed status clear fired.
    pub fn clear_statuses(&mut self) -> Vec<RunEffect> {
        self.statuses.clear();
        vec![RunEffect::ClearStatuses]
    }

    /// Force-close without a synthetic entry, as when a new run displaces
    /// this one or the editor unmounts.
    pub fn force_close(&mut self) {
        if self.phase == RunPhase::Starting || self.phase == RunPhase::Streaming {
            self.phase = RunPhase::Terminated;
        }
    }
}
