//! Run lifecycle monitoring: a pure state machine plus its async shell.
//!
//! [`RunMachine`] owns the log, the node-status map, and the phase
//! transitions; it performs no I/O. [`ExecutionMonitor`] wraps it with the
//! resources the transitions imply: a reader task consuming the live
//! [`RunStream`](crate::service::RunStream), the delayed status-clear timer,
//! and the `flume` channel both feed. The controller pumps the channel and
//! applies the returned graph effects, so every graph write still happens on
//! the controller's side.

mod log;
mod machine;

pub use log::{
    LogEntry, END_SENTINEL, PARSE_FAILURE_STATUS, RUN_END_STEP, STREAM_FAILURE_STATUS,
};
pub use machine::{RunEffect, RunMachine, RunPhase};

use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;

use crate::service::RunStream;
use crate::types::RunId;

/// One typed message from the monitor's async sources to the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum RunSignal {
    /// One raw stream message (the `data:` payload of one SSE event).
    Message(String),
    /// The stream's transport failed.
    TransportError(String),
    /// The stream ended without the end-of-run sentinel.
    Eof,
    /// The delayed status clear fired.
    StatusClearDue,
}

/// Async shell around [`RunMachine`].
///
/// At most one live stream per monitor: starting a new run cancels the prior
/// reader task before the new connection opens, and dropping the monitor
/// aborts everything outstanding.
pub struct ExecutionMonitor {
    machine: RunMachine,
    signal_tx: flume::Sender<RunSignal>,
    signal_rx: flume::Receiver<RunSignal>,
    reader: Option<JoinHandle<()>>,
    linger_timer: Option<JoinHandle<()>>,
    status_linger: Duration,
}

impl ExecutionMonitor {
    #[must_use]
    pub fn new(status_linger: Duration) -> Self {
        let (signal_tx, signal_rx) = flume::unbounded();
        Self {
            machine: RunMachine::new(),
            signal_tx,
            signal_rx,
            reader: None,
            linger_timer: None,
            status_linger,
        }
    }

    /// Receiver the controller pumps; per-channel FIFO preserves arrival
    /// order of log entries.
    #[must_use]
    pub fn signals(&self) -> flume::Receiver<RunSignal> {
        self.signal_rx.clone()
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.machine.phase()
    }

    #[must_use]
    pub fn run_id(&self) -> Option<&RunId> {
        self.machine.run_id()
    }

    #[must_use]
    pub fn log(&self) -> &[LogEntry] {
        self.machine.log()
    }

    #[must_use]
    pub fn statuses(&self) -> &FxHashMap<String, String> {
        self.machine.statuses()
    }

    /// Accepts a run request: cancels any prior stream, enters `Starting`.
    pub fn begin_start(&mut self) {
        self.cancel();
        self.machine.begin_start();
    }

    /// Attaches the opened stream and spawns its reader task.
    ///
    /// The reader forwards raw messages and transport failures as signals;
    /// it never touches the machine or the graph.
    pub fn attach(&mut self, run_id: RunId, mut stream: RunStream) -> Vec<RunEffect> {
        let effects = self.machine.stream_opened(run_id);
        let tx = self.signal_tx.clone();
        self.reader = Some(tokio::spawn(async move {
            loop {
                match stream.next().await {
                    Some(Ok(message)) => {
                        if tx.send(RunSignal::Message(message)).is_err() {
                            break;
                        }
                    }
                    Some(Err(err)) => {
                        let _ = tx.send(RunSignal::TransportError(err.to_string()));
                        break;
                    }
                    None => {
                        let _ = tx.send(RunSignal::Eof);
                        break;
                    }
                }
            }
        }));
        effects
    }

    /// Applies one signal to the machine and returns the graph-facing
    /// effects; resource-facing effects are absorbed here.
    pub fn apply(&mut self, signal: RunSignal) -> Vec<RunEffect> {
        let effects = match signal {
            RunSignal::Message(raw) => self.machine.message(&raw),
            RunSignal::TransportError(message) => self.machine.transport_error(message),
            RunSignal::Eof => {
                if self.machine.phase() == RunPhase::Streaming {
                    self.machine
                        .transport_error("event stream closed before the end-of-run sentinel")
                } else {
                    vec![]
                }
            }
            RunSignal::StatusClearDue => self.machine.clear_statuses(),
        };

        effects
            .into_iter()
            .filter(|effect| match effect {
                RunEffect::CloseStream => {
                    self.close_stream();
                    false
                }
                RunEffect::ScheduleStatusClear => {
                    self.arm_status_clear();
                    false
                }
                RunEffect::ProjectStatus { .. } | RunEffect::ClearStatuses => true,
            })
            .collect()
    }

    /// Reports a failed run start (the service call or stream open errored)
    /// through the same transport-error path a broken stream takes.
    pub fn fail_start(&mut self, message: impl Into<String>) -> Vec<RunEffect> {
        self.apply(RunSignal::TransportError(message.into()))
    }

    /// Force-closes the live stream and pending timers without a synthetic
    /// log entry. Used when a new run displaces this one and on teardown.
    pub fn cancel(&mut self) {
        self.close_stream();
        if let Some(timer) = self.linger_timer.take() {
            timer.abort();
        }
        self.machine.force_close();
    }

    fn close_stream(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }

    fn arm_status_clear(&mut self) {
        if let Some(previous) = self.linger_timer.take() {
            previous.abort();
        }
        let tx = self.signal_tx.clone();
        let delay = self.status_linger;
        self.linger_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RunSignal::StatusClearDue);
        }));
    }
}

impl Drop for ExecutionMonitor {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(timer) = self.linger_timer.take() {
            timer.abort();
        }
    }
}
