//! Periodic webhook payload reconciliation.
//!
//! A `webhook_trigger` node with a registered `webhook_id` can receive
//! payloads out of band, visible only in the persisted workflow. While at
//! least one such node exists and a workflow is loaded, the poller ticks on
//! a fixed interval; the controller answers each tick by fetching the
//! persisted workflow and merging changed `last_payload` values into the
//! graph. The poller itself owns only the timer — starting and stopping it
//! is purely a function of current graph contents.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::graph::Node;

/// One poll-timer tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollTick;

/// Whether the graph currently warrants polling: at least one
/// `webhook_trigger` node carrying a registered `webhook_id`.
#[must_use]
pub fn has_eligible_webhook_nodes(nodes: &[Node]) -> bool {
    nodes
        .iter()
        .any(|n| n.kind.is_webhook_trigger() && n.webhook_id().is_some_and(|id| !id.is_empty()))
}

/// Explicit cancellable periodic task emitting [`PollTick`]s.
#[derive(Debug)]
pub struct WebhookPoller {
    tick_tx: flume::Sender<PollTick>,
    tick_rx: flume::Receiver<PollTick>,
    timer: Option<JoinHandle<()>>,
    period: Duration,
}

impl WebhookPoller {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let (tick_tx, tick_rx) = flume::unbounded();
        Self {
            tick_tx,
            tick_rx,
            timer: None,
            period,
        }
    }

    /// Receiver the controller pumps.
    #[must_use]
    pub fn ticks(&self) -> flume::Receiver<PollTick> {
        self.tick_rx.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Starts the timer; idempotent while already running.
    ///
    /// The first tick fires one full period after start, and ticks missed
    /// while the controller is busy are skipped rather than bursted.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        tracing::debug!(period_ms = self.period.as_millis() as u64, "webhook poller started");
        let tx = self.tick_tx.clone();
        let period = self.period;
        self.timer = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                if tx.send(PollTick).is_err() {
                    break;
                }
            }
        }));
    }

    /// Clears the timer; idempotent while stopped.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            tracing::debug!("webhook poller stopped");
        }
    }
}

impl Drop for WebhookPoller {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
