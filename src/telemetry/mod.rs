//! Tracing subscriber setup for demos and tests.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is the embedder's job. This helper wires up the conventional fmt
//! subscriber with `RUST_LOG`-style filtering and TTY-aware coloring.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the fmt subscriber, honoring `RUST_LOG` and defaulting to
/// `info`. Idempotent: later calls are no-ops, so tests can call it freely.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();
}
