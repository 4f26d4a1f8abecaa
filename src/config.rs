//! Editor configuration resolved from the environment.
//!
//! Mirrors the shape of the services the editor talks to: one base URL for
//! the persistence service plus the two client-side timings (how often the
//! webhook poller wakes up, and how long terminal per-node statuses linger
//! before being cleared).

use std::time::Duration;

/// Configuration for an editor instance.
///
/// Construct via [`EditorConfig::default`] for local development defaults or
/// [`EditorConfig::from_env`] to honor `.env`/environment overrides, then
/// refine with the `with_*` builders.
#[derive(Clone, Debug)]
pub struct EditorConfig {
    /// Base URL of the persistence service, without a trailing slash.
    pub base_url: String,
    /// Interval between webhook payload polls.
    pub poll_interval: Duration,
    /// Delay between an overall-run `End` entry and the node-status clear.
    pub status_linger: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            poll_interval: Duration::from_secs(5),
            status_linger: Duration::from_secs(2),
        }
    }
}

impl EditorConfig {
    /// Resolve configuration from the environment.
    ///
    /// Reads `.env` if present, then:
    /// - `WEAVEBOARD_API_URL` — persistence service base URL
    /// - `WEAVEBOARD_POLL_INTERVAL_MS` — webhook poll interval
    /// - `WEAVEBOARD_STATUS_LINGER_MS` — terminal-status linger delay
    ///
    /// Unset or unparseable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            base_url: std::env::var("WEAVEBOARD_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            poll_interval: env_millis("WEAVEBOARD_POLL_INTERVAL_MS")
                .unwrap_or(defaults.poll_interval),
            status_linger: env_millis("WEAVEBOARD_STATUS_LINGER_MS")
                .unwrap_or(defaults.status_linger),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url: String = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_status_linger(mut self, linger: Duration) -> Self {
        self.status_linger = linger;
        self
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(Duration::from_millis)
}
