//! Fixed-interval poll scheduler for roleguard.
//!
//! Drives periodic background checks (token expiry, mainly) at a configurable
//! interval, with overrun detection so a stalled task doesn't fire a burst of
//! stale polls when it wakes up.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside a watcher task's `tokio::select!`
//! loop, next to its command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* visibility, stop */ }
//!         _ = scheduler.wait_for_poll() => {
//!             run_check().await;
//!         }
//!     }
//! }
//! ```
//!
//! The first poll fires one full interval after creation, not immediately.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the poll scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between polls. Default: 30.
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

impl PollConfig {
    /// Shortest allowed interval.
    pub const MIN_INTERVAL_SECS: u64 = 1;

    /// Longest allowed interval (one day).
    pub const MAX_INTERVAL_SECS: u64 = 86_400;

    pub fn with_interval_secs(interval_secs: u64) -> Self {
        Self { interval_secs }
    }

    /// Clamp the interval into `MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS`.
    ///
    /// Called automatically by [`PollScheduler::new`]. A zero interval would
    /// turn the watcher into a busy loop, so it becomes one second.
    pub fn validated(mut self) -> Self {
        let clamped = self
            .interval_secs
            .clamp(Self::MIN_INTERVAL_SECS, Self::MAX_INTERVAL_SECS);
        if clamped != self.interval_secs {
            warn!(
                requested = self.interval_secs,
                clamped, "poll interval out of range, clamping"
            );
            self.interval_secs = clamped;
        }
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

// ---------------------------------------------------------------------------
// Poll info (returned to caller each poll)
// ---------------------------------------------------------------------------

/// Information about a poll, returned by [`PollScheduler::wait_for_poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollInfo {
    /// Monotonically increasing poll number (starts at 1).
    pub poll: u64,
    /// `true` if this poll fired more than 10% of an interval late.
    pub overrun: bool,
    /// Whole intervals missed while late (0 in normal operation).
    pub polls_skipped: u64,
}

/// Running totals for a scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollMetrics {
    pub total_polls: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-interval poll scheduler. One per watcher task.
///
/// Missed polls are never replayed: after an overrun the next poll is
/// scheduled one interval from the moment the late poll fired.
#[derive(Debug)]
pub struct PollScheduler {
    interval: Duration,
    next_poll: Instant,
    poll_count: u64,
    metrics: PollMetrics,
}

impl PollScheduler {
    pub fn new(config: PollConfig) -> Self {
        let config = config.validated();
        let interval = config.interval();

        debug!(interval_secs = config.interval_secs, "poll scheduler created");

        Self {
            interval,
            next_poll: Instant::now() + interval,
            poll_count: 0,
            metrics: PollMetrics::default(),
        }
    }

    pub fn with_interval_secs(interval_secs: u64) -> Self {
        Self::new(PollConfig::with_interval_secs(interval_secs))
    }

    /// Wait until the next poll is due.
    ///
    /// Cancel-safe: if the future is dropped (another `select!` branch won),
    /// the deadline is unchanged and the next call waits for the same poll.
    pub async fn wait_for_poll(&mut self) -> PollInfo {
        let due = self.next_poll;
        time::sleep_until(due).await;

        let now = Instant::now();
        self.poll_count += 1;

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > self.interval / 10;
        let mut polls_skipped = 0;

        if overrun {
            polls_skipped = (late_by.as_nanos() / self.interval.as_nanos()) as u64;
            warn!(
                poll = self.poll_count,
                skipped = polls_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "poll overrun, skipping ahead"
            );
            self.metrics.total_overruns += 1;
            self.metrics.total_skipped += polls_skipped;
            self.next_poll = now + self.interval;
        } else {
            self.next_poll = due + self.interval;
        }
        self.metrics.total_polls += 1;

        trace!(poll = self.poll_count, overrun, "poll fired");

        PollInfo {
            poll: self.poll_count,
            overrun,
            polls_skipped,
        }
    }

    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The instant the next poll is due.
    pub fn next_poll(&self) -> Instant {
        self.next_poll
    }

    pub fn metrics(&self) -> &PollMetrics {
        &self.metrics
    }
}
