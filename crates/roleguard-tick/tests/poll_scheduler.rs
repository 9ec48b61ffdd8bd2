//! Integration tests for the poll scheduler.
//!
//! All async tests run with `start_paused = true`: tokio auto-advances the
//! clock when the runtime is idle, so `sleep_until` resolves instantly and
//! `Instant` arithmetic is exact.

use std::time::Duration;

use roleguard_tick::{PollConfig, PollInfo, PollScheduler};

// =========================================================================
// PollConfig
// =========================================================================

#[test]
fn test_default_config_polls_every_30s() {
    let cfg = PollConfig::default();
    assert_eq!(cfg.interval_secs, 30);
    assert_eq!(cfg.interval(), Duration::from_secs(30));
}

#[test]
fn test_validated_zero_interval_clamps_to_one_second() {
    let cfg = PollConfig::with_interval_secs(0).validated();
    assert_eq!(cfg.interval_secs, PollConfig::MIN_INTERVAL_SECS);
}

#[test]
fn test_validated_huge_interval_clamps_to_max() {
    let cfg = PollConfig::with_interval_secs(u64::MAX).validated();
    assert_eq!(cfg.interval_secs, PollConfig::MAX_INTERVAL_SECS);
}

#[test]
fn test_config_missing_fields_use_defaults() {
    let cfg: PollConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, PollConfig::default());
}

// =========================================================================
// Polling
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_poll_fires_after_one_interval() {
    let start = tokio::time::Instant::now();
    let mut s = PollScheduler::with_interval_secs(30);
    assert_eq!(s.poll_count(), 0);

    let info = s.wait_for_poll().await;

    assert_eq!(
        info,
        PollInfo {
            poll: 1,
            overrun: false,
            polls_skipped: 0
        }
    );
    assert_eq!(start.elapsed(), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_polls_keep_fixed_cadence() {
    let start = tokio::time::Instant::now();
    let mut s = PollScheduler::with_interval_secs(10);

    for expected in 1..=4 {
        let info = s.wait_for_poll().await;
        assert_eq!(info.poll, expected);
        assert!(!info.overrun);
    }

    assert_eq!(start.elapsed(), Duration::from_secs(40));
    assert_eq!(s.metrics().total_polls, 4);
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_scheduler_polls_every_second() {
    let mut s = PollScheduler::with_interval_secs(0);
    assert_eq!(s.interval(), Duration::from_secs(1));

    let start = tokio::time::Instant::now();
    s.wait_for_poll().await;
    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

// =========================================================================
// Overrun
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_late_poll_skips_missed_intervals() {
    let mut s = PollScheduler::with_interval_secs(30);

    // Stalled for 95s: the 30s poll is 65s late, two whole intervals missed.
    tokio::time::advance(Duration::from_secs(95)).await;
    let info = s.wait_for_poll().await;

    assert!(info.overrun);
    assert_eq!(info.polls_skipped, 2);
    assert_eq!(s.metrics().total_overruns, 1);
    assert_eq!(s.metrics().total_skipped, 2);

    // Next poll is one interval from when the late one fired, not a burst.
    let after_late = tokio::time::Instant::now();
    let next = s.wait_for_poll().await;
    assert!(!next.overrun);
    assert_eq!(after_late.elapsed(), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_slightly_late_poll_is_not_an_overrun() {
    let mut s = PollScheduler::with_interval_secs(30);
    tokio::time::advance(Duration::from_secs(32)).await;

    let info = s.wait_for_poll().await;
    assert!(!info.overrun);
    assert_eq!(s.metrics().total_overruns, 0);
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_dropped_wait_keeps_deadline() {
    let mut s = PollScheduler::with_interval_secs(30);
    let due = s.next_poll();

    tokio::select! {
        _ = s.wait_for_poll() => panic!("poll fired before the interval"),
        _ = tokio::time::sleep(Duration::from_secs(5)) => {}
    }

    assert_eq!(s.poll_count(), 0);
    assert_eq!(s.next_poll(), due);

    let info = s.wait_for_poll().await;
    assert_eq!(info.poll, 1);
}
