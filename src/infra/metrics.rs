//! Lock-free monitor counters and periodic reporting
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only; the monitor never makes decisions based on them.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

pub struct Metrics {
    /// Poll ticks completed (monotonic)
    ticks_total: AtomicU64,
    /// Failed sensor reads (monotonic)
    read_failures_total: AtomicU64,
    /// Confirmed door transitions (monotonic)
    transitions_total: AtomicU64,
    /// Notifications delivered (monotonic)
    notifications_sent_total: AtomicU64,
    /// Intents suppressed by the throttle (monotonic)
    notifications_throttled_total: AtomicU64,
    /// Deliveries that failed (monotonic)
    notifications_failed_total: AtomicU64,
    /// Ticks since last report (reset on report)
    ticks_since_report: AtomicU64,
    last_report_time: Mutex<Instant>,
    started_at: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            ticks_total: AtomicU64::new(0),
            read_failures_total: AtomicU64::new(0),
            transitions_total: AtomicU64::new(0),
            notifications_sent_total: AtomicU64::new(0),
            notifications_throttled_total: AtomicU64::new(0),
            notifications_failed_total: AtomicU64::new(0),
            ticks_since_report: AtomicU64::new(0),
            last_report_time: Mutex::new(Instant::now()),
            started_at: Instant::now(),
        }
    }

    #[inline]
    pub fn record_tick(&self) {
        self.ticks_total.fetch_add(1, Ordering::Relaxed);
        self.ticks_since_report.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_read_failure(&self) {
        self.read_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_transition(&self) {
        self.transitions_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_notification_sent(&self) {
        self.notifications_sent_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_notification_throttled(&self) {
        self.notifications_throttled_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_notification_failed(&self) {
        self.notifications_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ticks_total(&self) -> u64 {
        self.ticks_total.load(Ordering::Relaxed)
    }

    pub fn read_failures_total(&self) -> u64 {
        self.read_failures_total.load(Ordering::Relaxed)
    }

    pub fn transitions_total(&self) -> u64 {
        self.transitions_total.load(Ordering::Relaxed)
    }

    pub fn notifications_sent_total(&self) -> u64 {
        self.notifications_sent_total.load(Ordering::Relaxed)
    }

    pub fn notifications_throttled_total(&self) -> u64 {
        self.notifications_throttled_total.load(Ordering::Relaxed)
    }

    pub fn notifications_failed_total(&self) -> u64 {
        self.notifications_failed_total.load(Ordering::Relaxed)
    }

    /// Snapshot the counters and reset the periodic ones
    pub fn report(&self) -> MetricsSummary {
        let ticks = self.ticks_since_report.swap(0, Ordering::Relaxed);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };
        let secs = elapsed.as_secs_f64();
        let ticks_per_min = if secs > 0.0 { ticks as f64 * 60.0 / secs } else { 0.0 };

        MetricsSummary {
            uptime_secs: self.started_at.elapsed().as_secs(),
            ticks_total: self.ticks_total(),
            ticks_per_min,
            read_failures_total: self.read_failures_total(),
            transitions_total: self.transitions_total(),
            notifications_sent: self.notifications_sent_total(),
            notifications_throttled: self.notifications_throttled_total(),
            notifications_failed: self.notifications_failed_total(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub uptime_secs: u64,
    pub ticks_total: u64,
    pub ticks_per_min: f64,
    pub read_failures_total: u64,
    pub transitions_total: u64,
    pub notifications_sent: u64,
    pub notifications_throttled: u64,
    pub notifications_failed: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            uptime_secs = %self.uptime_secs,
            ticks_total = %self.ticks_total,
            ticks_per_min = format!("{:.1}", self.ticks_per_min),
            read_failures = %self.read_failures_total,
            transitions = %self.transitions_total,
            sent = %self.notifications_sent,
            throttled = %self.notifications_throttled,
            failed = %self.notifications_failed,
            "monitor_stats"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.ticks_total(), 0);
        assert_eq!(metrics.notifications_sent_total(), 0);
    }

    #[test]
    fn test_report_resets_periodic_only() {
        let metrics = Metrics::new();
        metrics.record_tick();
        metrics.record_tick();
        metrics.record_read_failure();
        metrics.record_transition();
        metrics.record_notification_sent();
        metrics.record_notification_throttled();
        metrics.record_notification_failed();

        let summary = metrics.report();
        assert_eq!(summary.ticks_total, 2);
        assert_eq!(summary.read_failures_total, 1);
        assert_eq!(summary.transitions_total, 1);
        assert_eq!(summary.notifications_sent, 1);
        assert_eq!(summary.notifications_throttled, 1);
        assert_eq!(summary.notifications_failed, 1);
        assert_eq!(metrics.ticks_since_report.load(Ordering::Relaxed), 0);

        let again = metrics.report();
        assert_eq!(again.ticks_total, 2);
    }
}
