//! Notification throttle
//!
//! Keeps one `last_sent_at` per notification kind and refuses a kind until its
//! minimum interval has passed. Only successful deliveries are recorded, so a
//! failed send never blocks the next qualifying event.

use crate::domain::intent::NotificationKind;
use chrono::{DateTime, Duration, Local};
use std::collections::HashMap;
use tracing::debug;

pub struct NotificationThrottle {
    min_interval: Duration,
    overrides: HashMap<NotificationKind, Duration>,
    last_sent: HashMap<NotificationKind, DateTime<Local>>,
}

impl NotificationThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, overrides: HashMap::new(), last_sent: HashMap::new() }
    }

    /// Use a different interval for one kind
    pub fn with_override(mut self, kind: NotificationKind, interval: Duration) -> Self {
        self.overrides.insert(kind, interval);
        self
    }

    pub fn interval(&self, kind: NotificationKind) -> Duration {
        self.overrides.get(&kind).copied().unwrap_or(self.min_interval)
    }

    pub fn should_send(&self, kind: NotificationKind, now: DateTime<Local>) -> bool {
        let Some(last) = self.last_sent.get(&kind) else {
            return true;
        };
        let since = now - *last;
        let allowed = since >= self.interval(kind);
        if !allowed {
            debug!(
                kind = %kind,
                since_secs = %since.num_seconds(),
                interval_secs = %self.interval(kind).num_seconds(),
                "notification_throttled"
            );
        }
        allowed
    }

    pub fn record_sent(&mut self, kind: NotificationKind, now: DateTime<Local>) {
        self.last_sent.insert(kind, now);
    }

    pub fn last_sent(&self, kind: NotificationKind) -> Option<DateTime<Local>> {
        self.last_sent.get(&kind).copied()
    }
}
