//! Alert policies
//!
//! Runs after every state-machine step, with or without a transition, because
//! the duration-based policies (long-open, partial-stuck) must fire while the
//! state is unchanged. Each duration policy fires at most once per episode; the
//! guard is keyed to the episode's entry time so it re-arms automatically when
//! the door leaves and re-enters the state.

use crate::domain::intent::NotificationIntent;
use crate::domain::types::{DoorState, SensorMode, StateRecord, Transition};
use crate::infra::config::Config;
use chrono::{DateTime, Duration, Local, Timelike};
use tracing::{debug, info};

/// Clock-hour range `[start, end)`, wrapping midnight when `start > end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspiciousWindow {
    pub start: u32,
    pub end: u32,
}

impl SuspiciousWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start > self.end {
            hour >= self.start || hour < self.end
        } else {
            self.start <= hour && hour < self.end
        }
    }
}

/// Policy switches and parameters
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub notify_on_open: bool,
    pub notify_on_close: bool,
    pub enable_night_alerts: bool,
    pub enable_long_open_alerts: bool,
    pub enable_partial_alerts: bool,
    pub suspicious_window: SuspiciousWindow,
    pub long_open_threshold: Duration,
    pub partial_position_threshold: Duration,
}

impl PolicyConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            notify_on_open: config.notify_on_open(),
            notify_on_close: config.notify_on_close(),
            enable_night_alerts: config.enable_night_alerts(),
            enable_long_open_alerts: config.enable_long_open_alerts(),
            enable_partial_alerts: config.enable_partial_alerts(),
            suspicious_window: SuspiciousWindow::new(
                config.suspicious_hours_start(),
                config.suspicious_hours_end(),
            ),
            long_open_threshold: Duration::seconds(config.long_open_threshold_secs() as i64),
            partial_position_threshold: Duration::seconds(
                config.partial_position_threshold_secs() as i64,
            ),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            notify_on_open: true,
            notify_on_close: true,
            enable_night_alerts: true,
            enable_long_open_alerts: true,
            enable_partial_alerts: true,
            suspicious_window: SuspiciousWindow::new(22, 6),
            long_open_threshold: Duration::seconds(600),
            partial_position_threshold: Duration::seconds(30),
        }
    }
}

pub struct PolicyEvaluator {
    config: PolicyConfig,
    mode: SensorMode,
    started: bool,
    /// Entry time of the open episode that already got its long-open alert
    long_open_fired_for: Option<DateTime<Local>>,
    /// Entry time of the partial episode that already got its stuck alert
    partial_fired_for: Option<DateTime<Local>>,
    /// When the door last left Closed for Open or PartiallyOpen; survives
    /// Open/PartiallyOpen/Unknown flips until the next close
    opened_since: Option<DateTime<Local>>,
}

impl PolicyEvaluator {
    pub fn new(config: PolicyConfig, mode: SensorMode) -> Self {
        Self {
            config,
            mode,
            started: false,
            long_open_fired_for: None,
            partial_fired_for: None,
            opened_since: None,
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Decide which notifications this tick warrants
    pub fn evaluate(
        &mut self,
        transition: Option<&Transition>,
        record: &StateRecord,
        now: DateTime<Local>,
    ) -> Vec<NotificationIntent> {
        let mut intents = Vec::new();

        if !self.started {
            self.started = true;
            if matches!(record.current_state, DoorState::Open | DoorState::PartiallyOpen) {
                self.opened_since = Some(record.state_entered_at);
            }
            intents.push(NotificationIntent::MonitorStarted {
                state: record.current_state,
                mode: self.mode,
            });
        }

        if let Some(t) = transition {
            self.on_transition(t, &mut intents);
        }

        match record.current_state {
            DoorState::Open => self.check_long_open(record, now, &mut intents),
            DoorState::PartiallyOpen => self.check_partial(record, now, &mut intents),
            DoorState::Closed | DoorState::Unknown => {}
        }

        intents
    }

    fn on_transition(&mut self, t: &Transition, intents: &mut Vec<NotificationIntent>) {
        match t.to {
            DoorState::Open => {
                self.opened_since.get_or_insert(t.at);
                let hour = t.at.hour();
                if self.config.enable_night_alerts && self.config.suspicious_window.contains(hour)
                {
                    intents.push(NotificationIntent::SuspiciousActivity { at: t.at });
                } else if self.config.notify_on_open {
                    intents.push(NotificationIntent::DoorOpened { at: t.at });
                } else {
                    info!(hour = %hour, "door_opened_normal_hours_silent");
                }
            }
            DoorState::Closed => {
                // Whole span since leaving Closed, not just the last episode
                let open_for = match (self.opened_since.take(), t.from) {
                    (Some(since), _) => Some(t.at - since),
                    (None, DoorState::Open | DoorState::PartiallyOpen) => Some(t.previous_episode()),
                    (None, DoorState::Closed | DoorState::Unknown) => None,
                };
                if self.config.notify_on_close {
                    intents.push(NotificationIntent::DoorClosed { at: t.at, open_for });
                } else {
                    info!(
                        open_for_secs = ?open_for.map(|d| d.num_seconds()),
                        "door_closed_silent"
                    );
                }
            }
            DoorState::PartiallyOpen => {
                self.opened_since.get_or_insert(t.at);
                debug!(from = %t.from, "door_partially_open");
            }
            DoorState::Unknown => {
                intents.push(NotificationIntent::UnknownState { at: t.at });
            }
        }
    }

    fn check_long_open(
        &mut self,
        record: &StateRecord,
        now: DateTime<Local>,
        intents: &mut Vec<NotificationIntent>,
    ) {
        if !self.config.enable_long_open_alerts
            || self.long_open_fired_for == Some(record.state_entered_at)
        {
            return;
        }
        let open_for = record.elapsed(now);
        if open_for >= self.config.long_open_threshold {
            self.long_open_fired_for = Some(record.state_entered_at);
            intents.push(NotificationIntent::DoorOpenTooLong { open_for });
        }
    }

    fn check_partial(
        &mut self,
        record: &StateRecord,
        now: DateTime<Local>,
        intents: &mut Vec<NotificationIntent>,
    ) {
        if self.mode != SensorMode::Dual
            || !self.config.enable_partial_alerts
            || self.partial_fired_for == Some(record.state_entered_at)
        {
            return;
        }
        let partial_for = record.elapsed(now);
        if partial_for >= self.config.partial_position_threshold {
            self.partial_fired_for = Some(record.state_entered_at);
            intents.push(NotificationIntent::DoorStuck { partial_for });
        }
    }
}
