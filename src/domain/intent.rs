//! Notification intents produced by the policy evaluator
//!
//! An intent says *what* happened; `to_notification()` renders it into the
//! title/message/priority/tags tuple the notifier delivers.

use crate::domain::types::{DoorState, Notification, Priority, SensorMode};
use chrono::{DateTime, Duration, Local};
use serde::Deserialize;

/// Notification categories, one throttle record per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    MonitorStarted,
    DoorOpened,
    SuspiciousActivity,
    DoorOpenTooLong,
    DoorStuck,
    DoorClosed,
    UnknownState,
    SensorFault,
    MonitorError,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::MonitorStarted => "monitor_started",
            NotificationKind::DoorOpened => "door_opened",
            NotificationKind::SuspiciousActivity => "suspicious_activity",
            NotificationKind::DoorOpenTooLong => "door_open_too_long",
            NotificationKind::DoorStuck => "door_stuck",
            NotificationKind::DoorClosed => "door_closed",
            NotificationKind::UnknownState => "unknown_state",
            NotificationKind::SensorFault => "sensor_fault",
            NotificationKind::MonitorError => "monitor_error",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something worth telling the user about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationIntent {
    MonitorStarted { state: DoorState, mode: SensorMode },
    DoorOpened { at: DateTime<Local> },
    SuspiciousActivity { at: DateTime<Local> },
    DoorOpenTooLong { open_for: Duration },
    DoorStuck { partial_for: Duration },
    DoorClosed { at: DateTime<Local>, open_for: Option<Duration> },
    UnknownState { at: DateTime<Local> },
    SensorFault { consecutive_failures: u32, error: String },
    MonitorError { error: String },
}

impl NotificationIntent {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationIntent::MonitorStarted { .. } => NotificationKind::MonitorStarted,
            NotificationIntent::DoorOpened { .. } => NotificationKind::DoorOpened,
            NotificationIntent::SuspiciousActivity { .. } => NotificationKind::SuspiciousActivity,
            NotificationIntent::DoorOpenTooLong { .. } => NotificationKind::DoorOpenTooLong,
            NotificationIntent::DoorStuck { .. } => NotificationKind::DoorStuck,
            NotificationIntent::DoorClosed { .. } => NotificationKind::DoorClosed,
            NotificationIntent::UnknownState { .. } => NotificationKind::UnknownState,
            NotificationIntent::SensorFault { .. } => NotificationKind::SensorFault,
            NotificationIntent::MonitorError { .. } => NotificationKind::MonitorError,
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            NotificationIntent::MonitorStarted { .. } => Priority::Low,
            NotificationIntent::DoorOpened { .. } => Priority::Default,
            NotificationIntent::SuspiciousActivity { .. } => Priority::Urgent,
            NotificationIntent::DoorOpenTooLong { .. } => Priority::High,
            NotificationIntent::DoorStuck { .. } => Priority::High,
            NotificationIntent::DoorClosed { .. } => Priority::Low,
            NotificationIntent::UnknownState { .. } => Priority::Urgent,
            NotificationIntent::SensorFault { .. } => Priority::Urgent,
            NotificationIntent::MonitorError { .. } => Priority::Urgent,
        }
    }

    /// Render into a deliverable notification
    pub fn to_notification(&self) -> Notification {
        let priority = self.priority();
        match self {
            NotificationIntent::MonitorStarted { state, mode } => Notification::new(
                "Garage monitor started",
                format!(
                    "Garage door monitoring is active ({} sensor mode), door is {}",
                    mode.as_str(),
                    state
                ),
                priority,
            )
            .with_tags(&["white_check_mark"]),
            NotificationIntent::DoorOpened { at } => Notification::new(
                "Garage door opened",
                format!("Garage door reached the fully open position at {}", clock(at)),
                priority,
            )
            .with_tags(&["door", "unlock"]),
            NotificationIntent::SuspiciousActivity { at } => Notification::new(
                "Suspicious garage activity",
                format!("Garage door was opened at {} (unusual hour)", clock(at)),
                priority,
            )
            .with_tags(&["rotating_light", "warning"]),
            NotificationIntent::DoorOpenTooLong { open_for } => Notification::new(
                "Garage door open too long",
                format!(
                    "Garage door has been fully open for {} minutes",
                    open_for.num_minutes()
                ),
                priority,
            )
            .with_tags(&["warning", "clock"]),
            NotificationIntent::DoorStuck { partial_for } => Notification::new(
                "Garage door stuck",
                format!(
                    "Garage door has been partially open for {} seconds",
                    partial_for.num_seconds()
                ),
                priority,
            )
            .with_tags(&["warning", "door"]),
            NotificationIntent::DoorClosed { at, open_for } => {
                let suffix = match open_for {
                    Some(d) => format!(" (was open {})", format_duration(*d)),
                    None => String::new(),
                };
                Notification::new(
                    "Garage door closed",
                    format!(
                        "Garage door reached the fully closed position at {}{}",
                        clock(at),
                        suffix
                    ),
                    priority,
                )
                .with_tags(&["door", "lock"])
            }
            NotificationIntent::UnknownState { at } => Notification::new(
                "Garage door state unknown",
                format!(
                    "Both sensors are triggered at {}, possible wiring problem",
                    clock(at)
                ),
                priority,
            )
            .with_tags(&["question", "warning"]),
            NotificationIntent::SensorFault { consecutive_failures, error } => Notification::new(
                "Garage sensor fault",
                format!(
                    "Sensor could not be read {} times in a row: {}",
                    consecutive_failures, error
                ),
                priority,
            )
            .with_tags(&["warning", "electric_plug"]),
            NotificationIntent::MonitorError { error } => Notification::new(
                "Garage monitor error",
                format!("Monitoring stopped because of an error: {}", error),
                priority,
            )
            .with_tags(&["x", "warning"]),
        }
    }
}

fn clock(at: &DateTime<Local>) -> String {
    at.format("%H:%M").to_string()
}

/// `"4m 5s"` or `"42s"`
pub fn format_duration(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    let minutes = total / 60;
    let seconds = total % 60;
    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
