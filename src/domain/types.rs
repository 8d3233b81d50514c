//! Shared types for the garage monitor

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

/// Physical door position inferred from the sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    Closed,
    Open,
    /// Dual-sensor only: neither end switch is triggered
    PartiallyOpen,
    /// Dual-sensor only: both end switches are triggered (wiring fault)
    Unknown,
}

impl DoorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoorState::Closed => "closed",
            DoorState::Open => "open",
            DoorState::PartiallyOpen => "partial",
            DoorState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DoorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many end switches the installation has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorMode {
    /// One switch, open/closed by line level
    Single { open_level: bool },
    /// Fully-open and fully-closed switches
    Dual,
}

impl SensorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorMode::Single { .. } => "single",
            SensorMode::Dual => "dual",
        }
    }
}

/// One debounced sample from the sensor source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    /// Raw line level of the single door switch
    Single(bool),
    /// Triggered flags of the fully-open and fully-closed switches
    Dual { open: bool, closed: bool },
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Single(level) => write!(f, "{}", u8::from(*level)),
            Reading::Dual { open, closed } => {
                write!(f, "{},{}", u8::from(*open), u8::from(*closed))
            }
        }
    }
}

/// Current state and when the door entered it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateRecord {
    pub current_state: DoorState,
    pub state_entered_at: DateTime<Local>,
}

impl StateRecord {
    /// How long the current episode has lasted at `now`
    pub fn elapsed(&self, now: DateTime<Local>) -> Duration {
        now - self.state_entered_at
    }
}

/// A confirmed change of door state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: DoorState,
    pub to: DoorState,
    pub at: DateTime<Local>,
    /// When the episode that just ended had started
    pub from_entered_at: DateTime<Local>,
}

impl Transition {
    /// Length of the episode that this transition ended
    pub fn previous_episode(&self) -> Duration {
        self.at - self.from_entered_at
    }
}

/// ntfy message priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Min,
    Low,
    Default,
    High,
    Urgent,
}

impl Priority {
    /// Numeric priority used by the ntfy JSON API (1..=5)
    pub fn as_u8(&self) -> u8 {
        match self {
            Priority::Min => 1,
            Priority::Low => 2,
            Priority::Default => 3,
            Priority::High => 4,
            Priority::Urgent => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Min => "min",
            Priority::Low => "low",
            Priority::Default => "default",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

/// A rendered push notification, ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub tags: Vec<String>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, priority: Priority) -> Self {
        Self { title: title.into(), message: message.into(), priority, tags: Vec::new() }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_door_state_as_str() {
        assert_eq!(DoorState::Closed.as_str(), "closed");
        assert_eq!(DoorState::Open.as_str(), "open");
        assert_eq!(DoorState::PartiallyOpen.as_str(), "partial");
        assert_eq!(DoorState::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_reading_display() {
        assert_eq!(Reading::Single(true).to_string(), "1");
        assert_eq!(Reading::Dual { open: true, closed: false }.to_string(), "1,0");
    }

    #[test]
    fn test_priority_numbers() {
        assert_eq!(Priority::Min.as_u8(), 1);
        assert_eq!(Priority::Default.as_u8(), 3);
        assert_eq!(Priority::Urgent.as_u8(), 5);
        assert!(Priority::Urgent > Priority::High);
    }

    #[test]
    fn test_transition_previous_episode() {
        let start = Local.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap();
        let t = Transition {
            from: DoorState::Open,
            to: DoorState::Closed,
            at: start + Duration::seconds(95),
            from_entered_at: start,
        };
        assert_eq!(t.previous_episode(), Duration::seconds(95));
    }
}
