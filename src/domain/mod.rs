//! Domain models - door states, readings and notification intents
//!
//! This module contains the canonical data types used throughout the system:
//! - `DoorState` - inferred physical door position
//! - `Reading` - one debounced sensor sample
//! - `StateRecord` / `Transition` - the door-state timeline
//! - `NotificationIntent` - what the policies want to tell the user
//! - `Notification` - rendered message handed to the notifier

pub mod intent;
pub mod types;

// Re-export commonly used types at module level
pub use intent::{NotificationIntent, NotificationKind};
pub use types::{DoorState, Notification, Priority, Reading, SensorMode, StateRecord, Transition};
