//! Services - door state, alert policies and the poll loop
//!
//! - `door_machine` - Reading to door state mapping and transition detection
//! - `policy` - Decides which notifications a tick warrants
//! - `throttle` - Per-kind minimum interval between notifications
//! - `monitor` - Poll loop wiring sensor, policies and notifier together

pub mod door_machine;
pub mod monitor;
pub mod policy;
pub mod throttle;

// Re-export commonly used types
pub use door_machine::DoorStateMachine;
pub use monitor::Monitor;
pub use policy::{PolicyConfig, PolicyEvaluator, SuspiciousWindow};
pub use throttle::NotificationThrottle;
