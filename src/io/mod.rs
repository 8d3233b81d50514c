//! IO modules - external system interfaces
//!
//! - `sensor` - Sensor source trait, debounce filter, scripted source
//! - `serial` - Microcontroller door sensors over USB serial
//! - `gpio` - Direct-wired door switches via sysfs GPIO
//! - `notifier` - Notification sink trait
//! - `ntfy` - ntfy push delivery over HTTP

pub mod gpio;
pub mod notifier;
pub mod ntfy;
pub mod sensor;
pub mod serial;

// Re-export commonly used types
pub use gpio::GpioSensor;
pub use notifier::{Notifier, NotifyError, RecordingNotifier};
pub use ntfy::NtfyNotifier;
pub use sensor::{Debouncer, ScriptedSensor, SensorError, SensorSource};
pub use serial::SerialSensor;
