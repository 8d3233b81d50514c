//! Infrastructure - configuration, clock, logging and metrics
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults, validation)
//! - `clock` - Injectable wall clock
//! - `logging` - tracing subscriber setup
//! - `metrics` - Lock-free counters

pub mod clock;
pub mod config;
pub mod logging;
pub mod metrics;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, SourceKind};
pub use metrics::Metrics;
