//! Sensor source abstraction and debounce filter
//!
//! A `SensorSource` yields one `Reading` per call. Concrete sources live in
//! `serial` (microcontroller over USB) and `gpio` (sysfs value files).
//! `Debouncer` wraps any source and confirms a changed reading by re-reading
//! it after the debounce time.

use crate::domain::types::{Reading, SensorMode};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    #[error("no complete frame within {0:?}")]
    Timeout(Duration),

    #[error("malformed sensor frame: {0:?}")]
    Malformed(String),

    #[error("sensor source disconnected")]
    Disconnected,

    #[error("reading {reading} does not fit {mode} sensor mode")]
    ShapeMismatch { mode: &'static str, reading: String },
}

#[async_trait]
pub trait SensorSource: Send {
    /// Sensor layout this source produces readings for
    fn mode(&self) -> SensorMode;

    /// Take one reading
    async fn read(&mut self) -> Result<Reading, SensorError>;
}

#[async_trait]
impl SensorSource for Box<dyn SensorSource> {
    fn mode(&self) -> SensorMode {
        (**self).mode()
    }

    async fn read(&mut self) -> Result<Reading, SensorError> {
        (**self).read().await
    }
}

/// Confirms a change by sleeping `debounce` and reading again
pub struct Debouncer<S> {
    inner: S,
    debounce: Duration,
    confirmed: Option<Reading>,
}

impl<S: SensorSource> Debouncer<S> {
    pub fn new(inner: S, debounce: Duration) -> Self {
        Self { inner, debounce, confirmed: None }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: SensorSource> SensorSource for Debouncer<S> {
    fn mode(&self) -> SensorMode {
        self.inner.mode()
    }

    async fn read(&mut self) -> Result<Reading, SensorError> {
        let reading = self.inner.read().await?;

        let Some(confirmed) = self.confirmed else {
            self.confirmed = Some(reading);
            return Ok(reading);
        };
        if reading == confirmed || self.debounce.is_zero() {
            self.confirmed = Some(reading);
            return Ok(reading);
        }

        debug!(
            previous = %confirmed,
            candidate = %reading,
            debounce_ms = %self.debounce.as_millis(),
            "sensor_change_debouncing"
        );
        tokio::time::sleep(self.debounce).await;

        let second = self.inner.read().await?;
        if second != reading {
            debug!(candidate = %reading, confirmed = %second, "sensor_change_unstable");
        }
        self.confirmed = Some(second);
        Ok(second)
    }
}

/// Fixed sequence of results, for tests and dry runs
///
/// Public so integration tests and downstream harnesses can drive a `Monitor`
/// without hardware.
pub struct ScriptedSensor {
    mode: SensorMode,
    script: std::collections::VecDeque<Result<Reading, SensorError>>,
}

impl ScriptedSensor {
    pub fn new(mode: SensorMode) -> Self {
        Self { mode, script: std::collections::VecDeque::new() }
    }

    pub fn push(&mut self, reading: Reading) -> &mut Self {
        self.script.push_back(Ok(reading));
        self
    }

    pub fn push_err(&mut self, err: SensorError) -> &mut Self {
        self.script.push_back(Err(err));
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[async_trait]
impl SensorSource for ScriptedSensor {
    fn mode(&self) -> SensorMode {
        self.mode
    }

    async fn read(&mut self) -> Result<Reading, SensorError> {
        self.script.pop_front().unwrap_or(Err(SensorError::Disconnected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dual(open: bool, closed: bool) -> Reading {
        Reading::Dual { open, closed }
    }

    #[tokio::test]
    async fn test_debouncer_passes_stable_readings() {
        let mut inner = ScriptedSensor::new(SensorMode::Dual);
        inner.push(dual(false, true)).push(dual(false, true));
        let mut d = Debouncer::new(inner, Duration::from_millis(5));

        assert_eq!(d.read().await.unwrap(), dual(false, true));
        assert_eq!(d.read().await.unwrap(), dual(false, true));
        assert_eq!(d.into_inner().remaining(), 0);
    }

    #[tokio::test]
    async fn test_debouncer_rereads_on_change() {
        let mut inner = ScriptedSensor::new(SensorMode::Dual);
        inner.push(dual(false, true)).push(dual(true, false)).push(dual(true, false));
        let mut d = Debouncer::new(inner, Duration::from_millis(5));

        d.read().await.unwrap();
        assert_eq!(d.read().await.unwrap(), dual(true, false));
        // Both the candidate and the confirmation read were consumed
        assert_eq!(d.into_inner().remaining(), 0);
    }

    #[tokio::test]
    async fn test_debouncer_takes_confirmation_value() {
        let mut inner = ScriptedSensor::new(SensorMode::Dual);
        inner.push(dual(false, true)).push(dual(true, true)).push(dual(false, false));
        let mut d = Debouncer::new(inner, Duration::from_millis(5));

        d.read().await.unwrap();
        assert_eq!(d.read().await.unwrap(), dual(false, false));
    }

    #[tokio::test]
    async fn test_debouncer_propagates_errors() {
        let mut inner = ScriptedSensor::new(SensorMode::Dual);
        inner.push(dual(false, true)).push(dual(true, false));
        let mut d = Debouncer::new(inner, Duration::from_millis(5));

        d.read().await.unwrap();
        // Confirmation read hits the end of the script
        assert!(matches!(d.read().await, Err(SensorError::Disconnected)));
    }

    #[tokio::test]
    async fn test_zero_debounce_is_passthrough() {
        let mut inner = ScriptedSensor::new(SensorMode::Dual);
        inner.push(dual(false, true)).push(dual(true, false));
        let mut d = Debouncer::new(inner, Duration::ZERO);

        d.read().await.unwrap();
        assert_eq!(d.read().await.unwrap(), dual(true, false));
    }
}
