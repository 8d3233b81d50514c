//! Direct-wired door switches read through sysfs GPIO value files
//!
//! One pin (`open_path`) gives the single-sensor variant; adding `closed_path`
//! turns it into the dual-sensor variant. Every read takes several samples and
//! uses the majority value per pin. Pins must already be exported and
//! configured as inputs (pull-ups are a board/overlay concern).

use crate::domain::types::{Reading, SensorMode};
use crate::infra::config::Config;
use crate::io::sensor::{SensorError, SensorSource};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub struct GpioSensor {
    open_path: PathBuf,
    closed_path: Option<PathBuf>,
    /// Line level that means "door open" (single mode)
    open_level: bool,
    /// Line level a switch reports when triggered (dual mode)
    triggered_level: bool,
    samples: usize,
    sample_spacing: Duration,
}

impl GpioSensor {
    pub fn new(config: &Config) -> Self {
        let sensor = Self {
            open_path: PathBuf::from(config.gpio_open_path()),
            closed_path: config.gpio_closed_path().map(PathBuf::from),
            open_level: config.gpio_open_level(),
            triggered_level: config.sensor_triggered_level(),
            samples: config.gpio_samples(),
            sample_spacing: Duration::from_millis(config.gpio_sample_spacing_ms()),
        };
        info!(
            open_path = %sensor.open_path.display(),
            closed_path = ?sensor.closed_path.as_ref().map(|p| p.display().to_string()),
            mode = %sensor.mode().as_str(),
            samples = %sensor.samples,
            "gpio_sensor_configured"
        );
        sensor
    }

    /// Check that the value files exist and are readable
    pub async fn probe(&self) -> Result<(), SensorError> {
        read_level(&self.open_path).await?;
        if let Some(ref p) = self.closed_path {
            read_level(p).await?;
        }
        Ok(())
    }

    async fn sample(&self) -> Result<(bool, Option<bool>), SensorError> {
        let mut open_votes = Vec::with_capacity(self.samples);
        let mut closed_votes = Vec::with_capacity(self.samples);

        for i in 0..self.samples {
            if i > 0 && !self.sample_spacing.is_zero() {
                tokio::time::sleep(self.sample_spacing).await;
            }
            open_votes.push(read_level(&self.open_path).await?);
            if let Some(ref p) = self.closed_path {
                closed_votes.push(read_level(p).await?);
            }
        }

        let closed = self.closed_path.as_ref().map(|_| majority(&closed_votes));
        Ok((majority(&open_votes), closed))
    }
}

#[async_trait]
impl SensorSource for GpioSensor {
    fn mode(&self) -> SensorMode {
        match self.closed_path {
            Some(_) => SensorMode::Dual,
            None => SensorMode::Single { open_level: self.open_level },
        }
    }

    async fn read(&mut self) -> Result<Reading, SensorError> {
        match self.sample().await? {
            (open_level, Some(closed_level)) => Ok(Reading::Dual {
                open: open_level == self.triggered_level,
                closed: closed_level == self.triggered_level,
            }),
            (level, None) => Ok(Reading::Single(level)),
        }
    }
}

/// Read a sysfs value file (`"0\n"` / `"1\n"`)
pub async fn read_level(path: &Path) -> Result<bool, SensorError> {
    let content = tokio::fs::read_to_string(path).await?;
    match content.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(SensorError::Malformed(format!("{}: {:?}", path.display(), other))),
    }
}

/// Most common level; ties resolve to the first sample
pub fn majority(votes: &[bool]) -> bool {
    let highs = votes.iter().filter(|v| **v).count();
    let lows = votes.len() - highs;
    match highs.cmp(&lows) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => votes.first().copied().unwrap_or(false),
    }
}
