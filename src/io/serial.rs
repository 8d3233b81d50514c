//! Dual-sensor input from a microcontroller over USB serial
//!
//! Protocol:
//! - 8N1, default 9600 baud, one line per sample, `\n` terminated
//! - `"<open>,<closed>"` where each value is `0` or `1`
//! - or a keyword line: `CLOSED`, `OPEN`, `PARTIAL` (case-insensitive)
//!
//! The board streams continuously. Before each read the OS input buffer is
//! flushed and the first (possibly truncated) line is discarded, so the line
//! returned is always one that started after the read began.

use crate::domain::types::{Reading, SensorMode};
use crate::infra::config::Config;
use crate::io::sensor::{SensorError, SensorSource};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::time::Instant;
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialPortType, SerialStream};
use tracing::{info, trace, warn};

/// Known USB VID:PID pairs of Nano-class boards and their USB-serial bridges
const KNOWN_VID_PID: [&str; 3] = ["2341:0043", "1a86:7523", "0403:6001"];

/// Description fragments identifying the same boards
const KNOWN_DESCRIPTIONS: [&str; 3] = ["Arduino", "CH340", "FTDI"];

/// Longest line accepted before the buffer is considered garbage
const MAX_LINE_LEN: usize = 128;

/// Parse one frame into a dual reading.
///
/// `triggered_level` is the value (`0`/`1`) a switch reports when triggered.
pub fn parse_frame(line: &str, triggered_level: bool) -> Result<Reading, SensorError> {
    let line = line.trim();
    let upper = line.to_ascii_uppercase();

    if upper.contains("CLOSED") {
        return Ok(Reading::Dual { open: false, closed: true });
    }
    if upper.contains("OPEN") {
        return Ok(Reading::Dual { open: true, closed: false });
    }
    if upper.contains("PARTIAL") {
        return Ok(Reading::Dual { open: false, closed: false });
    }

    // Fields past the second are ignored
    let mut parts = line.split(',');
    let (Some(open), Some(closed)) = (parts.next(), parts.next()) else {
        return Err(SensorError::Malformed(line.to_string()));
    };

    let level = |v: &str| match v.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(SensorError::Malformed(line.to_string())),
    };

    Ok(Reading::Dual { open: level(open)? == triggered_level, closed: level(closed)? == triggered_level })
}

/// Splits a byte stream into lines, dropping the first fragment after a reset
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
    synced: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self { buffer: Vec::with_capacity(64), synced: false }
    }

    /// Forget buffered bytes; the next complete line is treated as a fragment
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.synced = false;
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
        if self.buffer.len() > MAX_LINE_LEN && !self.buffer.contains(&b'\n') {
            trace!(discarded = self.buffer.len(), "serial_line_overflow");
            self.buffer.clear();
            self.synced = false;
        }
    }

    /// Next complete, non-empty line
    pub fn next_line(&mut self) -> Option<String> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            if !self.synced {
                self.synced = true;
                trace!(discarded = raw.len(), "serial_sync_discarded_fragment");
                continue;
            }
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }
}

/// A USB serial port seen during auto-detection
#[derive(Debug, Clone)]
pub struct PortCandidate {
    pub device: String,
    pub vid_pid: Option<String>,
    pub description: String,
    pub looks_like_board: bool,
}

pub fn is_known_board(vid_pid: &str, description: &str) -> bool {
    KNOWN_VID_PID.contains(&vid_pid) || KNOWN_DESCRIPTIONS.iter().any(|d| description.contains(d))
}

/// Enumerate serial ports with a guess whether each is a sensor board
pub fn list_ports() -> Result<Vec<PortCandidate>, SensorError> {
    let ports = tokio_serial::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| match p.port_type {
            SerialPortType::UsbPort(usb) => {
                let vid_pid = format!("{:04x}:{:04x}", usb.vid, usb.pid);
                let description = [usb.manufacturer, usb.product]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                let looks_like_board = is_known_board(&vid_pid, &description);
                PortCandidate { device: p.port_name, vid_pid: Some(vid_pid), description, looks_like_board }
            }
            other => PortCandidate {
                device: p.port_name,
                vid_pid: None,
                description: format!("{:?}", other),
                looks_like_board: false,
            },
        })
        .collect())
}

/// First port that looks like a sensor board
pub fn find_board_port() -> Result<Option<String>, SensorError> {
    info!("serial_port_autodetect");
    let candidates = list_ports()?;
    for c in &candidates {
        info!(
            device = %c.device,
            vid_pid = %c.vid_pid.as_deref().unwrap_or("-"),
            description = %c.description,
            "serial_port_found"
        );
    }
    let found = candidates.iter().find(|c| c.looks_like_board).map(|c| c.device.clone());
    if found.is_none() {
        warn!(ports = %candidates.len(), "serial_board_not_found");
    }
    Ok(found)
}

pub struct SerialSensor {
    device: String,
    port: SerialStream,
    triggered_level: bool,
    timeout: Duration,
    framer: LineFramer,
}

impl SerialSensor {
    /// Open the configured (or auto-detected) port and wait for the board to boot
    pub async fn open(config: &Config) -> Result<Self, SensorError> {
        let device = if config.serial_port().is_empty() {
            find_board_port()?.ok_or(SensorError::Disconnected)?
        } else {
            config.serial_port().to_string()
        };

        Self::open_device(
            &device,
            config.serial_baud_rate(),
            Duration::from_millis(config.serial_startup_delay_ms()),
            Duration::from_millis(config.serial_timeout_ms()),
            config.sensor_triggered_level(),
        )
        .await
    }

    pub async fn open_device(
        device: &str,
        baud: u32,
        startup_delay: Duration,
        timeout: Duration,
        triggered_level: bool,
    ) -> Result<Self, SensorError> {
        let port = tokio_serial::new(device, baud)
            .timeout(Duration::from_millis(100))
            .open_native_async()?;
        info!(device = %device, baud = %baud, "serial_port_opened");

        // Opening the port resets most boards
        if !startup_delay.is_zero() {
            info!(delay_ms = %startup_delay.as_millis(), "serial_waiting_for_board");
            tokio::time::sleep(startup_delay).await;
        }

        Ok(Self {
            device: device.to_string(),
            port,
            triggered_level,
            timeout,
            framer: LineFramer::new(),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Read the next fresh line from the board
    pub async fn read_line(&mut self) -> Result<String, SensorError> {
        self.port.clear(ClearBuffer::Input)?;
        self.framer.reset();

        let deadline = Instant::now() + self.timeout;
        let mut temp_buf = [0u8; 64];

        loop {
            if let Some(line) = self.framer.next_line() {
                trace!(line = %line, "serial_line");
                return Ok(line);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SensorError::Timeout(self.timeout));
            }

            match tokio::time::timeout(remaining, self.port.read(&mut temp_buf)).await {
                Ok(Ok(0)) => return Err(SensorError::Disconnected),
                Ok(Ok(n)) => self.framer.push(&temp_buf[..n]),
                Ok(Err(e)) if e.kind() == ErrorKind::TimedOut => {}
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(SensorError::Timeout(self.timeout)),
            }
        }
    }
}

#[async_trait]
impl SensorSource for SerialSensor {
    fn mode(&self) -> SensorMode {
        SensorMode::Dual
    }

    async fn read(&mut self) -> Result<Reading, SensorError> {
        let line = self.read_line().await?;
        parse_frame(&line, self.triggered_level)
    }
}
