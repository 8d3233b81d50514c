//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/garage.toml
//!
//! A missing file falls back to defaults. A file that exists but does not
//! parse, or values that fail validation, abort startup.

use crate::domain::intent::NotificationKind;
use anyhow::{bail, ensure, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/garage.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Microcontroller streaming `open,closed` lines over USB serial
    Serial,
    /// sysfs GPIO value files
    Gpio,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Serial => "serial",
            SourceKind::Gpio => "gpio",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    #[serde(default = "default_source")]
    pub source: SourceKind,
    /// Line value (0/1) a switch reports when triggered
    #[serde(default = "default_triggered_state")]
    pub sensor_triggered_state: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { source: default_source(), sensor_triggered_state: default_triggered_state() }
    }
}

fn default_source() -> SourceKind {
    SourceKind::Serial
}

fn default_triggered_state() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    /// Device path; empty means auto-detect
    #[serde(default = "default_serial_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_serial_timeout_ms")]
    pub timeout_ms: u64,
    /// Wait after opening the port (the board resets on open)
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_serial_timeout_ms(),
            startup_delay_ms: default_startup_delay_ms(),
        }
    }
}

fn default_serial_port() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_serial_timeout_ms() -> u64 {
    2000
}

fn default_startup_delay_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
pub struct GpioConfig {
    #[serde(default = "default_gpio_open_path")]
    pub open_path: String,
    /// Set for the dual-sensor variant
    #[serde(default)]
    pub closed_path: Option<String>,
    /// Single-sensor polarity: line value (0/1) that means open
    #[serde(default = "default_open_state")]
    pub open_state: u8,
    #[serde(default = "default_gpio_samples")]
    pub samples: usize,
    #[serde(default = "default_sample_spacing_ms")]
    pub sample_spacing_ms: u64,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            open_path: default_gpio_open_path(),
            closed_path: None,
            open_state: default_open_state(),
            samples: default_gpio_samples(),
            sample_spacing_ms: default_sample_spacing_ms(),
        }
    }
}

fn default_gpio_open_path() -> String {
    "/sys/class/gpio/gpio0/value".to_string()
}

fn default_open_state() -> u8 {
    1
}

fn default_gpio_samples() -> usize {
    3
}

fn default_sample_spacing_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Consecutive read failures that raise a sensor-fault alert
    #[serde(default = "default_failure_alert_threshold")]
    pub failure_alert_threshold: u32,
    /// Consecutive read failures that stop the monitor
    #[serde(default = "default_failure_exit_threshold")]
    pub failure_exit_threshold: u32,
    /// Stats summary log interval (0 to disable)
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            debounce_ms: default_debounce_ms(),
            failure_alert_threshold: default_failure_alert_threshold(),
            failure_exit_threshold: default_failure_exit_threshold(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

fn default_check_interval_ms() -> u64 {
    2000
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_failure_alert_threshold() -> u32 {
    3
}

fn default_failure_exit_threshold() -> u32 {
    30
}

fn default_stats_interval_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_true")]
    pub notify_on_open: bool,
    #[serde(default = "default_true")]
    pub notify_on_close: bool,
    #[serde(default = "default_true")]
    pub enable_night_alerts: bool,
    #[serde(default = "default_true")]
    pub enable_long_open_alerts: bool,
    #[serde(default = "default_true")]
    pub enable_partial_alerts: bool,
    #[serde(default = "default_suspicious_start")]
    pub suspicious_hours_start: u32,
    #[serde(default = "default_suspicious_end")]
    pub suspicious_hours_end: u32,
    #[serde(default = "default_long_open_threshold")]
    pub long_open_threshold_secs: u64,
    #[serde(default = "default_partial_threshold")]
    pub partial_position_threshold_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            notify_on_open: true,
            notify_on_close: true,
            enable_night_alerts: true,
            enable_long_open_alerts: true,
            enable_partial_alerts: true,
            suspicious_hours_start: default_suspicious_start(),
            suspicious_hours_end: default_suspicious_end(),
            long_open_threshold_secs: default_long_open_threshold(),
            partial_position_threshold_secs: default_partial_threshold(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_suspicious_start() -> u32 {
    22
}

fn default_suspicious_end() -> u32 {
    6
}

fn default_long_open_threshold() -> u64 {
    600
}

fn default_partial_threshold() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_ntfy_server")]
    pub server: String,
    #[serde(default = "default_ntfy_topic")]
    pub topic: String,
    /// ntfy access token (takes precedence over username/password)
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_ntfy_timeout_ms")]
    pub timeout_ms: u64,
    /// Minimum seconds between two notifications of the same kind
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,
    /// Per-kind replacement for `min_interval_secs`
    #[serde(default)]
    pub min_interval_overrides: HashMap<NotificationKind, u64>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            server: default_ntfy_server(),
            topic: default_ntfy_topic(),
            token: None,
            username: None,
            password: None,
            timeout_ms: default_ntfy_timeout_ms(),
            min_interval_secs: default_min_interval_secs(),
            min_interval_overrides: HashMap::new(),
        }
    }
}

fn default_ntfy_server() -> String {
    "https://ntfy.sh".to_string()
}

fn default_ntfy_topic() -> String {
    "garage-monitor".to_string()
}

fn default_ntfy_timeout_ms() -> u64 {
    10_000
}

fn default_min_interval_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Directory for daily-rolled log files (stdout only when unset)
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
    /// Write the file log as JSON lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { directory: None, file_prefix: default_log_file_prefix(), json: false }
    }
}

fn default_log_file_prefix() -> String {
    "garage-monitor.log".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub gpio: GpioConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    source: SourceKind,
    sensor_triggered_state: u8,
    serial_port: String,
    serial_baud_rate: u32,
    serial_timeout_ms: u64,
    serial_startup_delay_ms: u64,
    gpio_open_path: String,
    gpio_closed_path: Option<String>,
    gpio_open_state: u8,
    gpio_samples: usize,
    gpio_sample_spacing_ms: u64,
    check_interval_ms: u64,
    debounce_ms: u64,
    failure_alert_threshold: u32,
    failure_exit_threshold: u32,
    stats_interval_secs: u64,
    notify_on_open: bool,
    notify_on_close: bool,
    enable_night_alerts: bool,
    enable_long_open_alerts: bool,
    enable_partial_alerts: bool,
    suspicious_hours_start: u32,
    suspicious_hours_end: u32,
    long_open_threshold_secs: u64,
    partial_position_threshold_secs: u64,
    ntfy_server: String,
    ntfy_topic: String,
    ntfy_token: Option<String>,
    ntfy_username: Option<String>,
    ntfy_password: Option<String>,
    ntfy_timeout_ms: u64,
    min_notification_interval_secs: u64,
    min_interval_overrides: HashMap<NotificationKind, u64>,
    log_directory: Option<String>,
    log_file_prefix: String,
    log_json: bool,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default")
    }
}

impl Config {
    fn from_toml(t: TomlConfig, config_file: &str) -> Self {
        Self {
            source: t.sensor.source,
            sensor_triggered_state: t.sensor.sensor_triggered_state,
            serial_port: t.serial.port,
            serial_baud_rate: t.serial.baud_rate,
            serial_timeout_ms: t.serial.timeout_ms,
            serial_startup_delay_ms: t.serial.startup_delay_ms,
            gpio_open_path: t.gpio.open_path,
            gpio_closed_path: t.gpio.closed_path,
            gpio_open_state: t.gpio.open_state,
            gpio_samples: t.gpio.samples,
            gpio_sample_spacing_ms: t.gpio.sample_spacing_ms,
            check_interval_ms: t.monitoring.check_interval_ms,
            debounce_ms: t.monitoring.debounce_ms,
            failure_alert_threshold: t.monitoring.failure_alert_threshold,
            failure_exit_threshold: t.monitoring.failure_exit_threshold,
            stats_interval_secs: t.monitoring.stats_interval_secs,
            notify_on_open: t.alerts.notify_on_open,
            notify_on_close: t.alerts.notify_on_close,
            enable_night_alerts: t.alerts.enable_night_alerts,
            enable_long_open_alerts: t.alerts.enable_long_open_alerts,
            enable_partial_alerts: t.alerts.enable_partial_alerts,
            suspicious_hours_start: t.alerts.suspicious_hours_start,
            suspicious_hours_end: t.alerts.suspicious_hours_end,
            long_open_threshold_secs: t.alerts.long_open_threshold_secs,
            partial_position_threshold_secs: t.alerts.partial_position_threshold_secs,
            ntfy_server: t.notifications.server,
            ntfy_topic: t.notifications.topic,
            ntfy_token: t.notifications.token,
            ntfy_username: t.notifications.username,
            ntfy_password: t.notifications.password,
            ntfy_timeout_ms: t.notifications.timeout_ms,
            min_notification_interval_secs: t.notifications.min_interval_secs,
            min_interval_overrides: t.notifications.min_interval_overrides,
            log_directory: t.logging.directory,
            log_file_prefix: t.logging.file_prefix,
            log_json: t.logging.json,
            config_file: config_file.to_string(),
        }
    }

    /// Determine config file path from the CLI value or environment
    pub fn resolve_config_path(cli: Option<&str>) -> String {
        if let Some(path) = cli {
            return path.to_string();
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        DEFAULT_CONFIG_PATH.to_string()
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str, config_file: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content)
            .with_context(|| format!("Failed to parse config file {}", config_file))?;
        let config = Self::from_toml(toml_config, config_file);
        config.validate().with_context(|| format!("Invalid configuration in {}", config_file))?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Load configuration - missing file means defaults, anything else must be valid
    pub fn load(path: &str) -> anyhow::Result<Self> {
        if !Path::new(path).exists() {
            eprintln!("Warning: config file {} not found. Using defaults.", path);
            let config = Self::default();
            config.validate().context("Invalid default configuration")?;
            return Ok(config);
        }
        Self::from_file(path)
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.suspicious_hours_start <= 23,
            "alerts.suspicious_hours_start must be 0..=23, got {}",
            self.suspicious_hours_start
        );
        ensure!(
            self.suspicious_hours_end <= 23,
            "alerts.suspicious_hours_end must be 0..=23, got {}",
            self.suspicious_hours_end
        );
        ensure!(
            self.suspicious_hours_start != self.suspicious_hours_end,
            "alerts.suspicious_hours_start and suspicious_hours_end are both {}, the window is empty \
             (disable enable_night_alerts instead)",
            self.suspicious_hours_start
        );
        ensure!(self.long_open_threshold_secs > 0, "alerts.long_open_threshold_secs must be > 0");
        ensure!(
            self.partial_position_threshold_secs > 0,
            "alerts.partial_position_threshold_secs must be > 0"
        );
        ensure!(self.check_interval_ms > 0, "monitoring.check_interval_ms must be > 0");
        ensure!(
            self.failure_alert_threshold > 0,
            "monitoring.failure_alert_threshold must be > 0"
        );
        ensure!(
            self.failure_exit_threshold >= self.failure_alert_threshold,
            "monitoring.failure_exit_threshold ({}) must be >= failure_alert_threshold ({})",
            self.failure_exit_threshold,
            self.failure_alert_threshold
        );
        ensure!(
            self.sensor_triggered_state <= 1,
            "sensor.sensor_triggered_state must be 0 or 1, got {}",
            self.sensor_triggered_state
        );
        ensure!(
            self.gpio_open_state <= 1,
            "gpio.open_state must be 0 or 1, got {}",
            self.gpio_open_state
        );

        match self.source {
            SourceKind::Serial => {
                ensure!(self.serial_baud_rate > 0, "serial.baud_rate must be > 0");
                ensure!(self.serial_timeout_ms > 0, "serial.timeout_ms must be > 0");
            }
            SourceKind::Gpio => {
                ensure!(!self.gpio_open_path.is_empty(), "gpio.open_path must be set");
                ensure!(self.gpio_samples > 0, "gpio.samples must be > 0");
                if let Some(ref closed) = self.gpio_closed_path {
                    ensure!(
                        closed != &self.gpio_open_path,
                        "gpio.closed_path must differ from gpio.open_path"
                    );
                }
            }
        }

        ensure!(!self.ntfy_topic.trim().is_empty(), "notifications.topic must be set");
        ensure!(
            !self.ntfy_topic.contains('/'),
            "notifications.topic must not contain '/', got {:?}",
            self.ntfy_topic
        );
        ensure!(self.ntfy_timeout_ms > 0, "notifications.timeout_ms must be > 0");
        let url = reqwest::Url::parse(&self.ntfy_server)
            .with_context(|| format!("notifications.server is not a URL: {}", self.ntfy_server))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("notifications.server must be http(s), got {}", url.scheme());
        }
        if self.ntfy_username.is_some() != self.ntfy_password.is_some() {
            bail!("notifications.username and notifications.password must be set together");
        }

        Ok(())
    }

    // Getters for all config fields
    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn sensor_triggered_level(&self) -> bool {
        self.sensor_triggered_state == 1
    }

    pub fn serial_port(&self) -> &str {
        &self.serial_port
    }

    pub fn serial_baud_rate(&self) -> u32 {
        self.serial_baud_rate
    }

    pub fn serial_timeout_ms(&self) -> u64 {
        self.serial_timeout_ms
    }

    pub fn serial_startup_delay_ms(&self) -> u64 {
        self.serial_startup_delay_ms
    }

    pub fn gpio_open_path(&self) -> &str {
        &self.gpio_open_path
    }

    pub fn gpio_closed_path(&self) -> Option<&str> {
        self.gpio_closed_path.as_deref()
    }

    pub fn gpio_open_level(&self) -> bool {
        self.gpio_open_state == 1
    }

    pub fn gpio_samples(&self) -> usize {
        self.gpio_samples
    }

    pub fn gpio_sample_spacing_ms(&self) -> u64 {
        self.gpio_sample_spacing_ms
    }

    pub fn check_interval_ms(&self) -> u64 {
        self.check_interval_ms
    }

    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    pub fn failure_alert_threshold(&self) -> u32 {
        self.failure_alert_threshold
    }

    pub fn failure_exit_threshold(&self) -> u32 {
        self.failure_exit_threshold
    }

    pub fn stats_interval_secs(&self) -> u64 {
        self.stats_interval_secs
    }

    pub fn notify_on_open(&self) -> bool {
        self.notify_on_open
    }

    pub fn notify_on_close(&self) -> bool {
        self.notify_on_close
    }

    pub fn enable_night_alerts(&self) -> bool {
        self.enable_night_alerts
    }

    pub fn enable_long_open_alerts(&self) -> bool {
        self.enable_long_open_alerts
    }

    pub fn enable_partial_alerts(&self) -> bool {
        self.enable_partial_alerts
    }

    pub fn suspicious_hours_start(&self) -> u32 {
        self.suspicious_hours_start
    }

    pub fn suspicious_hours_end(&self) -> u32 {
        self.suspicious_hours_end
    }

    pub fn long_open_threshold_secs(&self) -> u64 {
        self.long_open_threshold_secs
    }

    pub fn partial_position_threshold_secs(&self) -> u64 {
        self.partial_position_threshold_secs
    }

    pub fn ntfy_server(&self) -> &str {
        &self.ntfy_server
    }

    pub fn ntfy_topic(&self) -> &str {
        &self.ntfy_topic
    }

    pub fn ntfy_token(&self) -> Option<&str> {
        self.ntfy_token.as_deref()
    }

    pub fn ntfy_username(&self) -> Option<&str> {
        self.ntfy_username.as_deref()
    }

    pub fn ntfy_password(&self) -> Option<&str> {
        self.ntfy_password.as_deref()
    }

    pub fn ntfy_timeout_ms(&self) -> u64 {
        self.ntfy_timeout_ms
    }

    pub fn min_notification_interval_secs(&self) -> u64 {
        self.min_notification_interval_secs
    }

    pub fn min_interval_overrides(&self) -> &HashMap<NotificationKind, u64> {
        &self.min_interval_overrides
    }

    pub fn log_directory(&self) -> Option<&str> {
        self.log_directory.as_deref()
    }

    pub fn log_file_prefix(&self) -> &str {
        &self.log_file_prefix
    }

    pub fn log_json(&self) -> bool {
        self.log_json
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the failure thresholds
    #[cfg(test)]
    pub fn with_failure_thresholds(mut self, alert: u32, exit: u32) -> Self {
        self.failure_alert_threshold = alert;
        self.failure_exit_threshold = exit;
        self
    }

    /// Builder method for tests to set the poll cadence
    #[cfg(test)]
    pub fn with_check_interval_ms(mut self, ms: u64) -> Self {
        self.check_interval_ms = ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source(), SourceKind::Serial);
        assert_eq!(config.check_interval_ms(), 2000);
        assert_eq!(config.debounce_ms(), 1000);
        assert_eq!(config.suspicious_hours_start(), 22);
        assert_eq!(config.suspicious_hours_end(), 6);
        assert_eq!(config.long_open_threshold_secs(), 600);
        assert_eq!(config.partial_position_threshold_secs(), 30);
        assert_eq!(config.min_notification_interval_secs(), 300);
        assert!(config.sensor_triggered_level());
        assert_eq!(config.config_file(), "default");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_config_path_from_arg() {
        assert_eq!(Config::resolve_config_path(Some("config/attic.toml")), "config/attic.toml");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
[alerts]
long_open_threshold_secs = 900
"#,
            "inline",
        )
        .unwrap();
        assert_eq!(config.long_open_threshold_secs(), 900);
        assert_eq!(config.partial_position_threshold_secs(), 30);
        assert_eq!(config.ntfy_server(), "https://ntfy.sh");
    }

    #[test]
    fn test_overrides_parse() {
        let config = Config::from_toml_str(
            r#"
[notifications.min_interval_overrides]
sensor_fault = 3600
door_opened = 0
"#,
            "inline",
        )
        .unwrap();
        assert_eq!(config.min_interval_overrides().get(&NotificationKind::SensorFault), Some(&3600));
        assert_eq!(config.min_interval_overrides().get(&NotificationKind::DoorOpened), Some(&0));
    }

    #[test]
    fn test_unknown_override_kind_rejected() {
        let result = Config::from_toml_str(
            "[notifications.min_interval_overrides]\nnot_a_kind = 5\n",
            "inline",
        );
        assert!(result.is_err());
    }

    fn invalid(toml: &str) -> String {
        let err = Config::from_toml_str(toml, "inline").unwrap_err();
        format!("{:#}", err)
    }

    #[test]
    fn test_hour_out_of_range() {
        assert!(invalid("[alerts]\nsuspicious_hours_start = 24\n").contains("0..=23"));
        assert!(invalid("[alerts]\nsuspicious_hours_end = 99\n").contains("0..=23"));
    }

    #[test]
    fn test_empty_window_rejected() {
        let msg = invalid("[alerts]\nsuspicious_hours_start = 5\nsuspicious_hours_end = 5\n");
        assert!(msg.contains("window is empty"));
    }

    #[test]
    fn test_zero_thresholds_rejected() {
        assert!(invalid("[alerts]\nlong_open_threshold_secs = 0\n").contains("long_open"));
        assert!(invalid("[alerts]\npartial_position_threshold_secs = 0\n").contains("partial"));
        assert!(invalid("[monitoring]\ncheck_interval_ms = 0\n").contains("check_interval"));
    }

    #[test]
    fn test_failure_thresholds_order() {
        let msg = invalid("[monitoring]\nfailure_alert_threshold = 5\nfailure_exit_threshold = 2\n");
        assert!(msg.contains("failure_exit_threshold"));
    }

    #[test]
    fn test_polarity_must_be_binary() {
        assert!(invalid("[sensor]\nsensor_triggered_state = 2\n").contains("0 or 1"));
        assert!(invalid("[gpio]\nopen_state = 3\n").contains("0 or 1"));
    }

    #[test]
    fn test_bad_server_rejected() {
        assert!(invalid("[notifications]\nserver = \"not a url\"\n").contains("not a URL"));
        assert!(invalid("[notifications]\nserver = \"ftp://example.com\"\n").contains("http"));
    }

    #[test]
    fn test_topic_rules() {
        assert!(invalid("[notifications]\ntopic = \"\"\n").contains("topic"));
        assert!(invalid("[notifications]\ntopic = \"a/b\"\n").contains("'/'"));
    }

    #[test]
    fn test_credentials_must_pair() {
        assert!(invalid("[notifications]\nusername = \"me\"\n").contains("together"));
    }

    #[test]
    fn test_gpio_source_checks() {
        let msg = invalid("[sensor]\nsource = \"gpio\"\n[gpio]\nsamples = 0\n");
        assert!(msg.contains("samples"));

        let msg = invalid(
            "[sensor]\nsource = \"gpio\"\n[gpio]\nopen_path = \"/x\"\nclosed_path = \"/x\"\n",
        );
        assert!(msg.contains("differ"));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = Config::from_toml_str("[alerts\n", "broken.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("broken.toml"));
    }
}
