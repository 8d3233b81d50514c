//! Integration tests for configuration loading

use garage_monitor::domain::NotificationKind;
use garage_monitor::infra::{Config, SourceKind};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[sensor]
source = "gpio"
sensor_triggered_state = 0

[gpio]
open_path = "/sys/class/gpio/gpio17/value"
closed_path = "/sys/class/gpio/gpio27/value"
samples = 5

[monitoring]
check_interval_ms = 500
debounce_ms = 250

[alerts]
suspicious_hours_start = 23
suspicious_hours_end = 5
notify_on_open = false

[notifications]
server = "http://ntfy.lan:8080"
topic = "garage-test"
token = "tk_abc"
min_interval_secs = 60

[notifications.min_interval_overrides]
door_stuck = 120
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.source(), SourceKind::Gpio);
    assert!(!config.sensor_triggered_level());
    assert_eq!(config.gpio_closed_path(), Some("/sys/class/gpio/gpio27/value"));
    assert_eq!(config.gpio_samples(), 5);
    assert_eq!(config.check_interval_ms(), 500);
    assert_eq!(config.debounce_ms(), 250);
    assert_eq!(config.suspicious_hours_start(), 23);
    assert_eq!(config.suspicious_hours_end(), 5);
    assert!(!config.notify_on_open());
    assert!(config.notify_on_close());
    assert_eq!(config.ntfy_server(), "http://ntfy.lan:8080");
    assert_eq!(config.ntfy_token(), Some("tk_abc"));
    assert_eq!(config.min_notification_interval_secs(), 60);
    assert_eq!(config.min_interval_overrides().get(&NotificationKind::DoorStuck), Some(&120));
    assert_eq!(config.config_file(), temp_file.path().display().to_string());
}

#[test]
fn test_load_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let config = Config::load(missing.to_str().unwrap()).unwrap();
    assert_eq!(config.config_file(), "default");
    assert_eq!(config.long_open_threshold_secs(), 600);
}

#[test]
fn test_load_invalid_file_fails() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[alerts]\nsuspicious_hours_start = 25\n").unwrap();
    temp_file.flush().unwrap();

    let err = Config::load(temp_file.path().to_str().unwrap()).unwrap_err();
    assert!(format!("{:#}", err).contains("suspicious_hours_start"));
}

#[test]
fn test_load_unparseable_file_fails() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[monitoring]\ncheck_interval_ms = \"fast\"\n").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::load(temp_file.path().to_str().unwrap()).is_err());
}

#[test]
fn test_shipped_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/garage.toml");
    let config = Config::from_file(path).unwrap();
    assert_eq!(config.source(), SourceKind::Serial);
    assert_eq!(config.min_interval_overrides().get(&NotificationKind::SensorFault), Some(&3600));
}
