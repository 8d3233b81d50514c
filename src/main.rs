//! Garage door monitor
//!
//! Polls door position sensors, infers the door state and pushes alerts to an
//! ntfy topic (opened, closed, open too long, stuck half way, opened at night).
//!
//! Module structure:
//! - `domain/` - Door states, readings, notification intents
//! - `io/` - Sensor sources (serial, GPIO) and the ntfy notifier
//! - `services/` - State machine, policies, throttle, poll loop
//! - `infra/` - Config, clock, logging, metrics

use clap::Parser;
use garage_monitor::domain::{NotificationIntent, Notification, Priority};
use garage_monitor::infra::{logging, Config, Metrics, SourceKind, SystemClock};
use garage_monitor::io::{
    Debouncer, GpioSensor, Notifier, NtfyNotifier, SensorError, SensorSource, SerialSensor,
};
use garage_monitor::services::Monitor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Garage door monitor - door sensor alerts over ntfy
#[derive(Parser, Debug)]
#[command(name = "garage-monitor", version, about)]
struct Args {
    /// Path to TOML configuration file (default: $CONFIG_FILE or config/garage.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Load and validate the configuration, then exit
    #[arg(long)]
    check_config: bool,

    /// Send one test notification, then exit
    #[arg(long)]
    test_notification: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments using clap
    let args = Args::parse();

    // Load configuration from TOML file; logging setup depends on it
    let config_path = Config::resolve_config_path(args.config.as_deref());
    let config = Config::load(&config_path)?;

    let log_guard = logging::init(&config)?;

    info!(version = env!("CARGO_PKG_VERSION"), git_hash = env!("GIT_HASH"), "garage-monitor starting");
    info!(
        config_file = %config.config_file(),
        source = %config.source().as_str(),
        check_interval_ms = %config.check_interval_ms(),
        debounce_ms = %config.debounce_ms(),
        suspicious_hours = %format!("{}-{}", config.suspicious_hours_start(), config.suspicious_hours_end()),
        long_open_threshold_secs = %config.long_open_threshold_secs(),
        partial_position_threshold_secs = %config.partial_position_threshold_secs(),
        min_notification_interval_secs = %config.min_notification_interval_secs(),
        ntfy_server = %config.ntfy_server(),
        ntfy_topic = %config.ntfy_topic(),
        "config_loaded"
    );

    if args.check_config {
        info!("config_ok");
        return Ok(());
    }

    let notifier = Arc::new(NtfyNotifier::new(&config)?);

    if args.test_notification {
        let test = Notification::new(
            "Garage monitor test",
            format!("Test notification from garage-monitor (topic {})", config.ntfy_topic()),
            Priority::Low,
        )
        .with_tags(&["test_tube"]);
        notifier.send(&test).await?;
        info!("test_notification_sent");
        return Ok(());
    }

    let sensor = match open_sensor(&config).await {
        Ok(sensor) => sensor,
        Err(e) => {
            error!(error = %e, source = %config.source().as_str(), "sensor_open_failed");
            let intent = NotificationIntent::MonitorError {
                error: format!("sensor could not be opened: {}", e),
            };
            if let Err(send_err) = notifier.send(&intent.to_notification()).await {
                error!(error = %send_err, "notification_failed");
            }
            drop(log_guard);
            std::process::exit(1);
        }
    };

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    // Start metrics reporter (0 disables)
    let metrics = Arc::new(Metrics::new());
    let stats_interval = config.stats_interval_secs();
    if stats_interval > 0 {
        let metrics_clone = metrics.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(stats_interval));
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                metrics_clone.report().log();
            }
        });
    }

    let mut monitor = Monitor::new(&config, sensor, notifier, SystemClock, metrics.clone());

    match monitor.run(shutdown_rx).await {
        Ok(()) => {
            metrics.report().log();
            info!("garage-monitor shutdown complete");
            Ok(())
        }
        Err(e) => {
            metrics.report().log();
            error!(error = %format!("{:#}", e), "garage-monitor stopped");
            drop(log_guard);
            std::process::exit(1);
        }
    }
}

/// Build the configured sampler behind the debounce filter
async fn open_sensor(config: &Config) -> Result<Box<dyn SensorSource>, SensorError> {
    let debounce = Duration::from_millis(config.debounce_ms());
    match config.source() {
        SourceKind::Serial => {
            let serial = SerialSensor::open(config).await?;
            Ok(Box::new(Debouncer::new(serial, debounce)))
        }
        SourceKind::Gpio => {
            let gpio = GpioSensor::new(config);
            gpio.probe().await?;
            Ok(Box::new(Debouncer::new(gpio, debounce)))
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
