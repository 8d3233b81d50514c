//! Tracing subscriber setup
//!
//! Stdout always gets human-readable lines (RFC 3339 UTC, no target). With
//! `[logging].directory` set, a daily-rolled file is written too, through a
//! non-blocking writer whose guard must live as long as the process.

use crate::infra::config::Config;
use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Filter from `RUST_LOG`, default `info`
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Stdout-only logging for tools that have no config
pub fn init_stdout() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();
}

/// Install the global subscriber described by `[logging]`
pub fn init(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match config.log_directory() {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir))?;
            let appender = tracing_appender::rolling::daily(dir, config.log_file_prefix());
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer: Box<dyn Layer<Registry> + Send + Sync> = if config.log_json() {
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_timer(UtcTime::rfc_3339())
                    .with_target(false)
                    .boxed()
            } else {
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_timer(UtcTime::rfc_3339())
                    .with_target(false)
                    .boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = fmt::layer().with_timer(UtcTime::rfc_3339()).with_target(false);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(env_filter())
        .with(stdout_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
