//! Monitor - the poll loop
//!
//! Each tick reads the sensor once, advances the door state machine, evaluates
//! the policies and delivers every intent the throttle lets through, in order.
//! Read failures skip the tick; a run of them raises `SensorFault` and, if it
//! keeps going, ends the loop with an error after reporting `MonitorError`.

use crate::domain::intent::{NotificationIntent, NotificationKind};
use crate::domain::types::Reading;
use crate::infra::clock::Clock;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::notifier::Notifier;
use crate::io::sensor::{SensorError, SensorSource};
use crate::services::door_machine::DoorStateMachine;
use crate::services::policy::{PolicyConfig, PolicyEvaluator};
use crate::services::throttle::NotificationThrottle;
use anyhow::anyhow;
use chrono::{DateTime, Duration, Local};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

pub struct Monitor<S, N, C> {
    sensor: S,
    notifier: N,
    clock: C,
    machine: DoorStateMachine,
    policy: PolicyEvaluator,
    throttle: NotificationThrottle,
    metrics: Arc<Metrics>,
    check_interval: std::time::Duration,
    failure_alert_threshold: u32,
    failure_exit_threshold: u32,
    consecutive_failures: u32,
}

impl<S: SensorSource, N: Notifier, C: Clock> Monitor<S, N, C> {
    pub fn new(config: &Config, sensor: S, notifier: N, clock: C, metrics: Arc<Metrics>) -> Self {
        let mode = sensor.mode();

        let mut throttle = NotificationThrottle::new(Duration::seconds(
            config.min_notification_interval_secs() as i64,
        ));
        for (kind, secs) in config.min_interval_overrides() {
            throttle = throttle.with_override(*kind, Duration::seconds(*secs as i64));
        }

        Self {
            sensor,
            notifier,
            clock,
            machine: DoorStateMachine::new(mode),
            policy: PolicyEvaluator::new(PolicyConfig::from_config(config), mode),
            throttle,
            metrics,
            check_interval: std::time::Duration::from_millis(config.check_interval_ms()),
            failure_alert_threshold: config.failure_alert_threshold(),
            failure_exit_threshold: config.failure_exit_threshold(),
            consecutive_failures: 0,
        }
    }

    pub fn machine(&self) -> &DoorStateMachine {
        &self.machine
    }

    pub fn throttle(&self) -> &NotificationThrottle {
        &self.throttle
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Advance the machine with one reading and collect the resulting intents
    pub fn process_reading(
        &mut self,
        reading: Reading,
        now: DateTime<Local>,
    ) -> Result<Vec<NotificationIntent>, SensorError> {
        let transition = self.machine.advance(reading, now)?;
        if transition.is_some() {
            self.metrics.record_transition();
        }
        let Some(record) = self.machine.record() else {
            return Ok(Vec::new());
        };
        let record = *record;
        Ok(self.policy.evaluate(transition.as_ref(), &record, now))
    }

    /// Deliver intents in order; only successful sends touch the throttle
    pub async fn dispatch(&mut self, intents: Vec<NotificationIntent>, now: DateTime<Local>) {
        for intent in intents {
            let kind = intent.kind();
            if kind != NotificationKind::MonitorError && !self.throttle.should_send(kind, now) {
                self.metrics.record_notification_throttled();
                continue;
            }

            let notification = intent.to_notification();
            match self.notifier.send(&notification).await {
                Ok(()) => {
                    self.throttle.record_sent(kind, now);
                    self.metrics.record_notification_sent();
                    info!(kind = %kind, priority = %notification.priority.as_str(), "notification_sent");
                }
                Err(e) => {
                    self.metrics.record_notification_failed();
                    error!(kind = %kind, error = %e, "notification_failed");
                }
            }
        }
    }

    /// One poll: read, advance, evaluate, deliver
    ///
    /// Returns an error once the sensor has failed `failure_exit_threshold`
    /// times in a row.
    pub async fn tick(&mut self) -> anyhow::Result<()> {
        self.metrics.record_tick();
        let read = self.sensor.read().await;
        let now = self.clock.now();

        let result = read.and_then(|reading| self.process_reading(reading, now));
        match result {
            Ok(intents) => {
                if self.consecutive_failures > 0 {
                    info!(after_failures = %self.consecutive_failures, "sensor_recovered");
                    self.consecutive_failures = 0;
                }
                self.dispatch(intents, now).await;
                Ok(())
            }
            Err(e) => self.on_read_failure(e, now).await,
        }
    }

    async fn on_read_failure(&mut self, e: SensorError, now: DateTime<Local>) -> anyhow::Result<()> {
        self.consecutive_failures += 1;
        self.metrics.record_read_failure();
        warn!(
            error = %e,
            consecutive_failures = %self.consecutive_failures,
            "sensor_read_failed"
        );

        if self.consecutive_failures >= self.failure_exit_threshold {
            return Err(anyhow!(
                "sensor unreadable for {} consecutive reads: {}",
                self.consecutive_failures,
                e
            ));
        }

        if self.consecutive_failures == self.failure_alert_threshold {
            let intent = NotificationIntent::SensorFault {
                consecutive_failures: self.consecutive_failures,
                error: e.to_string(),
            };
            self.dispatch(vec![intent], now).await;
        }
        Ok(())
    }

    /// Best-effort `MonitorError` delivery before the process gives up
    pub async fn report_fatal(&mut self, error: &anyhow::Error) {
        let now = self.clock.now();
        let intent = NotificationIntent::MonitorError { error: format!("{:#}", error) };
        self.dispatch(vec![intent], now).await;
    }

    /// Poll until shutdown is signalled or the sensor is declared dead
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        info!(
            mode = %self.machine.mode().as_str(),
            check_interval_ms = %self.check_interval.as_millis(),
            failure_alert_threshold = %self.failure_alert_threshold,
            failure_exit_threshold = %self.failure_exit_threshold,
            "monitor_started"
        );

        let mut poll = interval(self.check_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => {
                    info!("monitor_shutdown");
                    return Ok(());
                }
                _ = poll.tick() => {}
            }

            // A pending read is dropped on shutdown
            let result = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => {
                    info!("monitor_shutdown");
                    return Ok(());
                }
                result = self.tick() => result,
            };

            if let Err(e) = result {
                error!(error = %e, "monitor_fatal");
                self.report_fatal(&e).await;
                return Err(e);
            }
        }
    }
}

/// Resolves once the flag is true or the sender is gone
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{DoorState, Priority, SensorMode};
    use crate::infra::clock::ManualClock;
    use crate::io::notifier::RecordingNotifier;
    use crate::io::sensor::ScriptedSensor;
    use chrono::TimeZone;

    type TestMonitor = Monitor<ScriptedSensor, RecordingNotifier, ManualClock>;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 10, h, m, 0).unwrap()
    }

    fn dual(open: bool, closed: bool) -> Reading {
        Reading::Dual { open, closed }
    }

    fn monitor(config: &Config, start: DateTime<Local>) -> (TestMonitor, RecordingNotifier, ManualClock) {
        let notifier = RecordingNotifier::new();
        let clock = ManualClock::new(start);
        let m = Monitor::new(
            config,
            ScriptedSensor::new(SensorMode::Dual),
            notifier.clone(),
            clock.clone(),
            Arc::new(Metrics::new()),
        );
        (m, notifier, clock)
    }

    #[tokio::test]
    async fn test_first_tick_only_announces_start() {
        let (mut m, notifier, _clock) = monitor(&Config::default(), at(12, 0));
        m.sensor_mut().push(dual(true, false));

        m.tick().await.unwrap();
        assert_eq!(notifier.titles(), vec!["Garage monitor started"]);
        assert_eq!(m.machine().record().unwrap().current_state, DoorState::Open);
    }

    #[tokio::test]
    async fn test_open_then_close_cycle() {
        let (mut m, notifier, clock) = monitor(&Config::default(), at(12, 0));
        m.sensor_mut().push(dual(false, true)).push(dual(true, false)).push(dual(false, true));

        m.tick().await.unwrap();
        clock.advance(Duration::seconds(2));
        m.tick().await.unwrap();
        clock.advance(Duration::seconds(245));
        m.tick().await.unwrap();

        assert_eq!(
            notifier.titles(),
            vec!["Garage monitor started", "Garage door opened", "Garage door closed"]
        );
        let closed = &notifier.sent()[2];
        assert!(closed.message.contains("was open 4m 5s"), "{}", closed.message);
    }

    async fn drive(m: &mut TestMonitor, clock: &ManualClock, steps: &[(i64, Reading)]) -> String {
        for (advance, reading) in steps {
            clock.advance(Duration::seconds(*advance));
            m.sensor_mut().push(*reading);
            m.tick().await.unwrap();
        }
        m.machine().record().map(|r| r.current_state.to_string()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_close_through_partial_reports_full_open_time() {
        let (mut m, notifier, clock) = monitor(&Config::default(), at(12, 0));
        let steps = [
            (0, dual(false, true)),
            (2, dual(true, false)),
            (300, dual(false, false)),
            (12, dual(false, true)),
        ];
        assert_eq!(drive(&mut m, &clock, &steps).await, "closed");

        let last = notifier.sent().pop().unwrap();
        assert_eq!(last.title, "Garage door closed");
        assert!(last.message.contains("was open 5m 12s"), "{}", last.message);
    }

    #[tokio::test]
    async fn test_close_after_unknown_reports_full_open_time() {
        let (mut m, notifier, clock) = monitor(&Config::default(), at(12, 0));
        let steps = [
            (0, dual(false, true)),
            (2, dual(true, false)),
            (60, dual(true, true)),
            (5, dual(false, true)),
        ];
        assert_eq!(drive(&mut m, &clock, &steps).await, "closed");

        assert!(notifier.titles().contains(&"Garage door state unknown".to_string()));
        let last = notifier.sent().pop().unwrap();
        assert_eq!(last.title, "Garage door closed");
        assert!(last.message.contains("was open 1m 5s"), "{}", last.message);
    }

    #[tokio::test]
    async fn test_night_opening_is_suspicious() {
        let (mut m, notifier, clock) = monitor(&Config::default(), at(22, 58));
        m.sensor_mut().push(dual(false, true)).push(dual(true, false));

        m.tick().await.unwrap();
        clock.set(at(23, 0));
        m.tick().await.unwrap();

        assert_eq!(notifier.titles(), vec!["Garage monitor started", "Suspicious garage activity"]);
    }

    #[tokio::test]
    async fn test_repeat_opening_is_throttled() {
        let (mut m, notifier, clock) = monitor(&Config::default(), at(12, 0));
        m.sensor_mut()
            .push(dual(false, true))
            .push(dual(true, false))
            .push(dual(false, true))
            .push(dual(true, false));

        for _ in 0..4 {
            m.tick().await.unwrap();
            clock.advance(Duration::seconds(10));
        }

        let opened = notifier.titles().iter().filter(|t| *t == "Garage door opened").count();
        assert_eq!(opened, 1);
        assert_eq!(m.throttle().last_sent(NotificationKind::DoorOpened), Some(at(12, 0) + Duration::seconds(10)));
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_throttle() {
        let (mut m, notifier, clock) = monitor(&Config::default(), at(12, 0));
        m.sensor_mut()
            .push(dual(false, true))
            .push(dual(true, false))
            .push(dual(false, true))
            .push(dual(true, false));

        m.tick().await.unwrap();
        notifier.set_failing(true);
        clock.advance(Duration::seconds(5));
        m.tick().await.unwrap();
        assert_eq!(m.throttle().last_sent(NotificationKind::DoorOpened), None);

        notifier.set_failing(false);
        clock.advance(Duration::seconds(5));
        m.tick().await.unwrap();
        clock.advance(Duration::seconds(5));
        m.tick().await.unwrap();

        assert_eq!(notifier.titles().last().map(String::as_str), Some("Garage door opened"));
    }

    #[tokio::test]
    async fn test_sensor_fault_after_three_failures() {
        let (mut m, notifier, _clock) = monitor(&Config::default(), at(12, 0));
        m.sensor_mut()
            .push(dual(false, true))
            .push_err(SensorError::Malformed("x".into()))
            .push_err(SensorError::Disconnected)
            .push_err(SensorError::Disconnected)
            .push_err(SensorError::Disconnected)
            .push(dual(false, true));

        for _ in 0..5 {
            m.tick().await.unwrap();
        }
        let faults = notifier.titles().iter().filter(|t| *t == "Garage sensor fault").count();
        assert_eq!(faults, 1);
        assert_eq!(m.consecutive_failures(), 4);

        m.tick().await.unwrap();
        assert_eq!(m.consecutive_failures(), 0);
        assert_eq!(m.machine().record().unwrap().current_state, DoorState::Closed);
    }

    #[tokio::test]
    async fn test_good_read_resets_failure_count() {
        let (mut m, notifier, _clock) = monitor(&Config::default(), at(12, 0));
        m.sensor_mut()
            .push_err(SensorError::Disconnected)
            .push_err(SensorError::Disconnected)
            .push(dual(false, true))
            .push_err(SensorError::Disconnected)
            .push_err(SensorError::Disconnected);

        for _ in 0..5 {
            m.tick().await.unwrap();
        }
        assert_eq!(m.consecutive_failures(), 2);
        assert!(!notifier.titles().iter().any(|t| t == "Garage sensor fault"));
    }

    #[tokio::test]
    async fn test_shape_mismatch_counts_as_failure() {
        let (mut m, _notifier, _clock) = monitor(&Config::default(), at(12, 0));
        m.sensor_mut().push(Reading::Single(true));

        m.tick().await.unwrap();
        assert_eq!(m.consecutive_failures(), 1);
        assert!(m.machine().record().is_none());
    }

    #[tokio::test]
    async fn test_run_exits_after_failure_threshold() {
        let config = Config::default().with_failure_thresholds(2, 3).with_check_interval_ms(1);
        let (mut m, notifier, _clock) = monitor(&config, at(12, 0));
        let (_tx, rx) = watch::channel(false);

        // Empty script reads as Disconnected every tick
        let result = m.run(rx).await;
        assert!(result.is_err());
        assert_eq!(notifier.titles(), vec!["Garage sensor fault", "Garage monitor error"]);
        assert_eq!(notifier.sent()[1].priority, Priority::Urgent);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (mut m, notifier, _clock) = monitor(&Config::default(), at(12, 0));
        m.sensor_mut().push(dual(false, true));
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        assert!(m.run(rx).await.is_ok());
        assert!(notifier.sent().is_empty());
        assert_eq!(m.sensor_mut().remaining(), 1);
    }

    #[tokio::test]
    async fn test_monitor_error_bypasses_throttle() {
        let (mut m, notifier, _clock) = monitor(&Config::default(), at(12, 0));
        let err = anyhow!("boom");
        m.report_fatal(&err).await;
        m.report_fatal(&err).await;
        assert_eq!(notifier.sent().len(), 2);
    }
}
