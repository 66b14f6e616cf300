//! Caller-driven repeat reminders
//!
//! A [`RepeatScheduler`] is registered on the bus like any other listener.
//! It remembers accepted alerts at or above a minimum severity and, each time
//! the owner calls [`RepeatScheduler::tick`], returns the reminders that have
//! come due. Nothing runs in the background; the owner supplies the time.

use super::bus::AlertListener;
use super::types::{Alert, AlertKey, AlertSeverity};
use crate::domain::{Timestamp, MINUTE_MS};
use crate::error::ListenerError;
use crate::sync::lock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Repeat schedule settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatConfig {
    /// Time between reminders in milliseconds
    pub interval_ms: u64,
    /// Stop after this many reminders; unlimited when absent
    pub max_repeats: Option<u32>,
    /// Alerts below this severity are not repeated
    pub min_severity: AlertSeverity,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5 * MINUTE_MS,
            max_repeats: Some(3),
            min_severity: AlertSeverity::Critical,
        }
    }
}

/// A due repetition of an earlier alert
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub alert: Alert,
    /// 1 for the first reminder
    pub repeat: u32,
}

#[derive(Debug)]
struct Tracked {
    alert: Alert,
    next_due: Timestamp,
    sent: u32,
}

/// Listener that schedules reminders for serious alerts
#[derive(Debug)]
pub struct RepeatScheduler {
    config: RepeatConfig,
    tracked: Mutex<BTreeMap<AlertKey, Tracked>>,
}

impl RepeatScheduler {
    pub fn new(config: RepeatConfig) -> Self {
        Self {
            config,
            tracked: Mutex::new(BTreeMap::new()),
        }
    }

    /// Reminders due at `now`, in key order
    ///
    /// Each tracked alert yields at most one reminder per tick; the next one
    /// is scheduled one interval after `now`.
    pub fn tick(&self, now: Timestamp) -> Vec<Reminder> {
        let mut tracked = lock(&self.tracked);
        let mut due = Vec::new();

        tracked.retain(|_, entry| {
            if entry.next_due > now {
                return true;
            }
            entry.sent += 1;
            entry.next_due = now.saturating_add(self.config.interval_ms);
            due.push(Reminder {
                alert: entry.alert.clone(),
                repeat: entry.sent,
            });
            self.config
                .max_repeats
                .map_or(true, |max| entry.sent < max)
        });

        if !due.is_empty() {
            log::debug!("{} reminder(s) due at {}", due.len(), now);
        }
        due
    }

    /// Stop repeating one alert
    pub fn stop(&self, key: &AlertKey) -> bool {
        lock(&self.tracked).remove(key).is_some()
    }

    /// Stop repeating everything
    pub fn stop_all(&self) {
        lock(&self.tracked).clear();
    }

    /// Number of alerts still being repeated
    pub fn active(&self) -> usize {
        lock(&self.tracked).len()
    }
}

impl Default for RepeatScheduler {
    fn default() -> Self {
        Self::new(RepeatConfig::default())
    }
}

impl AlertListener for RepeatScheduler {
    fn on_alert(&self, alert: &Alert) -> Result<(), ListenerError> {
        if alert.severity < self.config.min_severity {
            return Ok(());
        }
        if self.config.max_repeats == Some(0) {
            return Ok(());
        }

        lock(&self.tracked).entry(alert.key()).or_insert_with(|| Tracked {
            alert: alert.clone(),
            next_due: alert.generated_at.saturating_add(self.config.interval_ms),
            sent: 0,
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "repeat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::alert;

    fn scheduler(max_repeats: Option<u32>) -> RepeatScheduler {
        RepeatScheduler::new(RepeatConfig {
            interval_ms: 1000,
            max_repeats,
            min_severity: AlertSeverity::Critical,
        })
    }

    #[test]
    fn test_reminders_follow_interval() {
        let scheduler = scheduler(None);
        scheduler
            .on_alert(&alert(1, "CriticalTachycardia", 10_000))
            .unwrap();

        assert!(scheduler.tick(10_500).is_empty());

        let due = scheduler.tick(11_000);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].repeat, 1);
        assert_eq!(due[0].alert.alert_type, "CriticalTachycardia");

        assert!(scheduler.tick(11_500).is_empty());
        assert_eq!(scheduler.tick(12_000)[0].repeat, 2);
    }

    #[test]
    fn test_max_repeats() {
        let scheduler = scheduler(Some(2));
        scheduler.on_alert(&alert(1, "ECGAnomaly", 1000)).unwrap();

        assert_eq!(scheduler.tick(2000).len(), 1);
        assert_eq!(scheduler.tick(3000).len(), 1);
        assert!(scheduler.tick(4000).is_empty());
        assert_eq!(scheduler.active(), 0);
    }

    #[test]
    fn test_low_severity_not_tracked() {
        let scheduler = scheduler(None);
        scheduler.on_alert(&alert(1, "Tachycardia", 1000)).unwrap();
        assert_eq!(scheduler.active(), 0);
        assert!(scheduler.tick(100_000).is_empty());
    }

    #[test]
    fn test_stop() {
        let scheduler = scheduler(None);
        let a = alert(1, "ManualAlert", 1000);
        scheduler.on_alert(&a).unwrap();
        scheduler.on_alert(&alert(2, "ManualAlert", 1000)).unwrap();

        assert!(scheduler.stop(&a.key()));
        assert!(!scheduler.stop(&a.key()));

        let due = scheduler.tick(5000);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].alert.patient_id, 2);

        scheduler.stop_all();
        assert_eq!(scheduler.active(), 0);
    }

    #[test]
    fn test_same_alert_tracked_once() {
        let scheduler = scheduler(None);
        scheduler.on_alert(&alert(1, "ManualAlert", 1000)).unwrap();
        scheduler.on_alert(&alert(1, "ManualAlert", 1000)).unwrap();
        assert_eq!(scheduler.active(), 1);
    }
}
