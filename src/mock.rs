//! Mock implementations for testing
//!
//! Provides recording and failing listeners plus reading/alert builders.

use crate::alerts::{Alert, AlertListener};
use crate::domain::{PatientId, Reading, Timestamp, VitalType};
use crate::error::ListenerError;

use std::sync::Mutex;

/// Listener that keeps every alert it receives
#[derive(Debug, Default)]
pub struct RecordingListener {
    received: Mutex<Vec<Alert>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of alerts received
    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    /// Copy of the received alerts
    pub fn alerts(&self) -> Vec<Alert> {
        self.received.lock().unwrap().clone()
    }

    /// Alert types received, in delivery order
    pub fn alert_types(&self) -> Vec<String> {
        self.alerts().into_iter().map(|a| a.alert_type).collect()
    }
}

impl AlertListener for RecordingListener {
    fn on_alert(&self, alert: &Alert) -> Result<(), ListenerError> {
        self.received.lock().unwrap().push(alert.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Listener that always returns an error
pub struct FailingListener;

impl AlertListener for FailingListener {
    fn on_alert(&self, _alert: &Alert) -> Result<(), ListenerError> {
        Err(ListenerError::new("failing", "simulated failure"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Listener that panics
pub struct PanickingListener;

impl AlertListener for PanickingListener {
    fn on_alert(&self, _alert: &Alert) -> Result<(), ListenerError> {
        panic!("simulated listener panic");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Build a reading for patient 1
pub fn reading(vital_type: VitalType, value: f64, timestamp: Timestamp) -> Reading {
    Reading::new(1, vital_type, value, timestamp)
}

/// Build a minimal alert with the given key fields
pub fn alert(patient_id: PatientId, alert_type: &str, generated_at: Timestamp) -> Alert {
    Alert::new(
        patient_id,
        Reading::new(patient_id.max(1), VitalType::SystolicPressure, 120.0, 1000),
        generated_at,
        alert_type,
        format!("{} for patient {}", alert_type, patient_id),
    )
}
