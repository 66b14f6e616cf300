//! Alert system domain types
//!
//! Defines the immutable alert value, its dedup key, severities and patient filters.

use crate::domain::{PatientId, Reading, Timestamp};
use crate::error::AlertError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertSeverity {
    /// Informational, no action needed
    Info,
    /// Attention recommended
    Warning,
    /// Action required soon
    Critical,
    /// Immediate action required
    Emergency,
}

impl AlertSeverity {
    /// Default severity for an alert type tag
    pub fn for_alert_type(alert_type: &str) -> Self {
        match alert_type {
            "HypotensiveHypoxemia" | "ManualAlert" => Self::Emergency,
            "ECGAnomaly" | "RapidHeartRateChange" | "RapidSaturationDrop" => Self::Critical,
            t if t.starts_with("Critical") => Self::Critical,
            t if t.ends_with("Trend")
                || t.starts_with("High")
                || t.starts_with("Low")
                || t == "Tachycardia"
                || t == "Bradycardia" =>
            {
                Self::Warning
            }
            _ => Self::Info,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
            Self::Emergency => write!(f, "EMERGENCY"),
        }
    }
}

/// Identity of an alert occurrence
///
/// Description, triggering reading and severity are not part of
/// the key: two alerts agreeing on these three fields are the same occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlertKey {
    pub patient_id: PatientId,
    pub alert_type: String,
    pub generated_at: Timestamp,
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.patient_id, self.alert_type, self.generated_at
        )
    }
}

/// An alert raised by a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Patient the alert concerns
    pub patient_id: PatientId,
    /// Reading that caused the alert
    pub triggering_reading: Reading,
    /// Evaluation time (not the reading's timestamp)
    pub generated_at: Timestamp,
    /// Rule/condition tag, e.g. `CriticalHighSystolicPressure`
    pub alert_type: String,
    /// Human-readable text including the triggering values
    pub description: String,
    /// Alert severity
    pub severity: AlertSeverity,
}

impl Alert {
    /// Create an alert; severity follows the alert type
    pub fn new(
        patient_id: PatientId,
        triggering_reading: Reading,
        generated_at: Timestamp,
        alert_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let alert_type = alert_type.into();
        let severity = AlertSeverity::for_alert_type(&alert_type);

        Self {
            patient_id,
            triggering_reading,
            generated_at,
            alert_type,
            description: description.into(),
            severity,
        }
    }

    /// Override the severity
    pub fn with_severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Dedup key for this alert
    pub fn key(&self) -> AlertKey {
        AlertKey {
            patient_id: self.patient_id,
            alert_type: self.alert_type.clone(),
            generated_at: self.generated_at,
        }
    }

    /// Whether `other` is the same occurrence
    pub fn same_occurrence(&self, other: &Alert) -> bool {
        self.patient_id == other.patient_id
            && self.generated_at == other.generated_at
            && self.alert_type == other.alert_type
    }

    /// Reject alerts that cannot be keyed meaningfully
    pub fn validate(&self) -> Result<(), AlertError> {
        if self.patient_id == 0 {
            return Err(AlertError::InvalidArgument(
                "alert patient id must be positive".to_string(),
            ));
        }
        if self.alert_type.trim().is_empty() {
            return Err(AlertError::InvalidArgument(
                "alert type cannot be empty".to_string(),
            ));
        }
        if self.generated_at == 0 {
            return Err(AlertError::InvalidArgument(
                "alert generation time must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] patient {} {}: {}",
            self.severity, self.patient_id, self.alert_type, self.description
        )
    }
}

/// Patient filter for listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PatientFilter {
    /// Every patient
    #[default]
    All,
    /// A single patient
    Id(PatientId),
    /// A set of patients (e.g. a caregiver's assignment)
    Ids(Vec<PatientId>),
}

impl PatientFilter {
    /// Check if this filter matches a patient
    pub fn matches(&self, patient_id: PatientId) -> bool {
        match self {
            Self::All => true,
            Self::Id(id) => *id == patient_id,
            Self::Ids(ids) => ids.contains(&patient_id),
        }
    }
}
