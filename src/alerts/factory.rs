//! Graded alert construction from a single reading
//!
//! Unlike the threshold rule, the factories grade blood pressure into
//! critical and non-critical bands. They are used by callers that classify
//! one value at a time (`vitalwatch classify`). The ECG factory has no
//! history of its own and is handed the preceding values as a baseline.

use super::types::Alert;
use crate::domain::{PatientId, Reading, Timestamp, VitalType};
use crate::error::AlertError;
use crate::rules::EcgAnomalyConfig;

const CRITICAL_HIGH_SYSTOLIC: f64 = 180.0;
const HIGH_SYSTOLIC: f64 = 140.0;
const LOW_SYSTOLIC: f64 = 90.0;
const CRITICAL_LOW_SYSTOLIC: f64 = 80.0;

const CRITICAL_HIGH_DIASTOLIC: f64 = 120.0;
const HIGH_DIASTOLIC: f64 = 90.0;
const LOW_DIASTOLIC: f64 = 60.0;
const CRITICAL_LOW_DIASTOLIC: f64 = 50.0;

const LOW_SATURATION: f64 = 92.0;

/// Alert factory family
#[derive(Debug, Clone, PartialEq)]
pub enum AlertFactory {
    /// Systolic and diastolic pressure
    BloodPressure,
    /// Oxygen saturation
    BloodOxygen,
    /// ECG amplitude against a baseline of preceding values
    Ecg(EcgAnomalyConfig),
}

impl AlertFactory {
    /// Factory responsible for a vital type
    pub fn for_vital(vital_type: VitalType) -> Result<Self, AlertError> {
        match vital_type {
            VitalType::SystolicPressure | VitalType::DiastolicPressure => Ok(Self::BloodPressure),
            VitalType::BloodSaturation => Ok(Self::BloodOxygen),
            VitalType::Ecg => Ok(Self::Ecg(EcgAnomalyConfig::default())),
            other => Err(AlertError::InvalidArgument(format!(
                "no alert factory for vital type {}",
                other
            ))),
        }
    }

    /// Use `config` for ECG grading; other factories are unchanged
    pub fn with_ecg_config(self, config: &EcgAnomalyConfig) -> Self {
        match self {
            Self::Ecg(_) => Self::Ecg(config.clone()),
            other => other,
        }
    }

    /// Whether this factory handles `vital_type`
    pub fn accepts(&self, vital_type: VitalType) -> bool {
        match self {
            Self::BloodPressure => vital_type.is_blood_pressure(),
            Self::BloodOxygen => vital_type == VitalType::BloodSaturation,
            Self::Ecg(_) => vital_type == VitalType::Ecg,
        }
    }

    /// Grade `reading`; `Ok(None)` for values in the normal band
    ///
    /// The ECG factory never fires without a baseline; use
    /// [`create_alert_with_baseline`](Self::create_alert_with_baseline).
    pub fn create_alert(
        &self,
        patient_id: PatientId,
        reading: &Reading,
        generated_at: Timestamp,
    ) -> Result<Option<Alert>, AlertError> {
        self.create_alert_with_baseline(patient_id, reading, &[], generated_at)
    }

    /// Grade `reading`, giving the ECG factory the values that preceded it
    ///
    /// Only the last `window_size` baseline values are used; a shorter
    /// baseline is not enough to judge and yields `Ok(None)`. Other factories
    /// ignore the baseline.
    pub fn create_alert_with_baseline(
        &self,
        patient_id: PatientId,
        reading: &Reading,
        baseline: &[f64],
        generated_at: Timestamp,
    ) -> Result<Option<Alert>, AlertError> {
        if !self.accepts(reading.vital_type) {
            return Err(AlertError::InvalidArgument(format!(
                "invalid vital type for {:?} alert: {}",
                self, reading.vital_type
            )));
        }
        if generated_at == 0 {
            return Err(AlertError::InvalidArgument(
                "alert generation time must be positive".to_string(),
            ));
        }

        let graded = match reading.vital_type {
            VitalType::SystolicPressure => grade_pressure(
                reading.value,
                "systolic",
                "SystolicPressure",
                [
                    CRITICAL_HIGH_SYSTOLIC,
                    HIGH_SYSTOLIC,
                    CRITICAL_LOW_SYSTOLIC,
                    LOW_SYSTOLIC,
                ],
            ),
            VitalType::DiastolicPressure => grade_pressure(
                reading.value,
                "diastolic",
                "DiastolicPressure",
                [
                    CRITICAL_HIGH_DIASTOLIC,
                    HIGH_DIASTOLIC,
                    CRITICAL_LOW_DIASTOLIC,
                    LOW_DIASTOLIC,
                ],
            ),
            VitalType::Ecg => grade_ecg(self, reading.value, baseline),
            _ => (reading.value < LOW_SATURATION).then(|| {
                (
                    "LowBloodSaturation".to_string(),
                    format!(
                        "Low blood oxygen saturation: {:.1}% (<{}%)",
                        reading.value, LOW_SATURATION
                    ),
                )
            }),
        };

        Ok(graded.map(|(alert_type, description)| {
            Alert::new(patient_id, *reading, generated_at, alert_type, description)
        }))
    }
}

fn grade_ecg(factory: &AlertFactory, value: f64, baseline: &[f64]) -> Option<(String, String)> {
    let AlertFactory::Ecg(config) = factory else {
        return None;
    };
    let start = baseline.len().saturating_sub(config.window_size);
    let (mean, threshold) = config.detect(value, baseline[start..].iter().copied())?;
    Some((
        "ECGAnomaly".to_string(),
        format!(
            "Abnormal ECG reading: {:.2} (baseline mean {:.2}, threshold {:.2})",
            value, mean, threshold
        ),
    ))
}

/// `bounds` is [critical high, high, critical low, low]; first match wins
fn grade_pressure(
    value: f64,
    component: &str,
    suffix: &str,
    bounds: [f64; 4],
) -> Option<(String, String)> {
    let [critical_high, high, critical_low, low] = bounds;
    let (level, label) = if value >= critical_high {
        ("CriticalHigh", "Critical high")
    } else if value >= high {
        ("High", "High")
    } else if value <= critical_low {
        ("CriticalLow", "Critical low")
    } else if value <= low {
        ("Low", "Low")
    } else {
        return None;
    };

    Some((
        format!("{}{}", level, suffix),
        format!("{} {} pressure: {:.1} mmHg", label, component, value),
    ))
}
