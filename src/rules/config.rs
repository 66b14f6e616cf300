//! Rule configuration
//!
//! Provides TOML-friendly settings for every detector. Defaults reproduce the
//! clinical constants the rules were designed around.

use super::threshold::Condition;
use crate::alerts::AlertSeverity;
use crate::domain::{PatientId, VitalType, MINUTE_MS};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Settings for the full rule battery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Rule names to leave out of the registry
    pub disabled: Vec<String>,
    /// Threshold bands, checked in order per vital type
    pub thresholds: Vec<ThresholdBand>,
    /// Per-patient bands replacing the defaults for the vital types they name
    pub patient_thresholds: Vec<PatientThresholdProfile>,
    pub trend: TrendConfig,
    pub rapid_change: RapidChangeConfig,
    pub saturation_drop: SaturationDropConfig,
    pub cross_signal: CrossSignalConfig,
    pub ecg_anomaly: EcgAnomalyConfig,
    pub manual_trigger: ManualTriggerConfig,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            thresholds: ThresholdBand::defaults(),
            patient_thresholds: Vec::new(),
            trend: TrendConfig::default(),
            rapid_change: RapidChangeConfig::default(),
            saturation_drop: SaturationDropConfig::default(),
            cross_signal: CrossSignalConfig::default(),
            ecg_anomaly: EcgAnomalyConfig::default(),
            manual_trigger: ManualTriggerConfig::default(),
        }
    }
}

impl RuleConfig {
    /// Whether a rule name is disabled
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }

    /// Threshold profile for a patient, if one is configured
    pub fn profile_for(&self, patient_id: PatientId) -> Option<&PatientThresholdProfile> {
        self.patient_thresholds
            .iter()
            .find(|p| p.patient_id == patient_id)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        for band in &self.thresholds {
            band.validate()?;
        }
        for (i, profile) in self.patient_thresholds.iter().enumerate() {
            if profile.patient_id == 0 {
                return Err(invalid("patient_thresholds.patient_id", "must be positive"));
            }
            if self.patient_thresholds[..i]
                .iter()
                .any(|p| p.patient_id == profile.patient_id)
            {
                return Err(invalid(
                    "patient_thresholds.patient_id",
                    format!("duplicate profile for patient {}", profile.patient_id),
                ));
            }
            for band in &profile.bands {
                band.validate()?;
            }
        }
        positive("trend.min_delta", self.trend.min_delta)?;
        positive("rapid_change.min_delta", self.rapid_change.min_delta)?;
        nonzero("rapid_change.window_ms", self.rapid_change.window_ms)?;
        positive("saturation_drop.min_drop", self.saturation_drop.min_drop)?;
        nonzero("saturation_drop.window_ms", self.saturation_drop.window_ms)?;
        finite("cross_signal.systolic_below", self.cross_signal.systolic_below)?;
        finite(
            "cross_signal.saturation_below",
            self.cross_signal.saturation_below,
        )?;
        nonzero("cross_signal.window_ms", self.cross_signal.window_ms)?;
        nonzero(
            "ecg_anomaly.window_size",
            self.ecg_anomaly.window_size as u64,
        )?;
        positive("ecg_anomaly.multiplier", self.ecg_anomaly.multiplier)?;
        finite("manual_trigger.trigger_value", self.manual_trigger.trigger_value)?;
        Ok(())
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

fn finite(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(key, format!("{} is not a finite number", value)))
    }
}

fn positive(key: &str, value: f64) -> Result<(), ConfigError> {
    finite(key, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(key, format!("{} must be greater than zero", value)))
    }
}

fn nonzero(key: &str, value: u64) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(invalid(key, "must be greater than zero"))
    }
}

/// One threshold band: fires `alert_type` when `condition` holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    /// Vital type the band applies to
    pub vital: VitalType,
    /// Alert type tag raised on breach
    pub alert_type: String,
    /// Human-readable condition name used in descriptions
    pub label: String,
    /// Breach condition
    pub condition: Condition,
    /// Severity override; the alert type's default severity otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<AlertSeverity>,
}

impl ThresholdBand {
    pub fn new(
        vital: VitalType,
        alert_type: impl Into<String>,
        label: impl Into<String>,
        condition: Condition,
    ) -> Self {
        Self {
            vital,
            alert_type: alert_type.into(),
            label: label.into(),
            condition,
            severity: None,
        }
    }

    /// Raise alerts from this band at `severity`
    pub fn with_severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.alert_type.trim().is_empty() {
            return Err(invalid("thresholds.alert_type", "cannot be empty"));
        }
        finite("thresholds.condition", self.condition.threshold())
    }

    /// Default bands, most extreme first within each vital type
    pub fn defaults() -> Vec<ThresholdBand> {
        use Condition::{Above, AtLeast, AtMost, Below};
        use VitalType::{BloodSaturation, DiastolicPressure, HeartRate, SystolicPressure};

        vec![
            Self::new(
                SystolicPressure,
                "CriticalHighSystolicPressure",
                "Critical high systolic pressure",
                Above(180.0),
            ),
            Self::new(
                SystolicPressure,
                "CriticalLowSystolicPressure",
                "Critical low systolic pressure",
                Below(90.0),
            ),
            Self::new(
                DiastolicPressure,
                "CriticalHighDiastolicPressure",
                "Critical high diastolic pressure",
                Above(120.0),
            ),
            Self::new(
                DiastolicPressure,
                "CriticalLowDiastolicPressure",
                "Critical low diastolic pressure",
                Below(60.0),
            ),
            Self::new(
                BloodSaturation,
                "CriticalLowBloodSaturation",
                "Critical low oxygen saturation",
                AtMost(88.0),
            ),
            Self::new(
                BloodSaturation,
                "LowBloodSaturation",
                "Low oxygen saturation",
                Below(92.0),
            ),
            Self::new(
                HeartRate,
                "CriticalTachycardia",
                "Critical high heart rate",
                AtLeast(150.0),
            ),
            Self::new(
                HeartRate,
                "CriticalBradycardia",
                "Critical low heart rate",
                AtMost(40.0),
            ),
            Self::new(HeartRate, "Tachycardia", "High heart rate", Above(120.0)),
            Self::new(HeartRate, "Bradycardia", "Low heart rate", Below(50.0)),
        ]
    }
}

/// Threshold overrides for one patient
///
/// Bands listed here replace the default bands for their vital type only;
/// vital types without an override keep the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientThresholdProfile {
    pub patient_id: PatientId,
    #[serde(default)]
    pub bands: Vec<ThresholdBand>,
}

impl PatientThresholdProfile {
    pub fn new(patient_id: PatientId) -> Self {
        Self {
            patient_id,
            bands: Vec::new(),
        }
    }

    /// Append a band
    pub fn add(&mut self, band: ThresholdBand) {
        self.bands.push(band);
    }

    /// Drop every band for `vital`; returns how many were removed
    pub fn remove(&mut self, vital: VitalType) -> usize {
        let before = self.bands.len();
        self.bands.retain(|b| b.vital != vital);
        before - self.bands.len()
    }

    /// Bands overriding `vital`, in order
    pub fn bands_for(&self, vital: VitalType) -> impl Iterator<Item = &ThresholdBand> {
        self.bands.iter().filter(move |b| b.vital == vital)
    }

    /// Whether this profile overrides `vital`
    pub fn overrides(&self, vital: VitalType) -> bool {
        self.bands_for(vital).next().is_some()
    }
}

/// Blood pressure trend detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Minimum step between consecutive readings (strict)
    pub min_delta: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self { min_delta: 10.0 }
    }
}

/// Heart rate rapid change detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RapidChangeConfig {
    /// Minimum absolute change in bpm
    pub min_delta: f64,
    /// Trailing window in milliseconds
    pub window_ms: u64,
}

impl Default for RapidChangeConfig {
    fn default() -> Self {
        Self {
            min_delta: 30.0,
            window_ms: 5 * MINUTE_MS,
        }
    }
}

/// Rapid oxygen saturation drop detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturationDropConfig {
    /// Minimum drop in percentage points
    pub min_drop: f64,
    /// Trailing window in milliseconds
    pub window_ms: u64,
}

impl Default for SaturationDropConfig {
    fn default() -> Self {
        Self {
            min_drop: 5.0,
            window_ms: 10 * MINUTE_MS,
        }
    }
}

/// Hypotensive hypoxemia correlation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossSignalConfig {
    /// Systolic readings strictly below this qualify
    pub systolic_below: f64,
    /// Saturation readings strictly below this qualify
    pub saturation_below: f64,
    /// Maximum timestamp distance between the pair
    pub window_ms: u64,
}

impl Default for CrossSignalConfig {
    fn default() -> Self {
        Self {
            systolic_below: 90.0,
            saturation_below: 92.0,
            window_ms: 5 * MINUTE_MS,
        }
    }
}

/// ECG moving-average anomaly detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcgAnomalyConfig {
    /// Number of prior readings averaged
    pub window_size: usize,
    /// Factor over the mean that counts as anomalous
    pub multiplier: f64,
}

impl EcgAnomalyConfig {
    /// Compare `value` against the mean absolute value of `window`
    ///
    /// Returns `(mean, threshold)` when `|value|` exceeds the threshold. A
    /// window of any length other than `window_size`, a zero mean, or a NaN
    /// anywhere yields `None`.
    pub fn detect<I>(&self, value: f64, window: I) -> Option<(f64, f64)>
    where
        I: IntoIterator<Item = f64>,
    {
        let (count, sum) = window
            .into_iter()
            .fold((0usize, 0.0), |(n, sum), v| (n + 1, sum + v.abs()));
        if self.window_size == 0 || count != self.window_size {
            return None;
        }

        let mean = sum / count as f64;
        let threshold = mean * self.multiplier;
        (mean > 0.0 && value.abs() > threshold).then_some((mean, threshold))
    }
}

impl Default for EcgAnomalyConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            multiplier: 1.5,
        }
    }
}

/// Manual trigger button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualTriggerConfig {
    /// Value meaning "pressed"
    pub trigger_value: f64,
}

impl Default for ManualTriggerConfig {
    fn default() -> Self {
        Self { trigger_value: 1.0 }
    }
}
