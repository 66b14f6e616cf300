//! Vital-sign domain types
//!
//! Provides the closed set of vital types and the immutable `Reading` sample.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Patient identifier (positive)
pub type PatientId = u32;

/// Milliseconds since the Unix epoch
pub type Timestamp = u64;

/// One minute in milliseconds
pub const MINUTE_MS: u64 = 60 * 1000;

/// Category of a vital-sign reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VitalType {
    /// Systolic blood pressure (mmHg)
    SystolicPressure,
    /// Diastolic blood pressure (mmHg)
    DiastolicPressure,
    /// Peripheral oxygen saturation (%)
    BloodSaturation,
    /// Heart rate (bpm)
    HeartRate,
    /// ECG lead amplitude
    #[serde(rename = "ECG")]
    Ecg,
    /// Nurse/patient call button; 1.0 means triggered
    ManualTrigger,
}

impl VitalType {
    /// Every vital type, in evaluation order
    pub const ALL: [VitalType; 6] = [
        Self::SystolicPressure,
        Self::DiastolicPressure,
        Self::BloodSaturation,
        Self::HeartRate,
        Self::Ecg,
        Self::ManualTrigger,
    ];

    /// Canonical label used in data files and alert descriptions
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SystolicPressure => "SystolicPressure",
            Self::DiastolicPressure => "DiastolicPressure",
            Self::BloodSaturation => "BloodSaturation",
            Self::HeartRate => "HeartRate",
            Self::Ecg => "ECG",
            Self::ManualTrigger => "ManualTrigger",
        }
    }

    /// Unit suffix for display
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::SystolicPressure | Self::DiastolicPressure => "mmHg",
            Self::BloodSaturation => "%",
            Self::HeartRate => "bpm",
            Self::Ecg | Self::ManualTrigger => "",
        }
    }

    /// Whether this is one of the two blood pressure components
    pub const fn is_blood_pressure(&self) -> bool {
        matches!(self, Self::SystolicPressure | Self::DiastolicPressure)
    }
}

impl fmt::Display for VitalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for VitalType {
    type Err = DomainError;

    /// Parse a vital label, accepting the aliases emitted by the simulator
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "systolicpressure" | "systolic" => Ok(Self::SystolicPressure),
            "diastolicpressure" | "diastolic" => Ok(Self::DiastolicPressure),
            "bloodsaturation" | "saturation" | "spo2" => Ok(Self::BloodSaturation),
            "heartrate" | "hr" => Ok(Self::HeartRate),
            "ecg" => Ok(Self::Ecg),
            "manualtrigger" | "alert" => Ok(Self::ManualTrigger),
            _ => Err(DomainError::UnknownVitalType(s.trim().to_string())),
        }
    }
}

/// One immutable vital-sign sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Patient the sample belongs to
    pub patient_id: PatientId,
    /// What was measured
    pub vital_type: VitalType,
    /// Raw measured value; may be non-finite
    pub value: f64,
    /// Measurement time in milliseconds since the epoch
    pub timestamp: Timestamp,
}

impl Reading {
    /// Create a reading without validation
    pub const fn new(
        patient_id: PatientId,
        vital_type: VitalType,
        value: f64,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            patient_id,
            vital_type,
            value,
            timestamp,
        }
    }

    /// Create a reading, rejecting a zero patient id or timestamp
    pub fn try_new(
        patient_id: PatientId,
        vital_type: VitalType,
        value: f64,
        timestamp: Timestamp,
    ) -> Result<Self, DomainError> {
        if patient_id == 0 {
            return Err(DomainError::InvalidPatientId(patient_id));
        }
        if timestamp == 0 {
            return Err(DomainError::InvalidTimestamp(timestamp));
        }
        Ok(Self::new(patient_id, vital_type, value, timestamp))
    }

    /// Whether the value can take part in numeric comparisons
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    /// Identity check used by history replay: NaN payloads compare by bits
    pub fn same_sample(&self, other: &Reading) -> bool {
        self.patient_id == other.patient_id
            && self.vital_type == other.vital_type
            && self.timestamp == other.timestamp
            && self.value.to_bits() == other.value.to_bits()
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "patient {} {} = {}{} @ {}",
            self.patient_id,
            self.vital_type,
            self.value,
            self.vital_type.unit(),
            self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vital_type_parse_aliases() {
        assert_eq!(
            "SystolicPressure".parse::<VitalType>().unwrap(),
            VitalType::SystolicPressure
        );
        assert_eq!(
            "Saturation".parse::<VitalType>().unwrap(),
            VitalType::BloodSaturation
        );
        assert_eq!("Alert".parse::<VitalType>().unwrap(), VitalType::ManualTrigger);
        assert_eq!("ecg".parse::<VitalType>().unwrap(), VitalType::Ecg);
        assert_eq!(
            "heart_rate".parse::<VitalType>().unwrap(),
            VitalType::HeartRate
        );
    }

    #[test]
    fn test_vital_type_parse_unknown() {
        let err = "Cholesterol".parse::<VitalType>().unwrap_err();
        assert_eq!(err, DomainError::UnknownVitalType("Cholesterol".to_string()));
    }

    #[test]
    fn test_vital_type_label_round_trip() {
        for vital in VitalType::ALL {
            assert_eq!(vital.label().parse::<VitalType>().unwrap(), vital);
        }
    }

    #[test]
    fn test_reading_try_new_validation() {
        assert!(Reading::try_new(1, VitalType::HeartRate, 80.0, 1000).is_ok());
        assert_eq!(
            Reading::try_new(0, VitalType::HeartRate, 80.0, 1000).unwrap_err(),
            DomainError::InvalidPatientId(0)
        );
        assert_eq!(
            Reading::try_new(1, VitalType::HeartRate, 80.0, 0).unwrap_err(),
            DomainError::InvalidTimestamp(0)
        );
    }

    #[test]
    fn test_same_sample_handles_nan() {
        let a = Reading::new(1, VitalType::Ecg, f64::NAN, 1000);
        let b = Reading::new(1, VitalType::Ecg, f64::NAN, 1000);
        assert_ne!(a, b);
        assert!(a.same_sample(&b));
        assert!(!a.is_finite());
    }

    #[test]
    fn test_reading_display() {
        let r = Reading::new(3, VitalType::HeartRate, 72.0, 5000);
        assert_eq!(r.to_string(), "patient 3 HeartRate = 72bpm @ 5000");
    }
}
