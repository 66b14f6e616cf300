//! Static threshold bands

use super::{EvalContext, PatientThresholdProfile, RuleEvaluator, RulePhase, ThresholdBand};
use crate::alerts::Alert;
use crate::domain::{PatientId, Reading, VitalType};
use crate::history::PatientHistory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Breach condition for a threshold band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Value strictly greater than threshold
    Above(f64),
    /// Value greater than or equal to threshold
    AtLeast(f64),
    /// Value strictly less than threshold
    Below(f64),
    /// Value less than or equal to threshold
    AtMost(f64),
}

impl Condition {
    /// Evaluate condition against a value; never true for NaN
    pub fn evaluate(&self, value: f64) -> bool {
        match self {
            Self::Above(threshold) => value > *threshold,
            Self::AtLeast(threshold) => value >= *threshold,
            Self::Below(threshold) => value < *threshold,
            Self::AtMost(threshold) => value <= *threshold,
        }
    }

    /// Threshold the condition compares against
    pub fn threshold(&self) -> f64 {
        match self {
            Self::Above(t) | Self::AtLeast(t) | Self::Below(t) | Self::AtMost(t) => *t,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Above(v) => write!(f, ">{}", v),
            Self::AtLeast(v) => write!(f, ">={}", v),
            Self::Below(v) => write!(f, "<{}", v),
            Self::AtMost(v) => write!(f, "<={}", v),
        }
    }
}

/// Per-reading rule raising the first band a value falls into
#[derive(Debug, Clone)]
pub struct ThresholdRule {
    bands: Vec<ThresholdBand>,
    profiles: BTreeMap<PatientId, PatientThresholdProfile>,
    vital_types: Vec<VitalType>,
}

impl ThresholdRule {
    pub fn new(bands: Vec<ThresholdBand>) -> Self {
        let mut rule = Self {
            bands,
            profiles: BTreeMap::new(),
            vital_types: Vec::new(),
        };
        rule.refresh_vital_types();
        rule
    }

    /// Attach per-patient overrides; a later profile for the same patient wins
    pub fn with_profiles(mut self, profiles: Vec<PatientThresholdProfile>) -> Self {
        for profile in profiles {
            self.profiles.insert(profile.patient_id, profile);
        }
        self.refresh_vital_types();
        self
    }

    fn refresh_vital_types(&mut self) {
        let profile_bands = self.profiles.values().flat_map(|p| p.bands.iter());
        let all: Vec<_> = self.bands.iter().chain(profile_bands).collect();
        self.vital_types = VitalType::ALL
            .into_iter()
            .filter(|vt| all.iter().any(|b| b.vital == *vt))
            .collect();
    }

    /// First band breached by `reading`, in configuration order
    ///
    /// A profile for `patient_id` that names the reading's vital type
    /// replaces the default bands for that type.
    pub fn classify(&self, patient_id: PatientId, reading: &Reading) -> Option<&ThresholdBand> {
        let vital = reading.vital_type;
        match self.profiles.get(&patient_id).filter(|p| p.overrides(vital)) {
            Some(profile) => profile
                .bands_for(vital)
                .find(|b| b.condition.evaluate(reading.value)),
            None => self
                .bands
                .iter()
                .filter(|b| b.vital == vital)
                .find(|b| b.condition.evaluate(reading.value)),
        }
    }
}

impl RuleEvaluator for ThresholdRule {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn phase(&self) -> RulePhase {
        RulePhase::PerReading
    }

    fn vital_types(&self) -> &[VitalType] {
        &self.vital_types
    }

    fn evaluate(
        &self,
        ctx: &EvalContext,
        current: &Reading,
        _history: &PatientHistory,
    ) -> Option<Alert> {
        let band = self.classify(ctx.patient_id, current)?;
        let description = format!(
            "{}: {:.1} {} ({})",
            band.label,
            current.value,
            current.vital_type.unit(),
            band.condition
        );
        let alert = ctx.alert(current, band.alert_type.clone(), description);
        Some(match band.severity {
            Some(severity) => alert.with_severity(severity),
            None => alert,
        })
    }
}
