//! Detection rules
//!
//! Every rule maps (current reading, patient history) to at most one alert.
//! Rules carry only immutable configuration; all state lives in the
//! [`PatientHistory`] the engine hands them, so a single rule instance is
//! shared across patients and threads.
//!
//! Rules are grouped by phase:
//!
//! - [`RulePhase::PerReading`]: run for each reading as it is recorded
//!   (threshold, manual trigger)
//! - [`RulePhase::Windowed`]: run once per pass against the latest reading
//!   of each vital type, after the whole batch has been recorded

mod anomaly;
mod config;
mod cross_signal;
mod manual;
mod rapid_change;
mod saturation_drop;
mod threshold;
mod trend;

pub use anomaly::SlidingWindowAnomalyRule;
pub use config::{
    CrossSignalConfig, EcgAnomalyConfig, ManualTriggerConfig, PatientThresholdProfile, RapidChangeConfig,
    RuleConfig, SaturationDropConfig, ThresholdBand, TrendConfig,
};
pub use cross_signal::CrossSignalRule;
pub use manual::ManualTriggerRule;
pub use rapid_change::RapidChangeRule;
pub use saturation_drop::RapidSaturationDropRule;
pub use threshold::{Condition, ThresholdRule};
pub use trend::TrendRule;

use crate::alerts::Alert;
use crate::domain::{PatientId, Reading, Timestamp, VitalType};
use crate::history::PatientHistory;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// When a rule runs during an evaluation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RulePhase {
    /// Immediately after each reading is recorded
    PerReading,
    /// Once per pass, on the latest reading of each applicable vital type
    Windowed,
}

impl fmt::Display for RulePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerReading => write!(f, "per-reading"),
            Self::Windowed => write!(f, "windowed"),
        }
    }
}

/// Per-invocation context: whose pass this is and when it happens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    pub patient_id: PatientId,
    pub generated_at: Timestamp,
}

impl EvalContext {
    pub fn new(patient_id: PatientId, generated_at: Timestamp) -> Self {
        Self {
            patient_id,
            generated_at,
        }
    }

    /// Build an alert stamped with this context
    pub fn alert(
        &self,
        triggering_reading: &Reading,
        alert_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Alert {
        Alert::new(
            self.patient_id,
            *triggering_reading,
            self.generated_at,
            alert_type,
            description,
        )
    }
}

/// A single detector
pub trait RuleEvaluator: Send + Sync {
    /// Stable rule name, used for registry listings and config toggles
    fn name(&self) -> &'static str;

    /// When the engine invokes this rule
    fn phase(&self) -> RulePhase;

    /// Vital types this rule is registered under
    fn vital_types(&self) -> &[VitalType];

    /// Evaluate `current` against `history`; `None` means no alert
    fn evaluate(
        &self,
        ctx: &EvalContext,
        current: &Reading,
        history: &PatientHistory,
    ) -> Option<Alert>;
}

/// Mapping from vital types to the rules that apply to them
#[derive(Default, Clone)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn RuleEvaluator>>,
    by_vital: BTreeMap<VitalType, Vec<usize>>,
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard rule battery, minus anything disabled in `config`
    pub fn standard(config: &RuleConfig) -> Self {
        let candidates: Vec<Arc<dyn RuleEvaluator>> = vec![
            Arc::new(
                ThresholdRule::new(config.thresholds.clone())
                    .with_profiles(config.patient_thresholds.clone()),
            ),
            Arc::new(ManualTriggerRule::new(config.manual_trigger.clone())),
            Arc::new(TrendRule::new(config.trend.clone())),
            Arc::new(RapidChangeRule::new(config.rapid_change.clone())),
            Arc::new(CrossSignalRule::new(config.cross_signal.clone())),
            Arc::new(SlidingWindowAnomalyRule::new(config.ecg_anomaly.clone())),
            Arc::new(RapidSaturationDropRule::new(config.saturation_drop.clone())),
        ];

        let mut registry = Self::new();
        for rule in candidates {
            if config.is_disabled(rule.name()) {
                log::debug!("Rule {} disabled by configuration", rule.name());
                continue;
            }
            registry.register(rule);
        }
        registry
    }

    /// Add a rule under each of its vital types
    pub fn register(&mut self, rule: Arc<dyn RuleEvaluator>) {
        let idx = self.rules.len();
        for vital in rule.vital_types() {
            self.by_vital.entry(*vital).or_default().push(idx);
        }
        self.rules.push(rule);
    }

    /// Rules registered for `vital_type` in `phase`, in registration order
    pub fn rules_for(
        &self,
        vital_type: VitalType,
        phase: RulePhase,
    ) -> impl Iterator<Item = &dyn RuleEvaluator> + '_ {
        self.by_vital
            .get(&vital_type)
            .into_iter()
            .flatten()
            .map(move |idx| self.rules[*idx].as_ref())
            .filter(move |rule| rule.phase() == phase)
    }

    /// All registered rules
    pub fn rules(&self) -> impl Iterator<Item = &dyn RuleEvaluator> + '_ {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Number of registered rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the registry has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.name()))
            .finish()
    }
}
