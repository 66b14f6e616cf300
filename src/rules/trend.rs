//! Blood pressure trends over three consecutive readings

use super::{EvalContext, RuleEvaluator, RulePhase, TrendConfig};
use crate::alerts::Alert;
use crate::domain::{Reading, VitalType};
use crate::history::PatientHistory;

const VITALS: [VitalType; 2] = [VitalType::SystolicPressure, VitalType::DiastolicPressure];

/// Fires when each of the last three same-type readings moves by more than
/// `min_delta` in the same direction
#[derive(Debug, Clone)]
pub struct TrendRule {
    config: TrendConfig,
}

impl TrendRule {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }
}

impl RuleEvaluator for TrendRule {
    fn name(&self) -> &'static str {
        "trend"
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Windowed
    }

    fn vital_types(&self) -> &[VitalType] {
        &VITALS
    }

    fn evaluate(
        &self,
        ctx: &EvalContext,
        current: &Reading,
        history: &PatientHistory,
    ) -> Option<Alert> {
        let prior = history.preceding(current);
        let [first, second] = prior.get(prior.len().checked_sub(2)?..)? else {
            return None;
        };
        let (v1, v2, v3) = (first.value, second.value, current.value);
        let delta = self.config.min_delta;

        let (alert_type, direction) = if v2 - v1 > delta && v3 - v2 > delta {
            ("BloodPressureIncreasingTrend", "Increasing")
        } else if v1 - v2 > delta && v2 - v3 > delta {
            ("BloodPressureDecreasingTrend", "Decreasing")
        } else {
            return None;
        };

        let component = match current.vital_type {
            VitalType::SystolicPressure => "systolic",
            _ => "diastolic",
        };
        let description = format!(
            "{} trend in {} pressure: {:.1} -> {:.1} -> {:.1} mmHg",
            direction, component, v1, v2, v3
        );
        Some(ctx.alert(current, alert_type, description))
    }
}
