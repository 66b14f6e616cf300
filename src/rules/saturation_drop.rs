//! Rapid oxygen saturation drop

use super::{EvalContext, RuleEvaluator, RulePhase, SaturationDropConfig};
use crate::alerts::Alert;
use crate::domain::{Reading, VitalType, MINUTE_MS};
use crate::history::PatientHistory;

const VITALS: [VitalType; 1] = [VitalType::BloodSaturation];

/// Fires when saturation has fallen by at least `min_drop` points from any
/// reading in the trailing window
#[derive(Debug, Clone)]
pub struct RapidSaturationDropRule {
    config: SaturationDropConfig,
}

impl RapidSaturationDropRule {
    pub fn new(config: SaturationDropConfig) -> Self {
        Self { config }
    }
}

impl RuleEvaluator for RapidSaturationDropRule {
    fn name(&self) -> &'static str {
        "rapid_saturation_drop"
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
        let previous = history
            .preceding(current)
            .iter()
            .rev()
            .take_while(|r| current.timestamp - r.timestamp <= self.config.window_ms)
            .find(|r| r.value - current.value >= self.config.min_drop)?;

        let minutes = (current.timestamp - previous.timestamp) / MINUTE_MS;
        let description = format!(
            "Rapid oxygen saturation drop: {:.1}% to {:.1}% (drop of {:.1}%) in {} minutes",
            previous.value,
            current.value,
            previous.value - current.value,
            minutes
        );
        Some(ctx.alert(current, "RapidSaturationDrop", description))
    }
}
