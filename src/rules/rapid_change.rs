//! Rapid heart rate change within a trailing window

use super::{EvalContext, RapidChangeConfig, RuleEvaluator, RulePhase};
use crate::alerts::Alert;
use crate::domain::{Reading, VitalType, MINUTE_MS};
use crate::history::PatientHistory;

const VITALS: [VitalType; 1] = [VitalType::HeartRate];

/// Fires when any heart rate reading in the trailing window differs from the
/// current one by at least `min_delta` bpm
#[derive(Debug, Clone)]
pub struct RapidChangeRule {
    config: RapidChangeConfig,
}

impl RapidChangeRule {
    pub fn new(config: RapidChangeConfig) -> Self {
        Self { config }
    }
}

impl RuleEvaluator for RapidChangeRule {
    fn name(&self) -> &'static str {
        "rapid_change"
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
        // Newest first; stop at the first reading older than the window
        let previous = history
            .preceding(current)
            .iter()
            .rev()
            .take_while(|r| current.timestamp - r.timestamp <= self.config.window_ms)
            .find(|r| (current.value - r.value).abs() >= self.config.min_delta)?;

        let change = current.value - previous.value;
        let direction = if change > 0.0 { "increase" } else { "decrease" };
        let minutes = (current.timestamp - previous.timestamp) / MINUTE_MS;
        let description = format!(
            "Rapid heart rate {}: {:.0} to {:.0} bpm (change of {:.0} bpm) in {} minutes",
            direction,
            previous.value,
            current.value,
            change.abs(),
            minutes
        );
        Some(ctx.alert(current, "RapidHeartRateChange", description))
    }
}
