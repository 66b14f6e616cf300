//! Hypotensive hypoxemia: low systolic pressure and low saturation close in time

use super::{CrossSignalConfig, EvalContext, RuleEvaluator, RulePhase};
use crate::alerts::Alert;
use crate::domain::{Reading, VitalType, MINUTE_MS};
use crate::history::PatientHistory;

const VITALS: [VitalType; 1] = [VitalType::BloodSaturation];

/// Correlates systolic and saturation series across the whole history
///
/// Registered under saturation only, so one pass evaluates it at most once.
#[derive(Debug, Clone)]
pub struct CrossSignalRule {
    config: CrossSignalConfig,
}

impl CrossSignalRule {
    pub fn new(config: CrossSignalConfig) -> Self {
        Self { config }
    }

    /// First qualifying (systolic, saturation) pair in time order
    fn find_pair<'a>(&self, history: &'a PatientHistory) -> Option<(&'a Reading, &'a Reading)> {
        let low_saturation: Vec<&Reading> = history
            .readings(VitalType::BloodSaturation)
            .iter()
            .filter(|r| r.value < self.config.saturation_below)
            .collect();
        if low_saturation.is_empty() {
            return None;
        }

        history
            .readings(VitalType::SystolicPressure)
            .iter()
            .filter(|r| r.value < self.config.systolic_below)
            .find_map(|systolic| {
                let earliest = systolic.timestamp.saturating_sub(self.config.window_ms);
                let idx = low_saturation.partition_point(|s| s.timestamp < earliest);
                low_saturation
                    .get(idx)
                    .filter(|s| s.timestamp.abs_diff(systolic.timestamp) <= self.config.window_ms)
                    .map(|s| (systolic, *s))
            })
    }
}

impl RuleEvaluator for CrossSignalRule {
    fn name(&self) -> &'static str {
        "cross_signal"
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
        _current: &Reading,
        history: &PatientHistory,
    ) -> Option<Alert> {
        let (systolic, saturation) = self.find_pair(history)?;
        let minutes = systolic.timestamp.abs_diff(saturation.timestamp) / MINUTE_MS;
        let description = format!(
            "Hypotensive hypoxemia: systolic {:.1} mmHg and saturation {:.1}% within {} minutes",
            systolic.value, saturation.value, minutes
        );
        Some(ctx.alert(saturation, "HypotensiveHypoxemia", description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::reading;

    fn run(systolic: &[(f64, u64)], saturation: &[(f64, u64)]) -> Option<Alert> {
        let mut history = PatientHistory::new(1);
        for (v, ts) in systolic {
            history.record(reading(VitalType::SystolicPressure, *v, *ts));
        }
        for (v, ts) in saturation {
            history.record(reading(VitalType::BloodSaturation, *v, *ts));
        }
        let current = *history.latest(VitalType::BloodSaturation)?;
        CrossSignalRule::new(CrossSignalConfig::default()).evaluate(
            &EvalContext::new(1, 1),
            &current,
            &history,
        )
    }

    #[test]
    fn test_pair_within_window() {
        let alert = run(&[(85.0, 1000)], &[(90.0, 3 * MINUTE_MS)]).unwrap();
        assert_eq!(alert.alert_type, "HypotensiveHypoxemia");
        assert_eq!(alert.triggering_reading.vital_type, VitalType::BloodSaturation);
        assert_eq!(alert.triggering_reading.value, 90.0);
    }

    #[test]
    fn test_saturation_before_systolic() {
        assert!(run(&[(85.0, 10 * MINUTE_MS)], &[(90.0, 6 * MINUTE_MS)]).is_some());
    }

    #[test]
    fn test_pair_too_far_apart() {
        assert!(run(&[(85.0, 0)], &[(90.0, 6 * MINUTE_MS)]).is_none());
    }

    #[test]
    fn test_values_must_be_strictly_below() {
        assert!(run(&[(90.0, 0)], &[(90.0, MINUTE_MS)]).is_none());
        assert!(run(&[(85.0, 0)], &[(92.0, MINUTE_MS)]).is_none());
    }

    #[test]
    fn test_searches_entire_history() {
        // Qualifying pair long before the latest saturation reading
        let alert = run(
            &[(85.0, 0)],
            &[(90.0, MINUTE_MS), (98.0, 60 * MINUTE_MS)],
        )
        .unwrap();
        assert_eq!(alert.triggering_reading.timestamp, MINUTE_MS);
    }

    #[test]
    fn test_no_systolic_history() {
        assert!(run(&[], &[(85.0, 0)]).is_none());
    }
}
