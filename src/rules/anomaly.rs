//! ECG amplitude anomalies against a moving average

use super::{EcgAnomalyConfig, EvalContext, RuleEvaluator, RulePhase};
use crate::alerts::Alert;
use crate::domain::{Reading, VitalType};
use crate::history::PatientHistory;

const VITALS: [VitalType; 1] = [VitalType::Ecg];

/// Fires when |current| exceeds `multiplier` times the mean absolute value
/// of the previous `window_size` readings
#[derive(Debug, Clone)]
pub struct SlidingWindowAnomalyRule {
    config: EcgAnomalyConfig,
}

impl SlidingWindowAnomalyRule {
    pub fn new(config: EcgAnomalyConfig) -> Self {
        Self { config }
    }
}

impl RuleEvaluator for SlidingWindowAnomalyRule {
    fn name(&self) -> &'static str {
        "ecg_anomaly"
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
        let size = self.config.window_size;
        let prior = history.preceding(current);
        if size == 0 || prior.len() < size {
            return None;
        }

        let window = prior[prior.len() - size..].iter().map(|r| r.value);
        let (mean, threshold) = self.config.detect(current.value, window)?;

        let description = format!(
            "Abnormal ECG reading: {:.2} (window mean {:.2}, threshold {:.2})",
            current.value, mean, threshold
        );
        Some(ctx.alert(current, "ECGAnomaly", description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::reading;

    fn run(values: &[f64]) -> Option<Alert> {
        let mut history = PatientHistory::new(1);
        let readings: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| reading(VitalType::Ecg, *v, 1000 * (i as u64 + 1)))
            .collect();
        for r in &readings {
            history.record(*r);
        }
        SlidingWindowAnomalyRule::new(EcgAnomalyConfig::default()).evaluate(
            &EvalContext::new(1, 1),
            readings.last()?,
            &history,
        )
    }

    fn steady_then(last: f64) -> Vec<f64> {
        let mut values = vec![0.8; 10];
        values.push(last);
        values
    }

    #[test]
    fn test_spike_over_moving_average() {
        let alert = run(&steady_then(2.5)).unwrap();
        assert_eq!(alert.alert_type, "ECGAnomaly");
        assert_eq!(
            alert.description,
            "Abnormal ECG reading: 2.50 (window mean 0.80, threshold 1.20)"
        );
    }

    #[test]
    fn test_negative_spike_uses_magnitude() {
        assert!(run(&steady_then(-2.5)).is_some());
    }

    #[test]
    fn test_within_threshold() {
        assert!(run(&steady_then(1.0)).is_none());
    }

    #[test]
    fn test_needs_full_window() {
        let mut values = vec![0.8; 9];
        values.push(5.0);
        assert!(run(&values).is_none());
    }

    #[test]
    fn test_zero_mean_never_fires() {
        assert!(run(&steady_then(0.0)).is_none());
        let mut values = vec![0.0; 10];
        values.push(3.0);
        assert!(run(&values).is_none());
    }

    #[test]
    fn test_nan_in_window() {
        let mut values = steady_then(2.5);
        values[3] = f64::NAN;
        assert!(run(&values).is_none());
    }
}
