//! Manual call-button alerts

use super::{EvalContext, ManualTriggerConfig, RuleEvaluator, RulePhase};
use crate::alerts::Alert;
use crate::domain::{Reading, VitalType};
use crate::history::PatientHistory;

const VITALS: [VitalType; 1] = [VitalType::ManualTrigger];

/// Fires for every reading equal to the trigger value
#[derive(Debug, Clone)]
pub struct ManualTriggerRule {
    config: ManualTriggerConfig,
}

impl ManualTriggerRule {
    pub fn new(config: ManualTriggerConfig) -> Self {
        Self { config }
    }
}

impl RuleEvaluator for ManualTriggerRule {
    fn name(&self) -> &'static str {
        "manual_trigger"
    }

    fn phase(&self) -> RulePhase {
        RulePhase::PerReading
    }

    fn vital_types(&self) -> &[VitalType] {
        &VITALS
    }

    fn evaluate(
        &self,
        ctx: &EvalContext,
        current: &Reading,
        _history: &PatientHistory,
    ) -> Option<Alert> {
        if current.value != self.config.trigger_value {
            return None;
        }
        let description = format!("Manual alert triggered for patient {}", ctx.patient_id);
        Some(ctx.alert(current, "ManualAlert", description))
    }
}
