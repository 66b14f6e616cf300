//! Evaluation engine
//!
//! Runs one evaluation pass per patient: pull readings, record them into the
//! patient's history, apply per-reading rules as each reading lands, then
//! apply windowed rules once against the latest reading of every vital type.

use crate::alerts::{Alert, AlertBus};
use crate::clock::{Clock, SystemClock};
use crate::data::PatientDataSource;
use crate::domain::{PatientId, Reading, Timestamp};
use crate::error::{AppError, DomainError};
use crate::history::{HistoryStore, PatientHistory};
use crate::rules::{EvalContext, RuleConfig, RulePhase, RuleRegistry};
use crate::sync::lock;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one evaluation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub patient_id: PatientId,
    pub generated_at: Timestamp,
    /// Readings handed to the pass
    pub readings_seen: usize,
    /// Readings that were new to the history
    pub readings_recorded: usize,
    /// Alerts produced by rules, duplicates included
    pub alerts_raised: usize,
    /// Alerts newly accepted by the bus
    pub alerts: Vec<Alert>,
}

impl EvaluationReport {
    fn new(patient_id: PatientId, generated_at: Timestamp) -> Self {
        Self {
            patient_id,
            generated_at,
            readings_seen: 0,
            readings_recorded: 0,
            alerts_raised: 0,
            alerts: Vec::new(),
        }
    }

    /// Number of alerts newly accepted by the bus
    pub fn alerts_accepted(&self) -> usize {
        self.alerts.len()
    }
}

/// Evaluation engine
pub struct EvaluationEngine {
    source: Arc<dyn PatientDataSource>,
    history: HistoryStore,
    registry: RuleRegistry,
    bus: Arc<AlertBus>,
    clock: Arc<dyn Clock>,
}

impl EvaluationEngine {
    /// Create an engine from explicit parts
    pub fn new(
        source: Arc<dyn PatientDataSource>,
        registry: RuleRegistry,
        bus: Arc<AlertBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            history: HistoryStore::new(),
            registry,
            bus,
            clock,
        }
    }

    /// Standard rules, a fresh bus and the system clock
    pub fn with_defaults(source: Arc<dyn PatientDataSource>) -> Self {
        Self::new(
            source,
            RuleRegistry::standard(&RuleConfig::default()),
            Arc::new(AlertBus::new()),
            Arc::new(SystemClock),
        )
    }

    /// Evaluate everything the data source holds for a patient
    pub fn evaluate(&self, patient_id: PatientId) -> Result<EvaluationReport, AppError> {
        let readings = self.source.readings_for(patient_id);
        self.evaluate_readings(patient_id, readings)
    }

    /// Evaluate an explicit batch of readings for a patient
    ///
    /// The patient's history stays locked for the whole pass and alerts are
    /// submitted as they are produced, so listeners must not start another
    /// pass for the same patient or query its history. See
    /// [`AlertListener`](crate::alerts::AlertListener).
    pub fn evaluate_readings(
        &self,
        patient_id: PatientId,
        mut readings: Vec<Reading>,
    ) -> Result<EvaluationReport, AppError> {
        if patient_id == 0 {
            return Err(DomainError::InvalidPatientId(patient_id).into());
        }
        let generated_at = self.clock.now_millis();
        if generated_at == 0 {
            return Err(DomainError::InvalidTimestamp(generated_at).into());
        }

        let ctx = EvalContext::new(patient_id, generated_at);
        let mut report = EvaluationReport::new(patient_id, generated_at);

        readings.retain(|r| {
            let ours = r.patient_id == patient_id;
            if !ours {
                log::warn!("Ignoring reading for patient {} in pass for {}", r.patient_id, patient_id);
            }
            ours
        });
        if readings.is_empty() {
            log::debug!("No readings for patient {}", patient_id);
            return Ok(report);
        }
        readings.sort_by_key(|r| r.timestamp);

        let handle = self.history.patient(patient_id);
        let mut history = lock(&handle);

        for reading in &readings {
            report.readings_seen += 1;
            if history.record(*reading) {
                report.readings_recorded += 1;
            }
            self.apply(RulePhase::PerReading, &ctx, reading, &history, &mut report)?;
        }

        for vital_type in history.vital_types() {
            let Some(current) = history.latest(vital_type).copied() else {
                continue;
            };
            self.apply(RulePhase::Windowed, &ctx, &current, &history, &mut report)?;
        }

        log::debug!(
            "Evaluated patient {}: {} reading(s), {} new, {} alert(s) raised, {} accepted",
            patient_id,
            report.readings_seen,
            report.readings_recorded,
            report.alerts_raised,
            report.alerts_accepted()
        );
        Ok(report)
    }

    fn apply(
        &self,
        phase: RulePhase,
        ctx: &EvalContext,
        current: &Reading,
        history: &PatientHistory,
        report: &mut EvaluationReport,
    ) -> Result<(), AppError> {
        for rule in self.registry.rules_for(current.vital_type, phase) {
            let Some(alert) = rule.evaluate(ctx, current, history) else {
                continue;
            };
            report.alerts_raised += 1;
            if self.bus.submit(alert.clone())? {
                report.alerts.push(alert);
            }
        }
        Ok(())
    }

    /// Patients known to the data source
    pub fn patients(&self) -> Vec<PatientId> {
        self.source.patients()
    }

    /// Accumulated reading history
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Alert bus alerts are submitted to
    pub fn bus(&self) -> &Arc<AlertBus> {
        &self.bus
    }

    /// Active rules
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }
}
