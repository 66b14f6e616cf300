//! Parallel evaluation over many patients

use super::engine::{EvaluationEngine, EvaluationReport};
use crate::domain::PatientId;
use crate::error::AppError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Results of a batch, ordered by patient id
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub reports: Vec<EvaluationReport>,
    pub failures: Vec<(PatientId, AppError)>,
}

impl BatchSummary {
    /// Total alerts newly accepted across the batch
    pub fn alerts_accepted(&self) -> usize {
        self.reports.iter().map(EvaluationReport::alerts_accepted).sum()
    }

    /// Total readings handed to the batch
    pub fn readings_seen(&self) -> usize {
        self.reports.iter().map(|r| r.readings_seen).sum()
    }
}

/// Evaluates patients across a fixed number of scoped worker threads
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    jobs: usize,
}

impl BatchRunner {
    /// `jobs` of zero means one worker per available CPU
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 {
            thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            jobs
        };
        Self { jobs }
    }

    /// Worker count
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Evaluate every patient the engine's data source knows
    pub fn run_all(&self, engine: &EvaluationEngine) -> BatchSummary {
        self.run(engine, &engine.patients())
    }

    /// Evaluate `patients`; a failing patient does not stop the others
    pub fn run(&self, engine: &EvaluationEngine, patients: &[PatientId]) -> BatchSummary {
        let next = &AtomicUsize::new(0);
        let workers = self.jobs.min(patients.len()).max(1);

        let mut results: Vec<(PatientId, Result<EvaluationReport, AppError>)> =
            thread::scope(|scope| {
                let handles: Vec<_> = (0..workers)
                    .map(|_| {
                        scope.spawn(move || {
                            let mut local = Vec::new();
                            loop {
                                let idx = next.fetch_add(1, Ordering::Relaxed);
                                let Some(&patient_id) = patients.get(idx) else {
                                    break;
                                };
                                local.push((patient_id, engine.evaluate(patient_id)));
                            }
                            local
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .flat_map(|handle| match handle.join() {
                        Ok(local) => local,
                        Err(_) => {
                            log::error!("Evaluation worker panicked");
                            Vec::new()
                        }
                    })
                    .collect()
            });

        results.sort_by_key(|(patient_id, _)| *patient_id);

        let mut summary = BatchSummary::default();
        for (patient_id, result) in results {
            match result {
                Ok(report) => summary.reports.push(report),
                Err(e) => {
                    log::warn!("Evaluation failed for patient {}: {}", patient_id, e);
                    summary.failures.push((patient_id, e));
                }
            }
        }

        log::debug!(
            "Batch of {} patient(s) on {} worker(s): {} alert(s) accepted",
            patients.len(),
            workers,
            summary.alerts_accepted()
        );
        summary
    }
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertBus;
    use crate::clock::ManualClock;
    use crate::data::InMemoryDataSource;
    use crate::domain::VitalType;
    use crate::rules::{RuleConfig, RuleRegistry};
    use std::sync::Arc;

    fn engine(source: Arc<InMemoryDataSource>) -> EvaluationEngine {
        EvaluationEngine::new(
            source,
            RuleRegistry::standard(&RuleConfig::default()),
            Arc::new(AlertBus::new()),
            Arc::new(ManualClock::new(500_000)),
        )
    }

    #[test]
    fn test_run_all_patients() {
        let source = Arc::new(InMemoryDataSource::new());
        for pid in 1..=20 {
            source.add(pid, 185.0, VitalType::SystolicPressure, 1000).unwrap();
            source.add(pid, 75.0, VitalType::HeartRate, 1000).unwrap();
        }
        let engine = engine(source);

        let summary = BatchRunner::new(4).run_all(&engine);
        assert!(summary.failures.is_empty());
        assert_eq!(summary.reports.len(), 20);
        assert_eq!(summary.alerts_accepted(), 20);
        assert_eq!(summary.readings_seen(), 40);

        let ids: Vec<_> = summary.reports.iter().map(|r| r.patient_id).collect();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
        assert_eq!(engine.bus().len(), 20);
    }

    #[test]
    fn test_failures_are_collected() {
        let source = Arc::new(InMemoryDataSource::new());
        source.add(1, 185.0, VitalType::SystolicPressure, 1000).unwrap();
        let engine = engine(source);

        let summary = BatchRunner::new(2).run(&engine, &[0, 1]);
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, 0);
    }

    #[test]
    fn test_empty_batch() {
        let engine = engine(Arc::new(InMemoryDataSource::new()));
        let summary = BatchRunner::new(3).run(&engine, &[]);
        assert!(summary.reports.is_empty());
    }

    #[test]
    fn test_zero_jobs_uses_available_parallelism() {
        assert!(BatchRunner::new(0).jobs() >= 1);
        assert_eq!(BatchRunner::new(3).jobs(), 3);
    }
}
