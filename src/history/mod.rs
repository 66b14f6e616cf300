//! Per-patient reading history
//!
//! Append-only, time-ordered buffers keyed by (patient, vital type). There is
//! no eviction; rules bound their work with last-N or trailing-duration
//! windows instead.

use crate::domain::{PatientId, Reading, Timestamp, VitalType};
use crate::sync::{lock, read, write};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// History of a single patient, one sorted series per vital type
#[derive(Debug, Clone, Default)]
pub struct PatientHistory {
    patient_id: PatientId,
    series: HashMap<VitalType, Vec<Reading>>,
}

impl PatientHistory {
    /// Create an empty history
    pub fn new(patient_id: PatientId) -> Self {
        Self {
            patient_id,
            series: HashMap::new(),
        }
    }

    /// Patient this history belongs to
    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    /// Record a reading, keeping its series sorted by timestamp.
    ///
    /// Returns `false` when an identical sample is already stored, which is
    /// what happens when a patient's batch is replayed.
    pub fn record(&mut self, reading: Reading) -> bool {
        let series = self.series.entry(reading.vital_type).or_default();
        let pos = series.partition_point(|r| r.timestamp <= reading.timestamp);

        let duplicate = series[..pos]
            .iter()
            .rev()
            .take_while(|r| r.timestamp == reading.timestamp)
            .any(|r| r.same_sample(&reading));
        if duplicate {
            log::trace!("Skipping duplicate reading: {}", reading);
            return false;
        }

        if pos == series.len() {
            series.push(reading);
        } else {
            series.insert(pos, reading);
        }
        true
    }

    /// All readings of one type, oldest first
    pub fn readings(&self, vital_type: VitalType) -> &[Reading] {
        self.series
            .get(&vital_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Most recent reading of one type
    pub fn latest(&self, vital_type: VitalType) -> Option<&Reading> {
        self.readings(vital_type).last()
    }

    /// Last `n` readings of one type (fewer if unavailable), oldest first
    pub fn window_last_n(&self, vital_type: VitalType, n: usize) -> &[Reading] {
        let series = self.readings(vital_type);
        &series[series.len().saturating_sub(n)..]
    }

    /// Readings with timestamp in `[from - duration_ms, from]`, oldest first
    pub fn window_duration(
        &self,
        vital_type: VitalType,
        from: Timestamp,
        duration_ms: u64,
    ) -> &[Reading] {
        let series = self.readings(vital_type);
        let start = from.saturating_sub(duration_ms);
        let lo = series.partition_point(|r| r.timestamp < start);
        let hi = series.partition_point(|r| r.timestamp <= from);
        &series[lo..hi.max(lo)]
    }

    /// Readings ordered strictly before `current` in its own series.
    ///
    /// If `current` was never recorded, everything up to its timestamp counts
    /// as prior.
    pub fn preceding(&self, current: &Reading) -> &[Reading] {
        let series = self.readings(current.vital_type);
        let hi = series.partition_point(|r| r.timestamp <= current.timestamp);

        let mut idx = hi;
        while idx > 0 && series[idx - 1].timestamp == current.timestamp {
            if series[idx - 1].same_sample(current) {
                return &series[..idx - 1];
            }
            idx -= 1;
        }
        &series[..hi]
    }

    /// Vital types with at least one reading, in `VitalType::ALL` order
    pub fn vital_types(&self) -> Vec<VitalType> {
        VitalType::ALL
            .into_iter()
            .filter(|vt| !self.readings(*vt).is_empty())
            .collect()
    }

    /// Number of readings of one type
    pub fn len(&self, vital_type: VitalType) -> usize {
        self.readings(vital_type).len()
    }

    /// Number of readings across all types
    pub fn total_len(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    /// Whether no readings have been recorded
    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }
}

/// Shared history for all patients
///
/// Different patients are updated concurrently; each patient's history sits
/// behind its own mutex, which an evaluation pass holds for its duration.
#[derive(Debug, Default)]
pub struct HistoryStore {
    patients: RwLock<HashMap<PatientId, Arc<Mutex<PatientHistory>>>>,
}

impl HistoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to a patient's history, created on first use
    pub fn patient(&self, patient_id: PatientId) -> Arc<Mutex<PatientHistory>> {
        if let Some(history) = read(&self.patients).get(&patient_id) {
            return Arc::clone(history);
        }
        let mut patients = write(&self.patients);
        Arc::clone(
            patients
                .entry(patient_id)
                .or_insert_with(|| Arc::new(Mutex::new(PatientHistory::new(patient_id)))),
        )
    }

    fn existing(&self, patient_id: PatientId) -> Option<Arc<Mutex<PatientHistory>>> {
        read(&self.patients).get(&patient_id).map(Arc::clone)
    }

    /// Append a reading to its patient's series
    pub fn record(&self, reading: Reading) -> bool {
        let history = self.patient(reading.patient_id);
        let mut history = lock(&history);
        history.record(reading)
    }

    /// Last `n` readings of one type for a patient, oldest first
    pub fn window_last_n(
        &self,
        patient_id: PatientId,
        vital_type: VitalType,
        n: usize,
    ) -> Vec<Reading> {
        self.existing(patient_id)
            .map(|h| lock(&h).window_last_n(vital_type, n).to_vec())
            .unwrap_or_default()
    }

    /// Readings of one type within `[from - duration_ms, from]`
    pub fn window_duration(
        &self,
        patient_id: PatientId,
        vital_type: VitalType,
        from: Timestamp,
        duration_ms: u64,
    ) -> Vec<Reading> {
        self.existing(patient_id)
            .map(|h| lock(&h).window_duration(vital_type, from, duration_ms).to_vec())
            .unwrap_or_default()
    }

    /// Number of readings of one type for a patient
    pub fn len(&self, patient_id: PatientId, vital_type: VitalType) -> usize {
        self.existing(patient_id)
            .map(|h| lock(&h).len(vital_type))
            .unwrap_or(0)
    }

    /// Patients with a history, ascending
    pub fn patients(&self) -> Vec<PatientId> {
        let mut ids: Vec<_> = read(&self.patients).keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Drop a patient's history entirely
    pub fn clear_patient(&self, patient_id: PatientId) -> bool {
        write(&self.patients).remove(&patient_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hr(value: f64, ts: Timestamp) -> Reading {
        Reading::new(1, VitalType::HeartRate, value, ts)
    }

    #[test]
    fn test_record_keeps_order() {
        let mut history = PatientHistory::new(1);
        assert!(history.record(hr(70.0, 1000)));
        assert!(history.record(hr(72.0, 3000)));
        assert!(history.record(hr(71.0, 2000)));

        let ts: Vec<_> = history
            .readings(VitalType::HeartRate)
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(ts, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_record_skips_replayed_sample() {
        let mut history = PatientHistory::new(1);
        assert!(history.record(hr(70.0, 1000)));
        assert!(history.record(hr(72.0, 2000)));
        assert!(!history.record(hr(70.0, 1000)));
        assert!(!history.record(hr(72.0, 2000)));
        // Same timestamp, different value is a distinct sample
        assert!(history.record(hr(73.0, 2000)));
        assert_eq!(history.len(VitalType::HeartRate), 3);
    }

    #[test]
    fn test_window_last_n() {
        let mut history = PatientHistory::new(1);
        for i in 1..=5 {
            history.record(hr(60.0 + i as f64, i * 1000));
        }

        let last = history.window_last_n(VitalType::HeartRate, 3);
        assert_eq!(last.len(), 3);
        assert_eq!(last[0].value, 63.0);
        assert_eq!(last[2].value, 65.0);

        assert_eq!(history.window_last_n(VitalType::HeartRate, 10).len(), 5);
        assert!(history.window_last_n(VitalType::Ecg, 3).is_empty());
    }

    #[test]
    fn test_window_duration_is_inclusive() {
        let mut history = PatientHistory::new(1);
        for ts in [1000, 2000, 3000, 4000, 5000] {
            history.record(hr(70.0, ts));
        }

        let window = history.window_duration(VitalType::HeartRate, 4000, 2000);
        let ts: Vec<_> = window.iter().map(|r| r.timestamp).collect();
        assert_eq!(ts, vec![2000, 3000, 4000]);

        // Window reaching before the epoch saturates at zero
        assert_eq!(
            history
                .window_duration(VitalType::HeartRate, 1500, 10_000)
                .len(),
            1
        );
    }

    #[test]
    fn test_preceding_excludes_current() {
        let mut history = PatientHistory::new(1);
        let readings = [hr(70.0, 1000), hr(80.0, 2000), hr(90.0, 3000)];
        for r in readings {
            history.record(r);
        }

        let prior = history.preceding(&readings[2]);
        assert_eq!(prior.len(), 2);
        assert_eq!(prior[1].value, 80.0);

        assert!(history.preceding(&readings[0]).is_empty());

        // Unrecorded reading: everything up to its timestamp is prior
        let probe = hr(100.0, 2500);
        assert_eq!(history.preceding(&probe).len(), 2);
    }

    #[test]
    fn test_vital_types_in_enum_order() {
        let mut history = PatientHistory::new(1);
        history.record(Reading::new(1, VitalType::Ecg, 0.5, 1000));
        history.record(Reading::new(1, VitalType::SystolicPressure, 120.0, 1000));

        assert_eq!(
            history.vital_types(),
            vec![VitalType::SystolicPressure, VitalType::Ecg]
        );
        assert_eq!(history.total_len(), 2);
    }

    #[test]
    fn test_store_missing_patient_is_empty() {
        let store = HistoryStore::new();
        assert!(store.window_last_n(9, VitalType::HeartRate, 3).is_empty());
        assert!(store
            .window_duration(9, VitalType::HeartRate, 1000, 1000)
            .is_empty());
        assert_eq!(store.len(9, VitalType::HeartRate), 0);
        assert!(store.patients().is_empty());
    }

    #[test]
    fn test_store_record_and_query() {
        let store = HistoryStore::new();
        store.record(Reading::new(2, VitalType::HeartRate, 70.0, 1000));
        store.record(Reading::new(1, VitalType::HeartRate, 75.0, 1000));
        store.record(Reading::new(1, VitalType::HeartRate, 76.0, 2000));

        assert_eq!(store.patients(), vec![1, 2]);
        assert_eq!(store.len(1, VitalType::HeartRate), 2);
        assert_eq!(store.window_last_n(1, VitalType::HeartRate, 1)[0].value, 76.0);

        assert!(store.clear_patient(2));
        assert_eq!(store.patients(), vec![1]);
    }

    #[test]
    fn test_store_concurrent_patients() {
        let store = Arc::new(HistoryStore::new());
        let handles: Vec<_> = (1..=8u32)
            .map(|pid| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for ts in 1..=100u64 {
                        store.record(Reading::new(pid, VitalType::HeartRate, 70.0, ts));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.patients().len(), 8);
        for pid in 1..=8 {
            assert_eq!(store.len(pid, VitalType::HeartRate), 100);
        }
    }
}
