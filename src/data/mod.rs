//! Patient data sources
//!
//! The engine pulls readings through [`PatientDataSource`]. The in-memory
//! source doubles as the ingestion target for [`FileDataReader`].

mod reader;

pub use reader::{FileDataReader, ReadSummary};

use crate::domain::{PatientId, Reading, Timestamp, VitalType};
use crate::error::DomainError;
use crate::sync::{read, write};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Where the engine gets readings from
pub trait PatientDataSource: Send + Sync {
    /// Every reading of a patient, in no particular order
    fn readings_for(&self, patient_id: PatientId) -> Vec<Reading>;

    /// Patients with at least one reading, ascending
    fn patients(&self) -> Vec<PatientId>;
}

/// Thread-safe in-memory reading store
#[derive(Debug, Default)]
pub struct InMemoryDataSource {
    records: RwLock<BTreeMap<PatientId, Vec<Reading>>>,
}

impl InMemoryDataSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a reading
    pub fn add(
        &self,
        patient_id: PatientId,
        value: f64,
        vital_type: VitalType,
        timestamp: Timestamp,
    ) -> Result<(), DomainError> {
        let reading = Reading::try_new(patient_id, vital_type, value, timestamp)?;
        self.add_reading(reading);
        Ok(())
    }

    /// Store an already-built reading
    pub fn add_reading(&self, reading: Reading) {
        write(&self.records)
            .entry(reading.patient_id)
            .or_default()
            .push(reading);
    }

    /// Readings of a patient with `start <= timestamp <= end`, oldest first
    pub fn records(&self, patient_id: PatientId, start: Timestamp, end: Timestamp) -> Vec<Reading> {
        let mut matching: Vec<Reading> = read(&self.records)
            .get(&patient_id)
            .into_iter()
            .flatten()
            .filter(|r| r.timestamp >= start && r.timestamp <= end)
            .copied()
            .collect();
        matching.sort_by_key(|r| r.timestamp);
        matching
    }

    /// Remove one patient's readings
    pub fn clear_patient(&self, patient_id: PatientId) -> bool {
        write(&self.records).remove(&patient_id).is_some()
    }

    /// Remove everything
    pub fn clear(&self) {
        write(&self.records).clear();
    }

    /// Total number of stored readings
    pub fn len(&self) -> usize {
        read(&self.records).values().map(Vec::len).sum()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PatientDataSource for InMemoryDataSource {
    fn readings_for(&self, patient_id: PatientId) -> Vec<Reading> {
        read(&self.records)
            .get(&patient_id)
            .cloned()
            .unwrap_or_default()
    }

    fn patients(&self) -> Vec<PatientId> {
        read(&self.records).keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_validates() {
        let source = InMemoryDataSource::new();
        assert!(source.add(1, 120.0, VitalType::SystolicPressure, 1000).is_ok());
        assert_eq!(
            source.add(0, 120.0, VitalType::SystolicPressure, 1000),
            Err(DomainError::InvalidPatientId(0))
        );
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_records_time_range() {
        let source = InMemoryDataSource::new();
        for ts in [3000, 1000, 2000, 4000] {
            source.add(1, 70.0, VitalType::HeartRate, ts).unwrap();
        }

        let ts: Vec<_> = source
            .records(1, 2000, 3000)
            .iter()
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(ts, vec![2000, 3000]);
        assert!(source.records(2, 0, u64::MAX).is_empty());
    }

    #[test]
    fn test_patients_and_clear() {
        let source = InMemoryDataSource::new();
        source.add(3, 70.0, VitalType::HeartRate, 1000).unwrap();
        source.add(1, 70.0, VitalType::HeartRate, 1000).unwrap();
        assert_eq!(source.patients(), vec![1, 3]);

        assert!(source.clear_patient(3));
        assert_eq!(source.patients(), vec![1]);

        source.clear();
        assert!(source.is_empty());
        assert!(source.readings_for(1).is_empty());
    }
}
