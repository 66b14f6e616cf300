//! Domain models for vitalwatch
//!
//! This module contains the reading types shared by every layer.
//! Types are validated on construction where a checked constructor exists.

pub mod vital;

pub use vital::{PatientId, Reading, Timestamp, VitalType, MINUTE_MS};
