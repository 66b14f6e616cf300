//! Service layer for patient evaluation
//!
//! The engine runs single-patient passes; the batch runner fans passes out
//! over worker threads.

pub mod batch;
pub mod engine;

pub use batch::{BatchRunner, BatchSummary};
pub use engine::{EvaluationEngine, EvaluationReport};
