//! vitalwatch - vital-sign rule evaluation and alerting library
//!
//! This library provides per-patient reading history, a battery of detection
//! rules, and a thread-safe alert bus that deduplicates alerts and notifies
//! listeners.
//!
//! # Modules
//!
//! - [`alerts`]: Alert types, bus, listeners, factories
//! - [`cli`]: Command-line interface definitions
//! - [`clock`]: Injectable time source
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`data`]: Patient data sources and file ingestion
//! - [`domain`]: Domain models with validation
//! - [`error`]: Error types
//! - [`history`]: Per-patient reading history
//! - [`rules`]: Detection rules and registry
//! - [`services`]: Evaluation engine and batch runner

pub mod alerts;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod history;
pub mod rules;
pub mod services;

pub(crate) mod sync;

#[cfg(test)]
pub mod mock;

pub use error::{AppError, Result};
