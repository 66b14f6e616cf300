//! Unified error types for vitalwatch
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from alert construction or submission
    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from domain type validation
    #[error("Domain validation error: {0}")]
    Domain(#[from] DomainError),

    /// Error from reading patient data
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Patient not present in the data source
    #[error("Patient not found: {0}")]
    PatientNotFound(u32),

    /// The data source produced no patients at all
    #[error("No patient readings found")]
    NoPatientsFound,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the alert bus and alert factories
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    /// A call violated the public contract (absent alert, unsupported type, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failure raised inside an alert listener
///
/// Never propagated to the submitter; the bus logs it and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Listener '{listener}' failed: {message}")]
pub struct ListenerError {
    pub listener: String,
    pub message: String,
}

impl ListenerError {
    pub fn new(listener: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            listener: listener.into(),
            message: message.into(),
        }
    }
}

/// Errors from domain type validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Patient ids are positive integers
    #[error("Invalid patient id: {0} (must be positive)")]
    InvalidPatientId(u32),

    /// Timestamps are milliseconds since the epoch and must be positive
    #[error("Invalid timestamp: {0} (must be positive)")]
    InvalidTimestamp(u64),

    /// Label does not name a known vital type
    #[error("Unknown vital type: {0}")]
    UnknownVitalType(String),

    /// Numeric field could not be interpreted
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Errors from reading patient data files
#[derive(Error, Debug)]
pub enum DataError {
    /// Input path does not exist
    #[error("Input not found: {0}")]
    InputNotFound(String),

    /// A line could not be parsed
    #[error("Malformed line {line} in {file}: {message}")]
    MalformedLine {
        file: String,
        line: usize,
        message: String,
    },

    /// IO error while reading input
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Failed to parse config file
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
