//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::alerts::AlertSeverity;
use crate::error::ConfigError;
use crate::rules::RuleConfig;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Detection rule settings
    pub rules: RuleConfig,
    /// Alert output settings
    pub output: OutputConfig,
}

impl Config {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(format!("Failed to serialize: {}", e)))
    }
}

/// General configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,
    /// Evaluation worker threads; 0 picks one per CPU
    pub jobs: usize,
}

/// Alert output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Colorize severities on terminals that support it
    pub color: bool,
    /// Alerts below this severity are not printed
    pub min_severity: AlertSeverity,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            min_severity: AlertSeverity::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.general.verbose);
        assert_eq!(config.general.jobs, 0);
        assert_eq!(config.output.min_severity, AlertSeverity::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_keeps_rules() {
        let mut config = Config::default();
        config.rules.trend.min_delta = 15.0;
        config.rules.disabled = vec!["ecg_anomaly".to_string()];

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[rules.trend]"));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [general]
            jobs = 4

            [output]
            min_severity = "Critical"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.general.jobs, 4);
        assert_eq!(parsed.output.min_severity, AlertSeverity::Critical);
        assert!(parsed.output.color);
        assert_eq!(parsed.rules, RuleConfig::default());
    }
}
