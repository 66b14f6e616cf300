//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::alerts::{Alert, AlertSeverity};
use crate::cli::args::OutputFormat;
use crate::domain::{PatientId, VitalType};
use crate::rules::{RuleRegistry, ThresholdBand};
use crate::services::BatchSummary;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// Patient whose pass failed
#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub patient_id: PatientId,
    pub error: String,
}

/// Result of an evaluate run
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutput {
    pub patients: usize,
    pub readings: usize,
    pub alerts: Vec<Alert>,
    pub by_severity: BTreeMap<AlertSeverity, usize>,
    pub failures: Vec<FailureEntry>,
}

impl EvaluationOutput {
    /// Collect accepted alerts at or above `min_severity`
    pub fn from_summary(summary: &BatchSummary, min_severity: AlertSeverity) -> Self {
        let alerts: Vec<Alert> = summary
            .reports
            .iter()
            .flat_map(|r| r.alerts.iter())
            .filter(|a| a.severity >= min_severity)
            .cloned()
            .collect();

        let mut by_severity = BTreeMap::new();
        for alert in &alerts {
            *by_severity.entry(alert.severity).or_insert(0) += 1;
        }

        Self {
            patients: summary.reports.len() + summary.failures.len(),
            readings: summary.readings_seen(),
            alerts,
            by_severity,
            failures: summary
                .failures
                .iter()
                .map(|(patient_id, e)| FailureEntry {
                    patient_id: *patient_id,
                    error: e.to_string(),
                })
                .collect(),
        }
    }
}

impl TableDisplay for EvaluationOutput {
    fn to_table(&self) -> String {
        let mut output = format!(
            "Patients: {}  Readings: {}  Alerts: {}\n",
            self.patients,
            self.readings,
            self.alerts.len()
        );

        if !self.by_severity.is_empty() {
            let counts: Vec<String> = self
                .by_severity
                .iter()
                .rev()
                .map(|(severity, count)| format!("{}: {}", severity, count))
                .collect();
            output.push_str(&format!("  {}\n", counts.join(", ")));
        }
        output.push('\n');

        for alert in &self.alerts {
            output.push_str(&format!("{}\n", alert));
        }

        for failure in &self.failures {
            output.push_str(&format!(
                "Patient {} failed: {}\n",
                failure.patient_id, failure.error
            ));
        }

        output
    }

    fn to_compact(&self) -> String {
        self.alerts
            .iter()
            .map(|a| format!("{}:{}:{}", a.patient_id, a.alert_type, a.generated_at))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One registered rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleEntry {
    pub name: String,
    pub phase: String,
    pub vitals: Vec<VitalType>,
}

/// Active rule set
#[derive(Debug, Clone, Serialize)]
pub struct RuleList {
    pub rules: Vec<RuleEntry>,
    pub thresholds: Vec<ThresholdBand>,
}

impl RuleList {
    pub fn new(registry: &RuleRegistry, thresholds: &[ThresholdBand]) -> Self {
        Self {
            rules: registry
                .rules()
                .map(|r| RuleEntry {
                    name: r.name().to_string(),
                    phase: r.phase().to_string(),
                    vitals: r.vital_types().to_vec(),
                })
                .collect(),
            thresholds: thresholds.to_vec(),
        }
    }
}

impl TableDisplay for RuleList {
    fn to_table(&self) -> String {
        let mut output = format!("Rules: {}\n", self.rules.len());

        for rule in &self.rules {
            let vitals: Vec<&str> = rule.vitals.iter().map(|v| v.label()).collect();
            output.push_str(&format!(
                "  {:<22} {:<12} {}\n",
                rule.name,
                rule.phase,
                vitals.join(", ")
            ));
        }

        if self.rules.iter().any(|r| r.name == "threshold") && !self.thresholds.is_empty() {
            output.push_str("\nThreshold bands:\n");
            for band in &self.thresholds {
                output.push_str(&format!(
                    "  {:<18} {:<6} {}\n",
                    band.vital.label(),
                    band.condition.to_string(),
                    band.alert_type
                ));
            }
        }

        output
    }

    fn to_compact(&self) -> String {
        self.rules
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Factory grading of a single value
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyOutput {
    pub vital: VitalType,
    pub value: f64,
    pub alert: Option<Alert>,
}

impl TableDisplay for ClassifyOutput {
    fn to_table(&self) -> String {
        match &self.alert {
            Some(alert) => format!("{}", alert),
            None => format!(
                "{} {}{}: no alert",
                self.vital.label(),
                self.value,
                self.vital.unit()
            ),
        }
    }

    fn to_compact(&self) -> String {
        self.alert
            .as_ref()
            .map_or_else(|| "none".to_string(), |a| a.alert_type.clone())
    }
}
