//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use crate::alerts::AlertSeverity;
use crate::domain::VitalType;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Vital-sign alerting tool
///
/// Evaluate patient readings against detection rules and report alerts.
#[derive(Parser, Debug)]
#[command(name = "vitalwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VITALWATCH_CONFIG")]
    pub config: Option<String>,

    /// Disable colored severities
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate readings from data files
    ///
    /// Each patient's readings are evaluated in a single pass. Threshold and
    /// manual-trigger rules see every reading. Windowed rules (trend, rapid
    /// change, saturation drop, hypotensive hypoxemia, ECG anomaly) run once,
    /// against the latest reading of each vital type, so a transient event in
    /// the middle of a file is not reported. Split the input by time to
    /// evaluate earlier windows.
    Evaluate(EvaluateArgs),

    /// List the active detection rules
    Rules,

    /// Grade a single value with the alert factories
    Classify(ClassifyArgs),

    /// Print the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the evaluate command
#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Data file or directory of .txt/.csv files
    #[arg(short, long)]
    pub input: PathBuf,

    /// Evaluate only this patient
    #[arg(short, long)]
    pub patient: Option<u32>,

    /// Worker threads (0 = one per CPU)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Evaluation time in milliseconds since the epoch (defaults to now)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub at: Option<u64>,

    /// Only report alerts at or above this severity
    #[arg(long, value_enum)]
    pub min_severity: Option<SeverityArg>,

    /// Disable a rule by name (repeatable)
    #[arg(long = "disable-rule", value_name = "RULE")]
    pub disabled_rules: Vec<String>,

    /// Print alerts to stderr as soon as they are accepted
    #[arg(long)]
    pub notify: bool,
}

/// Arguments for the classify command
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Vital type (SystolicPressure, DiastolicPressure, BloodSaturation, ...)
    #[arg(long)]
    pub vital: VitalType,

    /// Measured value
    #[arg(long, allow_negative_numbers = true)]
    pub value: f64,

    /// Patient id to attribute the reading to
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub patient: u32,

    /// Preceding ECG values, oldest first (comma-separated)
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub baseline: Vec<f64>,
}

/// Severity argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityArg {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl From<SeverityArg> for AlertSeverity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => AlertSeverity::Info,
            SeverityArg::Warning => AlertSeverity::Warning,
            SeverityArg::Critical => AlertSeverity::Critical,
            SeverityArg::Emergency => AlertSeverity::Emergency,
        }
    }
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
