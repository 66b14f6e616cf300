//! Classify command implementation
//!
//! Grades one value with the alert factories. ECG values are compared with
//! the `--baseline` values using the configured anomaly window.

use crate::alerts::AlertFactory;
use crate::cli::args::{ClassifyArgs, OutputFormat};
use crate::cli::output::{print_output, ClassifyOutput};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::domain::{Reading, VitalType};
use crate::error::Result;

/// Execute the classify command
pub fn run_classify(args: &ClassifyArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let factory =
        AlertFactory::for_vital(args.vital)?.with_ecg_config(&config.rules.ecg_anomaly);
    let now = SystemClock.now_millis();
    let reading = Reading::try_new(args.patient, args.vital, args.value, now)?;

    if !args.baseline.is_empty() && args.vital != VitalType::Ecg {
        log::warn!("--baseline is only used for ECG values; ignoring it");
    }
    let alert = factory.create_alert_with_baseline(args.patient, &reading, &args.baseline, now)?;
    print_output(
        &ClassifyOutput {
            vital: args.vital,
            value: args.value,
            alert,
        },
        format,
    )?;
    Ok(())
}
