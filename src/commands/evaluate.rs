//! Evaluate command implementation
//!
//! Loads readings from disk and runs them through the rule engine.

use crate::alerts::{AlertBus, FilteredListener, PatientFilter, TerminalNotifier};
use crate::cli::args::{EvaluateArgs, OutputFormat};
use crate::cli::output::{print_output, EvaluationOutput};
use crate::clock::{Clock, ManualClock, SystemClock};
use crate::config::{Config, ConfigBuilder};
use crate::data::{FileDataReader, InMemoryDataSource, PatientDataSource};
use crate::error::{AppError, Result};
use crate::rules::RuleRegistry;
use crate::services::{BatchRunner, EvaluationEngine};
use std::sync::Arc;

/// Execute the evaluate command
pub fn run_evaluate(args: &EvaluateArgs, config: Config, format: OutputFormat) -> Result<()> {
    let config = ConfigBuilder::from(config)
        .with_jobs(args.jobs)
        .with_disabled_rules(&args.disabled_rules)
        .build();
    config.validate()?;

    let source = Arc::new(InMemoryDataSource::new());
    FileDataReader::new(&args.input).read_into(&source)?;

    let patients = match args.patient {
        Some(id) if source.patients().contains(&id) => vec![id],
        Some(id) => return Err(AppError::PatientNotFound(id)),
        None => source.patients(),
    };
    if patients.is_empty() {
        return Err(AppError::NoPatientsFound);
    }

    let clock: Arc<dyn Clock> = match args.at {
        Some(at) => Arc::new(ManualClock::new(at)),
        None => Arc::new(SystemClock),
    };

    let bus = Arc::new(AlertBus::new());
    if args.notify {
        let notifier = if config.output.color {
            TerminalNotifier::new()
        } else {
            TerminalNotifier::new().without_color()
        };
        let filter = args.patient.map_or(PatientFilter::All, PatientFilter::Id);
        bus.add_listener(Arc::new(FilteredListener::new(filter, Arc::new(notifier))));
    }

    let engine = EvaluationEngine::new(
        source,
        RuleRegistry::standard(&config.rules),
        bus,
        clock,
    );
    let runner = BatchRunner::new(config.general.jobs);
    log::debug!(
        "Evaluating {} patient(s) with {} rule(s) on {} worker(s)",
        patients.len(),
        engine.registry().len(),
        runner.jobs()
    );

    let summary = runner.run(&engine, &patients);
    let min_severity = args
        .min_severity
        .map(Into::into)
        .unwrap_or(config.output.min_severity);

    print_output(&EvaluationOutput::from_summary(&summary, min_severity), format)?;
    Ok(())
}
