//! Rules command implementation
//!
//! Lists the rule set that evaluation would use.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, RuleList};
use crate::config::Config;
use crate::error::Result;
use crate::rules::RuleRegistry;

/// Execute the rules command
pub fn run_rules(config: &Config, format: OutputFormat) -> Result<()> {
    let registry = RuleRegistry::standard(&config.rules);
    print_output(&RuleList::new(&registry, &config.rules.thresholds), format)?;
    Ok(())
}
