//! Config command implementation
//!
//! Prints the effective configuration after file and CLI merging.

use crate::cli::args::OutputFormat;
use crate::config::Config;
use crate::error::{ConfigError, Result};

/// Execute the config command
pub fn run_config(config: &Config, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(config).map_err(ConfigError::from)?,
        OutputFormat::Table | OutputFormat::Compact => config.to_toml()?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
