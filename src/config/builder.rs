//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::config::{Config, ConfigFile};
use crate::error::ConfigError;

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from an explicit file, or the default locations
    ///
    /// An explicit path must load; default locations are best effort.
    pub fn with_file(mut self, path: Option<&str>) -> Result<Self, ConfigError> {
        let file_config = match path {
            Some(path) => Some(ConfigFile::load(path)?),
            None => ConfigFile::load_default(),
        };

        if let Some(cfg) = file_config {
            self.config = cfg;
        }

        Ok(self)
    }

    /// Override with CLI verbose flag
    pub fn with_verbose(mut self, verbose: Option<bool>) -> Self {
        if let Some(v) = verbose {
            self.config.general.verbose = v;
        }
        self
    }

    /// Override with CLI worker count
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        if let Some(j) = jobs {
            self.config.general.jobs = j;
        }
        self
    }

    /// Override with CLI no-color flag
    pub fn with_color(mut self, color: Option<bool>) -> Self {
        if let Some(c) = color {
            self.config.output.color = c;
        }
        self
    }

    /// Disable additional rules by name
    pub fn with_disabled_rules(mut self, names: &[String]) -> Self {
        for name in names {
            if !self.config.rules.is_disabled(name) {
                self.config.rules.disabled.push(name.clone());
            }
        }
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Config> for ConfigBuilder {
    fn from(config: Config) -> Self {
        Self { config }
    }
}
