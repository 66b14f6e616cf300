//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod classify;
pub mod config;
pub mod evaluate;
pub mod rules;

pub use classify::run_classify;
pub use config::run_config;
pub use evaluate::run_evaluate;
pub use rules::run_rules;
