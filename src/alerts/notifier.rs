//! Alert notification channels
//!
//! Listeners that print alerts to the console and route alerts to a listener
//! only for the patients it is assigned to.

use super::bus::AlertListener;
use super::types::{Alert, AlertSeverity, PatientFilter};
use crate::error::ListenerError;
use std::io::{self, Write};
use std::sync::Arc;

/// Terminal/console notifier
///
/// Outputs alerts to stdout/stderr with colored formatting
pub struct TerminalNotifier {
    /// Use stderr instead of stdout
    use_stderr: bool,
    /// Use colors (ANSI escape codes)
    use_colors: bool,
}

impl TerminalNotifier {
    /// Create a new terminal notifier
    pub fn new() -> Self {
        Self {
            use_stderr: true,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a notifier that uses stdout
    pub fn stdout() -> Self {
        Self {
            use_stderr: false,
            use_colors: Self::supports_color(),
        }
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.use_colors = false;
        self
    }

    fn supports_color() -> bool {
        std::env::var_os("NO_COLOR").is_none()
            && std::env::var("TERM")
                .map(|term| term != "dumb")
                .unwrap_or(false)
    }

    /// Format alert as a single line
    pub fn format_alert(&self, alert: &Alert) -> String {
        let secs = alert.generated_at / 1000;
        let clock = format!(
            "{:02}:{:02}:{:02}",
            (secs / 3600) % 24,
            (secs % 3600) / 60,
            secs % 60
        );

        format!(
            "[{}] {} patient {} {}: {}",
            clock,
            self.format_severity(alert.severity),
            alert.patient_id,
            alert.alert_type,
            alert.description
        )
    }

    fn format_severity(&self, severity: AlertSeverity) -> String {
        if !self.use_colors {
            return severity.to_string();
        }

        let color_code = match severity {
            AlertSeverity::Info => "\x1b[36m",
            AlertSeverity::Warning => "\x1b[33m",
            AlertSeverity::Critical => "\x1b[31m",
            AlertSeverity::Emergency => "\x1b[35m\x1b[1m",
        };

        format!("{}{}\x1b[0m", color_code, severity)
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertListener for TerminalNotifier {
    fn on_alert(&self, alert: &Alert) -> Result<(), ListenerError> {
        let message = self.format_alert(alert);

        let written = if self.use_stderr {
            writeln!(io::stderr().lock(), "{}", message)
        } else {
            writeln!(io::stdout().lock(), "{}", message)
        };

        written.map_err(|e| ListenerError::new(self.name(), e.to_string()))
    }

    fn name(&self) -> &str {
        "terminal"
    }
}

/// Forwards alerts to `inner` only for patients matching `filter`
pub struct FilteredListener {
    filter: PatientFilter,
    inner: Arc<dyn AlertListener>,
}

impl FilteredListener {
    pub fn new(filter: PatientFilter, inner: Arc<dyn AlertListener>) -> Self {
        Self { filter, inner }
    }

    /// Current patient assignment
    pub fn filter(&self) -> &PatientFilter {
        &self.filter
    }
}

impl AlertListener for FilteredListener {
    fn on_alert(&self, alert: &Alert) -> Result<(), ListenerError> {
        if self.filter.matches(alert.patient_id) {
            self.inner.on_alert(alert)
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
