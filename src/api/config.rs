//! Auditor configuration.
//!
//! Settings are process-wide and stored in atomics so the hooks can read
//! them without locking or allocating. Stack depth and skip counts are
//! fixed; see [`MAX_FRAMES`](crate::debug::backtrace::MAX_FRAMES).

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether surviving allocations are reported at teardown.
static LEAK_REPORTS: AtomicBool = AtomicBool::new(true);

/// Whether reports resolve symbols or print raw addresses.
static SYMBOLIZE: AtomicBool = AtomicBool::new(true);

/// Environment switch for leak reports.
pub const ENV_LEAKS: &str = "MEMAUDIT_LEAKS";

/// Environment switch for symbolization.
pub const ENV_SYMBOLIZE: &str = "MEMAUDIT_SYMBOLIZE";

/// Configuration for the auditor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditConfig {
    /// Report allocations still live at teardown (default: true)
    pub report_leaks: bool,

    /// Resolve function names and source lines in reports (default: true)
    pub symbolize: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            report_leaks: true,
            symbolize: true,
        }
    }
}

impl AuditConfig {
    /// Config that keeps fatal reports but stays silent at teardown, with
    /// raw addresses only.
    pub fn quiet() -> Self {
        Self {
            report_leaks: false,
            symbolize: false,
        }
    }

    /// Builder pattern: enable leak reports.
    pub fn with_leak_reports(mut self, enable: bool) -> Self {
        self.report_leaks = enable;
        self
    }

    /// Builder pattern: enable symbolization.
    pub fn with_symbolize(mut self, enable: bool) -> Self {
        self.symbolize = enable;
        self
    }

    /// Apply the environment overrides on top of this config.
    ///
    /// Checks `MEMAUDIT_LEAKS` and `MEMAUDIT_SYMBOLIZE`:
    /// - "0", "off", "false", "no" -> disabled
    /// - "1", "on", "true", "yes" -> enabled
    /// - anything else leaves the value untouched
    pub fn with_env(mut self) -> Self {
        if let Some(on) = env_switch(ENV_LEAKS) {
            self.report_leaks = on;
        }
        if let Some(on) = env_switch(ENV_SYMBOLIZE) {
            self.symbolize = on;
        }
        self
    }
}

/// Install a configuration process-wide.
pub fn set_config(config: AuditConfig) {
    LEAK_REPORTS.store(config.report_leaks, Ordering::Relaxed);
    SYMBOLIZE.store(config.symbolize, Ordering::Relaxed);
}

/// Get the current process-wide configuration.
pub fn config() -> AuditConfig {
    AuditConfig {
        report_leaks: leak_reports_enabled(),
        symbolize: symbolize_enabled(),
    }
}

/// Check if leak reports are enabled.
pub fn leak_reports_enabled() -> bool {
    LEAK_REPORTS.load(Ordering::Relaxed)
}

/// Check if symbolization is enabled.
pub fn symbolize_enabled() -> bool {
    SYMBOLIZE.load(Ordering::Relaxed)
}

/// Apply environment overrides to the current configuration.
pub fn init_from_env() {
    set_config(config().with_env());
}

fn env_switch(name: &str) -> Option<bool> {
    let value = std::env::var_os(name)?;
    parse_switch(value.to_str()?)
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "0" | "off" | "false" | "no" => Some(false),
        "1" | "on" | "true" | "yes" => Some(true),
        _ => None,
    }
}
