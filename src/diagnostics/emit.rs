//! Diagnostic emission backend.
//!
//! Handles outputting reports to stderr, logs, or custom sinks.

use std::io::Write;

use super::kind::DiagnosticKind;
use super::report::Report;
use crate::sync::mutex::Mutex;

/// A diagnostic sink trait for custom output.
pub trait DiagnosticSink: Send + Sync {
    /// Handle a report.
    fn emit(&self, report: &Report<'_>);
}

/// Writes report blocks to the process's stderr.
///
/// Write errors are ignored: there is nowhere left to report them.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn emit(&self, report: &Report<'_>) {
        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        let _ = write!(out, "{}", report);
        let _ = out.flush();
    }
}

/// Emit a report using the log crate (if available).
#[cfg(feature = "log")]
pub fn emit_to_log(report: &Report<'_>) {
    let diag = report.diagnostic();
    match diag.kind {
        DiagnosticKind::Error => {
            log::error!("[{}] {} at {:#x}", diag.code, diag.message, report.address());
        }
        DiagnosticKind::Warning => match report.size() {
            Some(size) => log::warn!("[{}] {}: {} bytes at {:#x}", diag.code, diag.message, size, report.address()),
            None => log::warn!("[{}] {} at {:#x}", diag.code, diag.message, report.address()),
        },
    }
}

/// A report captured by [`CollectingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedReport {
    /// Diagnostic code (e.g., "MA201").
    pub code: &'static str,
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Address the report is about.
    pub address: usize,
    /// Size in bytes, for leaks.
    pub size: Option<usize>,
    /// The rendered text block.
    pub text: String,
}

/// A simple sink that collects reports.
pub struct CollectingSink {
    reports: Mutex<Vec<CollectedReport>>,
}

impl CollectingSink {
    /// Create a new collecting sink.
    pub fn new() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected reports.
    pub fn reports(&self) -> Vec<CollectedReport> {
        self.reports.lock().clone()
    }

    /// Clear collected reports.
    pub fn clear(&self) {
        self.reports.lock().clear();
    }

    /// Check if any errors were collected.
    pub fn has_errors(&self) -> bool {
        self.reports.lock().iter().any(|r| r.kind == DiagnosticKind::Error)
    }
}

impl Default for CollectingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, report: &Report<'_>) {
        let diag = report.diagnostic();
        self.reports.lock().push(CollectedReport {
            code: diag.code,
            kind: diag.kind,
            address: report.address(),
            size: report.size(),
            text: report.to_string(),
        });
    }
}
