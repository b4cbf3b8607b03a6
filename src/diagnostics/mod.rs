//! Diagnostics for invalid frees and leaks.
//!
//! This module provides:
//! - **Diagnostic codes**: stable identifiers for each finding
//! - **Reports**: the separator-delimited text blocks written to stderr
//! - **Sinks**: stderr, log, or collecting backends
//!
//! ## Diagnostic Codes
//!
//! | Code  | Meaning                                   |
//! |-------|-------------------------------------------|
//! | MA101 | Free of memory no entry point returned    |
//! | MA102 | Free through the wrong kind's entry point |
//! | MA201 | Allocation still live at teardown         |

pub mod emit;
pub mod kind;
pub mod report;

pub use emit::{CollectedReport, CollectingSink, DiagnosticSink, StderrSink};
pub use kind::{Diagnostic, DiagnosticKind, MA101, MA102, MA201};
pub use report::{Report, SEPARATOR};

#[cfg(feature = "log")]
pub use emit::emit_to_log;
