//! Diagnostic kinds and core types.
//!
//! Mirrors rustc's diagnostic levels for familiar UX.

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A hard error - the process is terminated after reporting it.
    Error,
    /// A warning - reported, execution continues.
    Warning,
}

impl DiagnosticKind {
    /// Get the display prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
        }
    }
}

/// A diagnostic descriptor with code, message, and optional help.
///
/// Diagnostic codes follow the pattern:
/// - `MA1xx` - Invalid frees (fatal)
/// - `MA2xx` - Teardown findings
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Diagnostic code (e.g., "MA101").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code,
            message,
            help: None,
        }
    }

    /// Create a new warning diagnostic.
    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code,
            message,
            help: None,
        }
    }

    /// Add a help message to this diagnostic.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// =============================================================================
// Predefined diagnostics (MA1xx - Invalid frees)
// =============================================================================

/// MA101: Free of an address no entry point ever returned.
pub const MA101: Diagnostic = Diagnostic::error(
    "MA101",
    "invalid memory freed"
).with_help("only pass addresses returned by alloc_scalar/alloc_vector, and free each one once");

/// MA102: Free through the wrong kind's entry point.
pub const MA102: Diagnostic = Diagnostic::error(
    "MA102",
    "invalid memory freed (allocation kind mismatch)"
).with_help("pair alloc_scalar with free_scalar and alloc_vector with free_vector");

// =============================================================================
// Predefined diagnostics (MA2xx - Teardown)
// =============================================================================

/// MA201: Allocation still live when the registry was torn down.
pub const MA201: Diagnostic = Diagnostic::warning(
    "MA201",
    "memory leak"
);
