//! Report blocks written for invalid frees and leaks.
//!
//! Each report renders as a text block between two separator lines, so
//! several reports in a row stay readable on a shared stderr.

use std::fmt;

use crate::api::error::FreeError;
use crate::api::kind::AllocKind;
use crate::core::registry::AllocationRecord;
use crate::debug::backtrace::StackTrace;
use crate::diagnostics::kind::{Diagnostic, MA201};

/// Line delimiting every report block.
pub const SEPARATOR: &str = "-----------------------------------------------------------------";

/// A finding ready to be emitted to a sink.
#[derive(Debug)]
pub enum Report<'a> {
    /// A deallocation that matched no live allocation of its kind.
    InvalidFree {
        /// The verdict returned by the auditor.
        error: &'a FreeError,
        /// Call stack of the failing deallocation.
        trace: &'a StackTrace,
    },
    /// An allocation still live at teardown.
    Leak {
        /// Registry the record was found in.
        kind: AllocKind,
        /// The surviving record.
        record: &'a AllocationRecord,
    },
}

impl Report<'_> {
    /// The diagnostic descriptor for this report.
    pub fn diagnostic(&self) -> &'static Diagnostic {
        match self {
            Report::InvalidFree { error, .. } => error.diagnostic(),
            Report::Leak { .. } => &MA201,
        }
    }

    /// The address the report is about.
    pub fn address(&self) -> usize {
        match self {
            Report::InvalidFree { error, .. } => error.address,
            Report::Leak { record, .. } => record.address(),
        }
    }

    /// Size in bytes, known for leaks only.
    pub fn size(&self) -> Option<usize> {
        match self {
            Report::InvalidFree { .. } => None,
            Report::Leak { record, .. } => Some(record.size()),
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let diag = self.diagnostic();
        writeln!(f, "{}", SEPARATOR)?;

        match self {
            Report::InvalidFree { error, trace } => {
                writeln!(
                    f,
                    "[memaudit][{}] {}: Invalid memory freed at {:#x}",
                    diag.code,
                    diag.kind.prefix(),
                    error.address
                )?;
                if let Some(actual) = error.allocated_as {
                    writeln!(
                        f,
                        "\tNote: this memory was allocated by {}: allocated as {actual}, \
                         should be freed as {actual} ({}), not {} ({})",
                        actual.alloc_fn(),
                        actual.free_fn(),
                        error.freed_as,
                        error.freed_as.free_fn(),
                    )?;
                }
                if let Some(help) = diag.help {
                    writeln!(f, "  help: {}", help)?;
                }
                writeln!(f, "Freed at:")?;
                write!(f, "{}", trace)?;
            }
            Report::Leak { kind, record } => {
                writeln!(
                    f,
                    "[memaudit][{}] {}: Memory leak! {} bytes at {:#x}. Memory was allocated as {} in",
                    diag.code,
                    diag.kind.prefix(),
                    record.size(),
                    record.address(),
                    kind
                )?;
                write!(f, "{}", record.trace())?;
            }
        }

        writeln!(f, "{}", SEPARATOR)?;
        writeln!(f)
    }
}
