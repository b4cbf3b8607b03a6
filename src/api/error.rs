//! Error types surfaced by the audit hooks.

use std::fmt;

use crate::api::kind::AllocKind;
use crate::diagnostics::kind::{Diagnostic, MA101, MA102};

/// The bootstrap allocator could not satisfy a request.
///
/// This is the only failure the hooks propagate to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    /// Requested size in bytes.
    pub size: usize,
}

impl AllocError {
    pub(crate) const fn new(size: usize) -> Self {
        Self { size }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "out of memory allocating {} bytes", self.size)
    }
}

impl std::error::Error for AllocError {}

/// A deallocation that does not match any live allocation of its kind.
///
/// The global hooks never return this: they report it and terminate the
/// process. [`Auditor`](crate::Auditor) hands it back so the verdict can be
/// inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeError {
    /// The address passed to the deallocation entry point.
    pub address: usize,
    /// The kind whose entry point was called.
    pub freed_as: AllocKind,
    /// The kind the address is actually live under, if any.
    pub allocated_as: Option<AllocKind>,
}

impl FreeError {
    /// True when the address is live under the other kind.
    pub fn is_mismatch(&self) -> bool {
        self.allocated_as.is_some()
    }

    /// The diagnostic describing this failure.
    pub fn diagnostic(&self) -> &'static Diagnostic {
        if self.is_mismatch() {
            &MA102
        } else {
            &MA101
        }
    }
}

impl fmt::Display for FreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid free of {:#x} through {}", self.address, self.freed_as.free_fn())?;
        if let Some(actual) = self.allocated_as {
            write!(
                f,
                ": allocated as {actual}, should be freed as {actual} ({}), not {} ({})",
                actual.free_fn(),
                self.freed_as,
                self.freed_as.free_fn()
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for FreeError {}
