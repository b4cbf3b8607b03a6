//! # memaudit
//!
//! Process-wide allocation auditor that catches mismatched and invalid
//! frees, and reports leaks at exit.
//!
//! ## Features
//!
//! - Two allocation kinds, [`AllocKind::Scalar`] and [`AllocKind::Vector`],
//!   each with its own registry of live blocks
//! - Allocation-site stack traces recorded with every block
//! - Kind mismatch and free of untracked memory are reported with both the
//!   free site and the owning kind, then the process is halted
//! - Every allocation still live at exit is reported as a leak
//! - Bookkeeping never recurses into the audited hooks
//! - [`AuditAlloc`] installs the auditor as the Rust global allocator
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use memaudit::{alloc_vector, free_vector};
//!
//! let buf = alloc_vector(40).expect("out of memory");
//! // ... use buf ...
//! unsafe { free_vector(buf.as_ptr()) };
//! ```
//!
//! Auditing every Rust allocation:
//!
//! ```rust,no_run
//! #[global_allocator]
//! static GLOBAL: memaudit::AuditAlloc = memaudit::AuditAlloc::new();
//! ```
//!
//! ## Configuration
//!
//! | Variable             | Effect                               |
//! |----------------------|--------------------------------------|
//! | `MEMAUDIT_LEAKS`     | `0` disables leak reports at exit    |
//! | `MEMAUDIT_SYMBOLIZE` | `0` prints raw frame addresses only  |
//!
//! Environment settings are read once, when the auditor is created on the
//! first audited call. [`set_config`] overrides them at any time.

pub mod api;
pub mod diagnostics;

mod allocators;
mod core;
mod debug;
mod sync;

// Re-export public API at crate root for convenience
pub use api::config::{config, set_config, AuditConfig, ENV_LEAKS, ENV_SYMBOLIZE};
pub use api::error::{AllocError, FreeError};
pub use api::global_alloc::AuditAlloc;
pub use api::hooks::{
    alloc_scalar, alloc_vector, allocate, deallocate, free_scalar, free_vector, is_live, stats,
    INVALID_FREE_STATUS,
};
pub use api::kind::AllocKind;
pub use api::stats::AuditStats;

// Registries and the auditor, for embedding in custom hooks
pub use crate::core::auditor::Auditor;
pub use crate::core::global::{is_torn_down, teardown};
pub use crate::core::registry::{AllocationRecord, Registry};

// Stack capture
pub use debug::backtrace::{StackTrace, MAX_FRAMES, SKIP_FRAMES};

// Bootstrap allocator
pub use allocators::bootstrap::{BootstrapAlloc, MIN_ALIGN};

// Diagnostics
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, Report, MA101, MA102, MA201};
