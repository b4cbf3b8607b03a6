//! The instrumented allocation entry points.
//!
//! Every call is routed through the process-wide [`Auditor`](crate::Auditor).
//! Out-of-memory is returned to the caller. An invalid free or kind
//! mismatch is reported on stderr and the process is terminated at once
//! with exit status 255, without running exit handlers or leak reports.
//!
//! Requests made while the current thread is already inside the
//! instrumentation, or after [`teardown`](crate::teardown), are served by the
//! bootstrap allocator without being recorded or validated. Frees made from
//! inside still drop any record the block had.

use std::ptr::NonNull;

use crate::allocators::bootstrap::{raw_allocate_aligned, raw_deallocate, MIN_ALIGN};
use crate::api::error::{AllocError, FreeError};
use crate::api::kind::AllocKind;
use crate::api::stats::AuditStats;
use crate::core::global;
use crate::core::tls::ReentrancyGuard;
use crate::debug::backtrace::{StackTrace, SKIP_FRAMES};
use crate::diagnostics::emit::{DiagnosticSink, StderrSink};
use crate::diagnostics::report::Report;
use crate::sync::mutex::Mutex;

/// Exit status passed to `_exit` after an invalid free (reported as 255).
pub const INVALID_FREE_STATUS: i32 = -1;

/// Serializes the report-then-exit path across threads.
static REPORT_LOCK: Mutex<()> = Mutex::new(());

/// Allocate `size` bytes as `kind`.
///
/// The block is aligned to the platform `malloc` alignment.
#[inline(never)]
pub fn allocate(kind: AllocKind, size: usize) -> Result<NonNull<u8>, AllocError> {
    allocate_aligned(kind, size, MIN_ALIGN)
}

/// Release `ptr` through `kind`'s deallocation path.
///
/// Null is a no-op. An address that is not live under `kind` terminates the
/// process after reporting it.
///
/// # Safety
///
/// `ptr` must not be used after this call.
#[inline(never)]
pub unsafe fn deallocate(kind: AllocKind, ptr: *mut u8) {
    deallocate_checked(kind, ptr);
}

/// Allocate a single object of `size` bytes.
#[inline(never)]
pub fn alloc_scalar(size: usize) -> Result<NonNull<u8>, AllocError> {
    allocate_aligned(AllocKind::Scalar, size, MIN_ALIGN)
}

/// Allocate an array of `size` bytes in total.
#[inline(never)]
pub fn alloc_vector(size: usize) -> Result<NonNull<u8>, AllocError> {
    allocate_aligned(AllocKind::Vector, size, MIN_ALIGN)
}

/// Release memory obtained from [`alloc_scalar`].
///
/// # Safety
///
/// `ptr` must not be used after this call.
#[inline(never)]
pub unsafe fn free_scalar(ptr: *mut u8) {
    deallocate_checked(AllocKind::Scalar, ptr);
}

/// Release memory obtained from [`alloc_vector`].
///
/// # Safety
///
/// `ptr` must not be used after this call.
#[inline(never)]
pub unsafe fn free_vector(ptr: *mut u8) {
    deallocate_checked(AllocKind::Vector, ptr);
}

/// Check whether `ptr` is currently live under `kind`.
///
/// Always false after teardown or before the first allocation.
pub fn is_live(kind: AllocKind, ptr: *const u8) -> bool {
    let Some(_guard) = ReentrancyGuard::enter() else {
        return false;
    };
    global::existing_auditor()
        .map(|auditor| auditor.is_live(kind, ptr as usize))
        .unwrap_or(false)
}

/// Snapshot of the process-wide registries.
pub fn stats() -> AuditStats {
    let Some(_guard) = ReentrancyGuard::enter() else {
        return AuditStats::default();
    };
    global::existing_auditor()
        .map(|auditor| auditor.stats())
        .unwrap_or_default()
}

#[inline(never)]
pub(crate) fn allocate_aligned(kind: AllocKind, size: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
    let Some(_guard) = ReentrancyGuard::enter() else {
        return raw_allocate_aligned(size, align).ok_or(AllocError::new(size));
    };
    match global::auditor() {
        Some(auditor) => auditor.allocate_traced(kind, size, align, SKIP_FRAMES),
        None => raw_allocate_aligned(size, align).ok_or(AllocError::new(size)),
    }
}

#[inline(never)]
pub(crate) unsafe fn deallocate_checked(kind: AllocKind, ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    let Some(_guard) = ReentrancyGuard::enter() else {
        // A block recorded before the guard was taken may be released from
        // inside it; its record must not outlive the block.
        match global::existing_auditor() {
            Some(auditor) => auditor.release_unchecked(kind, ptr),
            None => raw_deallocate(ptr),
        }
        return;
    };
    let Some(auditor) = global::auditor() else {
        raw_deallocate(ptr);
        return;
    };
    if let Err(err) = auditor.deallocate(kind, ptr) {
        fail_fast(&err);
    }
}

/// Report an invalid free with the current call stack, then halt.
///
/// Bookkeeping is no longer trusted at this point, so the process exits
/// without unwinding and without running exit handlers.
#[cold]
#[inline(never)]
fn fail_fast(err: &FreeError) -> ! {
    let _lock = REPORT_LOCK.lock();
    let trace = StackTrace::capture_skipping(1 + SKIP_FRAMES);
    let report = Report::InvalidFree { error: err, trace: &trace };

    StderrSink.emit(&report);
    #[cfg(feature = "log")]
    crate::diagnostics::emit::emit_to_log(&report);

    // SAFETY: _exit terminates immediately and never returns.
    unsafe { libc::_exit(INVALID_FREE_STATUS) }
}
