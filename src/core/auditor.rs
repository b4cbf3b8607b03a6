//! Allocation auditor: registries plus the validation policy.
//!
//! The auditor only returns verdicts. Deciding what a failed free does to
//! the process is left to the hooks in [`crate::api::hooks`].

use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::allocators::bootstrap::{raw_allocate_aligned, raw_deallocate, MIN_ALIGN};
use crate::api::error::{AllocError, FreeError};
use crate::api::kind::AllocKind;
use crate::api::stats::AuditStats;
use crate::core::registry::{AllocationRecord, Registry};
use crate::debug::backtrace::StackTrace;
use crate::diagnostics::emit::DiagnosticSink;
use crate::diagnostics::report::Report;

/// One registry per allocation kind, plus cumulative counters.
pub struct Auditor {
    registries: [Registry; 2],
    allocation_count: AtomicU64,
    deallocation_count: AtomicU64,
}

impl Auditor {
    /// Create an auditor with empty registries.
    pub fn new() -> Self {
        Self {
            registries: [Registry::new(AllocKind::Scalar), Registry::new(AllocKind::Vector)],
            allocation_count: AtomicU64::new(0),
            deallocation_count: AtomicU64::new(0),
        }
    }

    /// The registry for `kind`.
    pub fn registry(&self, kind: AllocKind) -> &Registry {
        &self.registries[kind.index()]
    }

    /// Allocate `size` bytes as `kind`.
    ///
    /// The recorded trace starts at the caller.
    #[inline(never)]
    pub fn allocate(&self, kind: AllocKind, size: usize) -> Result<NonNull<u8>, AllocError> {
        self.record(kind, size, MIN_ALIGN, 1)
    }

    /// Allocate `size` bytes aligned to `align` as `kind`.
    ///
    /// The recorded trace starts at the caller.
    #[inline(never)]
    pub fn allocate_aligned(&self, kind: AllocKind, size: usize, align: usize) -> Result<NonNull<u8>, AllocError> {
        self.record(kind, size, align, 1)
    }

    /// Allocate on behalf of a hook, dropping `skip` hook frames above this
    /// call from the recorded trace.
    #[inline(never)]
    pub(crate) fn allocate_traced(
        &self,
        kind: AllocKind,
        size: usize,
        align: usize,
        skip: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        self.record(kind, size, align, skip + 1)
    }

    /// The block comes from the bootstrap allocator; the allocation site is
    /// captured before the registry lock is taken. `skip` counts the frames
    /// above this one that belong to the auditor or its hooks.
    #[inline(never)]
    fn record(&self, kind: AllocKind, size: usize, align: usize, skip: usize) -> Result<NonNull<u8>, AllocError> {
        let ptr = raw_allocate_aligned(size, align).ok_or(AllocError::new(size))?;
        let trace = StackTrace::capture_skipping(skip + 1);

        if let Err(err) = self.registry(kind).insert(ptr.as_ptr() as usize, size, trace) {
            // SAFETY: the block was never handed out.
            unsafe { raw_deallocate(ptr.as_ptr()) };
            return Err(err);
        }

        self.allocation_count.fetch_add(1, Ordering::Relaxed);
        Ok(ptr)
    }

    /// Validate and release `ptr` as `kind`.
    ///
    /// Null is accepted and ignored. On a verdict of `Err` nothing is
    /// released and no record is touched; the error says whether the address
    /// is live under the other kind.
    ///
    /// # Safety
    ///
    /// On `Ok`, the memory at `ptr` is returned to the system and must not be
    /// used again.
    pub unsafe fn deallocate(&self, kind: AllocKind, ptr: *mut u8) -> Result<(), FreeError> {
        if ptr.is_null() {
            return Ok(());
        }

        let address = ptr as usize;
        if self.registry(kind).erase(address).is_some() {
            raw_deallocate(ptr);
            self.deallocation_count.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        let other = kind.other();
        let allocated_as = if self.registry(other).lookup(address) {
            Some(other)
        } else {
            None
        };

        Err(FreeError {
            address,
            freed_as: kind,
            allocated_as,
        })
    }

    /// Release `ptr` without validating it, dropping any record `kind`
    /// holds for it.
    ///
    /// Used for frees made from inside the instrumentation, where a miss is
    /// a block that was never recorded rather than an error.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a block from the bootstrap allocator, and must
    /// not be used again.
    pub(crate) unsafe fn release_unchecked(&self, kind: AllocKind, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        if self.registry(kind).erase(ptr as usize).is_some() {
            self.deallocation_count.fetch_add(1, Ordering::Relaxed);
        }
        raw_deallocate(ptr);
    }

    /// Check whether `address` is live under `kind`.
    pub fn is_live(&self, kind: AllocKind, address: usize) -> bool {
        self.registry(kind).lookup(address)
    }

    /// Remove every surviving record, scalar registry first.
    pub fn drain_leaks(&self) -> impl Iterator<Item = (AllocKind, AllocationRecord)> + '_ {
        AllocKind::ALL
            .into_iter()
            .flat_map(move |kind| self.registry(kind).drain().map(move |record| (kind, record)))
    }

    /// Drain the registries, emitting one leak report per surviving record.
    ///
    /// Leaked memory itself is not released. Returns the number of reports.
    pub fn report_leaks(&self, sink: &dyn DiagnosticSink) -> usize {
        let mut count = 0;
        for (kind, record) in self.drain_leaks() {
            sink.emit(&Report::Leak { kind, record: &record });
            count += 1;
        }
        count
    }

    /// Snapshot the registries and counters.
    pub fn stats(&self) -> AuditStats {
        let scalar = self.registry(AllocKind::Scalar);
        let vector = self.registry(AllocKind::Vector);
        AuditStats {
            live_scalar: scalar.len(),
            live_vector: vector.len(),
            scalar_bytes: scalar.live_bytes(),
            vector_bytes: vector.live_bytes(),
            allocation_count: self.allocation_count.load(Ordering::Relaxed),
            deallocation_count: self.deallocation_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for Auditor {
    fn default() -> Self {
        Self::new()
    }
}
