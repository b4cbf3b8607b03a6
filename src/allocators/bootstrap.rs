//! Bootstrap allocator: raw memory that bypasses the audit hooks.
//!
//! Everything the auditor needs for its own bookkeeping (registry tables,
//! stack trace buffers) comes from here. It talks to the C allocator
//! directly and must never be expressed in terms of the public hooks,
//! otherwise the first registry growth would recurse into itself.

use std::alloc::Layout;
use std::ptr::{self, NonNull};

use allocator_api2::alloc::{AllocError, Allocator};

/// Alignment guaranteed by `malloc` on this platform.
#[cfg(target_pointer_width = "64")]
pub const MIN_ALIGN: usize = 16;

/// Alignment guaranteed by `malloc` on this platform.
#[cfg(not(target_pointer_width = "64"))]
pub const MIN_ALIGN: usize = 8;

/// Allocate `size` bytes aligned to [`MIN_ALIGN`].
///
/// Zero-sized requests are rounded up to one byte so every live block has a
/// distinct address. Returns `None` when the system is out of memory.
pub fn raw_allocate(size: usize) -> Option<NonNull<u8>> {
    // SAFETY: malloc accepts any size and returns null on failure.
    let ptr = unsafe { libc::malloc(size.max(1)) };
    NonNull::new(ptr.cast::<u8>())
}

/// Allocate `size` bytes aligned to `align`.
///
/// `align` must be a power of two. Requests at or below [`MIN_ALIGN`] take
/// the plain `malloc` path.
pub fn raw_allocate_aligned(size: usize, align: usize) -> Option<NonNull<u8>> {
    debug_assert!(align.is_power_of_two());
    if align <= MIN_ALIGN {
        return raw_allocate(size);
    }
    over_aligned(size, align)
}

#[cfg(unix)]
fn over_aligned(size: usize, align: usize) -> Option<NonNull<u8>> {
    let mut out: *mut libc::c_void = ptr::null_mut();
    let align = align.max(std::mem::size_of::<usize>());
    // SAFETY: align is a power of two and a multiple of the pointer size.
    let rc = unsafe { libc::posix_memalign(&mut out, align, size.max(1)) };
    if rc != 0 {
        return None;
    }
    NonNull::new(out.cast::<u8>())
}

#[cfg(not(unix))]
fn over_aligned(_size: usize, _align: usize) -> Option<NonNull<u8>> {
    None
}

/// Release a block obtained from [`raw_allocate`] or [`raw_allocate_aligned`].
///
/// # Safety
///
/// `ptr` must be null or a live block returned by this module.
pub unsafe fn raw_deallocate(ptr: *mut u8) {
    libc::free(ptr.cast::<libc::c_void>());
}

/// [`Allocator`] handle over the bootstrap functions, for collections that
/// hold the auditor's own state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapAlloc;

// SAFETY: blocks come straight from malloc/posix_memalign, stay valid until
// passed to free, and are aligned to at least `layout.align()`.
unsafe impl Allocator for BootstrapAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = raw_allocate_aligned(layout.size(), layout.align()).ok_or(AllocError)?;
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, _layout: Layout) {
        raw_deallocate(ptr.as_ptr());
    }
}
