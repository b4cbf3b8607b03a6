//! `GlobalAlloc` adapter.
//!
//! Installs the auditor as the process allocator. Rust's allocation
//! interface has a single request shape, so every request made through it
//! is audited as a [`AllocKind::Scalar`] allocation and released through
//! the scalar path.

use std::alloc::{GlobalAlloc, Layout};
use std::ptr;

use crate::api::hooks;
use crate::api::kind::AllocKind;

/// Auditing global allocator.
///
/// ```rust,no_run
/// use memaudit::AuditAlloc;
///
/// #[global_allocator]
/// static GLOBAL: AuditAlloc = AuditAlloc::new();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditAlloc;

impl AuditAlloc {
    /// Create the allocator. Usable in a `static`.
    pub const fn new() -> Self {
        Self
    }
}

unsafe impl GlobalAlloc for AuditAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        match hooks::allocate_aligned(AllocKind::Scalar, layout.size(), layout.align()) {
            Ok(ptr) => ptr.as_ptr(),
            Err(_) => ptr::null_mut(),
        }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.alloc(layout);
        if !ptr.is_null() {
            ptr::write_bytes(ptr, 0, layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        hooks::deallocate_checked(AllocKind::Scalar, ptr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_is_audited_as_scalar() {
        let alloc = AuditAlloc::new();
        let layout = Layout::from_size_align(48, 8).unwrap();

        unsafe {
            let ptr = alloc.alloc(layout);
            assert!(!ptr.is_null());
            assert!(hooks::is_live(AllocKind::Scalar, ptr));
            assert!(!hooks::is_live(AllocKind::Vector, ptr));
            alloc.dealloc(ptr, layout);
        }
    }

    #[test]
    fn test_alloc_zeroed() {
        let alloc = AuditAlloc::new();
        let layout = Layout::from_size_align(64, 16).unwrap();

        unsafe {
            let ptr = alloc.alloc_zeroed(layout);
            assert!(!ptr.is_null());
            assert!(std::slice::from_raw_parts(ptr, 64).iter().all(|&b| b == 0));
            alloc.dealloc(ptr, layout);
        }
    }

    #[test]
    fn test_over_aligned_layout() {
        let alloc = AuditAlloc::new();
        let layout = Layout::from_size_align(100, 256).unwrap();

        unsafe {
            let ptr = alloc.alloc(layout);
            if cfg!(unix) {
                assert!(!ptr.is_null());
                assert_eq!(ptr as usize % 256, 0);
                alloc.dealloc(ptr, layout);
            }
        }
    }
}
