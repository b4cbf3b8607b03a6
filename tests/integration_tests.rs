//! Integration tests for memaudit.

use memaudit::{
    alloc_scalar, alloc_vector, allocate, deallocate, free_scalar, free_vector, is_live, stats,
    AllocKind, Auditor, MIN_ALIGN,
};
use std::sync::Arc;
use std::thread;

#[test]
fn test_scalar_alloc_and_free() {
    let ptr = alloc_scalar(std::mem::size_of::<u64>()).unwrap();

    unsafe {
        let value = ptr.as_ptr().cast::<u64>();
        value.write(12345);
        assert_eq!(value.read(), 12345);
    }
    assert!(is_live(AllocKind::Scalar, ptr.as_ptr()));

    unsafe { free_scalar(ptr.as_ptr()) };
}

#[test]
fn test_vector_alloc_and_free() {
    // An array of ten 32-bit integers.
    let ptr = alloc_vector(40).unwrap();

    unsafe {
        let items = std::slice::from_raw_parts_mut(ptr.as_ptr().cast::<u32>(), 10);
        for (i, item) in items.iter_mut().enumerate() {
            *item = i as u32;
        }
        assert_eq!(items.iter().sum::<u32>(), 45);
    }
    assert!(is_live(AllocKind::Vector, ptr.as_ptr()));
    assert!(!is_live(AllocKind::Scalar, ptr.as_ptr()));

    unsafe { free_vector(ptr.as_ptr()) };
}

#[test]
fn test_generic_entry_points() {
    for kind in AllocKind::ALL {
        let ptr = allocate(kind, 24).unwrap();
        assert!(is_live(kind, ptr.as_ptr()));
        assert!(!is_live(kind.other(), ptr.as_ptr()));
        unsafe { deallocate(kind, ptr.as_ptr()) };
    }
}

#[test]
fn test_null_free_does_nothing() {
    unsafe {
        free_scalar(std::ptr::null_mut());
        free_vector(std::ptr::null_mut());
    }
}

#[test]
fn test_zero_sized_allocations_are_distinct() {
    let a = alloc_scalar(0).unwrap();
    let b = alloc_scalar(0).unwrap();
    assert_ne!(a, b);

    unsafe {
        free_scalar(a.as_ptr());
        free_scalar(b.as_ptr());
    }
}

#[test]
fn test_blocks_are_aligned() {
    let ptrs: Vec<_> = (1..64).map(|size| alloc_vector(size).unwrap()).collect();
    for ptr in &ptrs {
        assert_eq!(ptr.as_ptr() as usize % MIN_ALIGN, 0);
    }
    for ptr in ptrs {
        unsafe { free_vector(ptr.as_ptr()) };
    }
}

#[test]
fn test_stats_reflect_live_blocks() {
    let before = stats();
    let ptr = alloc_vector(4096).unwrap();

    let during = stats();
    assert!(during.allocation_count > before.allocation_count);
    assert!(during.live_vector >= 1);
    assert!(during.vector_bytes >= 4096);

    unsafe { free_vector(ptr.as_ptr()) };
    assert!(stats().deallocation_count > before.deallocation_count);
}

#[test]
fn test_multithread_alloc_free() {
    let handles: Vec<_> = (0..4)
        .map(|t| {
            thread::spawn(move || {
                let kind = AllocKind::ALL[t % 2];
                let mut ptrs = Vec::new();
                for i in 0..500 {
                    ptrs.push(allocate(kind, 8 + i % 64).unwrap());
                }
                for ptr in &ptrs {
                    assert!(is_live(kind, ptr.as_ptr()));
                }
                for ptr in ptrs {
                    unsafe { deallocate(kind, ptr.as_ptr()) };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_cross_thread_free() {
    let ptr = alloc_scalar(32).unwrap();
    let address = ptr.as_ptr() as usize;

    thread::spawn(move || unsafe { free_scalar(address as *mut u8) })
        .join()
        .unwrap();
}

#[test]
fn test_standalone_auditor_mismatch_verdict() {
    let auditor = Auditor::new();
    let ptr = auditor.allocate(AllocKind::Vector, 40).unwrap();

    let err = unsafe { auditor.deallocate(AllocKind::Scalar, ptr.as_ptr()) }.unwrap_err();
    assert!(err.is_mismatch());
    assert_eq!(err.allocated_as, Some(AllocKind::Vector));
    let text = err.to_string();
    assert!(text.contains("should be freed as Vector (free_vector), not Scalar (free_scalar)"));

    unsafe { auditor.deallocate(AllocKind::Vector, ptr.as_ptr()).unwrap() };
}

#[test]
fn test_standalone_auditor_shared_across_threads() {
    let auditor = Arc::new(Auditor::new());
    let ptr = auditor.allocate(AllocKind::Scalar, 16).unwrap();
    let address = ptr.as_ptr() as usize;

    let remote = auditor.clone();
    let freed = thread::spawn(move || unsafe { remote.deallocate(AllocKind::Scalar, address as *mut u8) }.is_ok())
        .join()
        .unwrap();

    assert!(freed);
    assert!(!auditor.is_live(AllocKind::Scalar, address));
    assert_eq!(auditor.stats().live_allocations(), 0);
}
