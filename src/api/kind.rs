//! Allocation kinds.

use std::fmt;

/// Which family of entry points produced (or must release) an allocation.
///
/// Every address is live under at most one kind, and must be released
/// through the deallocation entry point of that same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocKind {
    /// A single object (`alloc_scalar` / `free_scalar`, and every
    /// `GlobalAlloc` request).
    Scalar,
    /// An array of objects (`alloc_vector` / `free_vector`).
    Vector,
}

impl AllocKind {
    /// Both kinds, in registry order.
    pub const ALL: [AllocKind; 2] = [AllocKind::Scalar, AllocKind::Vector];

    /// The counterpart kind.
    pub const fn other(self) -> Self {
        match self {
            AllocKind::Scalar => AllocKind::Vector,
            AllocKind::Vector => AllocKind::Scalar,
        }
    }

    /// Name of the allocation entry point for this kind.
    pub const fn alloc_fn(self) -> &'static str {
        match self {
            AllocKind::Scalar => "alloc_scalar",
            AllocKind::Vector => "alloc_vector",
        }
    }

    /// Name of the deallocation entry point for this kind.
    pub const fn free_fn(self) -> &'static str {
        match self {
            AllocKind::Scalar => "free_scalar",
            AllocKind::Vector => "free_vector",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            AllocKind::Scalar => 0,
            AllocKind::Vector => 1,
        }
    }
}

impl fmt::Display for AllocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocKind::Scalar => write!(f, "Scalar"),
            AllocKind::Vector => write!(f, "Vector"),
        }
    }
}
