//! Per-kind allocation registry.

use std::fmt;

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::allocators::bootstrap::BootstrapAlloc;
use crate::api::error::AllocError;
use crate::api::kind::AllocKind;
use crate::debug::backtrace::StackTrace;
use crate::sync::mutex::Mutex;

type Table = HashMap<usize, AllocationRecord, FxBuildHasher, BootstrapAlloc>;

/// One live allocation.
pub struct AllocationRecord {
    address: usize,
    size: usize,
    trace: StackTrace,
}

impl AllocationRecord {
    /// Address returned to the caller.
    pub fn address(&self) -> usize {
        self.address
    }

    /// Requested size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Call stack at the allocation site.
    pub fn trace(&self) -> &StackTrace {
        &self.trace
    }
}

impl fmt::Debug for AllocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocationRecord")
            .field("address", &format_args!("{:#x}", self.address))
            .field("size", &self.size)
            .field("frames", &self.trace.len())
            .finish()
    }
}

/// Address-keyed store of live allocations for one kind.
///
/// The table lives in the bootstrap allocator, so growing it never goes
/// back through the hooks. Every operation holds the registry lock for its
/// whole lookup-then-mutate sequence.
pub struct Registry {
    kind: AllocKind,
    table: Mutex<Table>,
}

impl Registry {
    /// Create an empty registry. Does not allocate.
    pub fn new(kind: AllocKind) -> Self {
        Self {
            kind,
            table: Mutex::new(Self::empty_table()),
        }
    }

    fn empty_table() -> Table {
        HashMap::with_hasher_in(FxBuildHasher, BootstrapAlloc)
    }

    /// The kind this registry tracks.
    pub fn kind(&self) -> AllocKind {
        self.kind
    }

    /// Record a new live allocation.
    ///
    /// Fails only if the bootstrap allocator cannot grow the table. An
    /// address that is already present is replaced; that can only happen if
    /// the raw allocator handed out a block that was never erased.
    pub fn insert(&self, address: usize, size: usize, trace: StackTrace) -> Result<(), AllocError> {
        let mut table = self.table.lock();
        table.try_reserve(1).map_err(|_| AllocError::new(size))?;
        table.insert(address, AllocationRecord { address, size, trace });
        Ok(())
    }

    /// Check whether `address` is live under this kind.
    pub fn lookup(&self, address: usize) -> bool {
        self.table.lock().contains_key(&address)
    }

    /// Size of the live allocation at `address`, if any.
    pub fn size_of(&self, address: usize) -> Option<usize> {
        self.table.lock().get(&address).map(|record| record.size)
    }

    /// Remove and return the record for `address`.
    pub fn erase(&self, address: usize) -> Option<AllocationRecord> {
        self.table.lock().remove(&address)
    }

    /// Remove every record, handing them back for reporting.
    ///
    /// The lock is released before the caller sees the first record.
    pub fn drain(&self) -> impl Iterator<Item = AllocationRecord> {
        let table = std::mem::replace(&mut *self.table.lock(), Self::empty_table());
        table.into_values()
    }

    /// Number of live allocations.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// True when nothing is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes held by live allocations.
    pub fn live_bytes(&self) -> usize {
        self.table.lock().values().map(|record| record.size).sum()
    }
}
