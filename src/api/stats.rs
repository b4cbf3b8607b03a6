//! Audit statistics.

/// Snapshot of the registries and cumulative counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditStats {
    /// Live scalar allocations.
    pub live_scalar: usize,

    /// Live vector allocations.
    pub live_vector: usize,

    /// Bytes held by live scalar allocations.
    pub scalar_bytes: usize,

    /// Bytes held by live vector allocations.
    pub vector_bytes: usize,

    /// Total number of audited allocations performed.
    pub allocation_count: u64,

    /// Total number of audited deallocations performed.
    pub deallocation_count: u64,
}

impl AuditStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Live allocations across both kinds.
    pub fn live_allocations(&self) -> usize {
        self.live_scalar + self.live_vector
    }

    /// Live bytes across both kinds.
    pub fn live_bytes(&self) -> usize {
        self.scalar_bytes + self.vector_bytes
    }
}

impl std::fmt::Display for AuditStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Audit Statistics:")?;
        writeln!(f, "  Live scalar:     {} ({} bytes)", self.live_scalar, self.scalar_bytes)?;
        writeln!(f, "  Live vector:     {} ({} bytes)", self.live_vector, self.vector_bytes)?;
        writeln!(f, "  Allocations:     {}", self.allocation_count)?;
        writeln!(f, "  Deallocations:   {}", self.deallocation_count)?;
        Ok(())
    }
}
