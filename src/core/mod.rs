//! Registries, the auditor and its process-wide instance.

pub mod auditor;
pub(crate) mod global;
pub mod registry;
pub(crate) mod tls;
