//! Synchronization primitives.

pub(crate) mod mutex;
