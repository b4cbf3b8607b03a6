//! Public API for memaudit.
//!
//! The allocation entry points, the `GlobalAlloc` adapter, and the types
//! they accept and return.

pub mod config;
pub mod error;
pub mod global_alloc;
pub mod hooks;
pub mod kind;
pub mod stats;
