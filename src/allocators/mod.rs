//! Allocation backends.
//!
//! **This is the only module that talks to the C allocator directly.**

pub mod bootstrap;
