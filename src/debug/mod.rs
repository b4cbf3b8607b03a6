//! Stack capture for allocation and free sites.

pub mod backtrace;
