//! Allocation-site stack capture.
//!
//! Frames are walked into a fixed on-stack buffer and then copied into
//! storage owned by the bootstrap allocator, so capturing a trace never
//! allocates through the audited hooks. Symbolization is deferred until the
//! trace is formatted for a report.

use std::ffi::c_void;
use std::fmt;

use allocator_api2::vec::Vec;

use crate::allocators::bootstrap::BootstrapAlloc;
use crate::api::config::symbolize_enabled;

/// Hook frames dropped above the auditor from traces taken on the hook
/// paths: the shared hook body and the public entry point.
pub const SKIP_FRAMES: usize = 2;

/// Maximum number of frames kept per trace.
pub const MAX_FRAMES: usize = 100;

/// Headroom for the unwinder's own frames above the capture point.
const SCAN_FRAMES: usize = MAX_FRAMES + 32;

/// A captured call stack: instruction pointers, innermost first.
#[derive(Debug)]
pub struct StackTrace {
    frames: Vec<usize, BootstrapAlloc>,
}

impl StackTrace {
    /// Capture the call stack of the caller.
    ///
    /// The first frame is the function that called `capture`. If the
    /// bootstrap allocator is exhausted the trace is empty rather than
    /// failing the caller.
    #[inline(never)]
    pub fn capture() -> Self {
        Self::walk(1)
    }

    /// Capture the call stack, also dropping the `skip` innermost callers.
    ///
    /// `capture_skipping(0)` is equivalent to [`capture`](Self::capture).
    #[inline(never)]
    pub fn capture_skipping(skip: usize) -> Self {
        Self::walk(1 + skip)
    }

    /// Walk the stack, dropping this function's frame and the `skip` frames
    /// directly above it.
    ///
    /// Frames belonging to the unwinder are located by this function's own
    /// frame; when the platform cannot report symbol addresses the raw walk
    /// is used from the top.
    #[inline(never)]
    fn walk(skip: usize) -> Self {
        let anchor = Self::walk as fn(usize) -> Self as usize;
        let mut buf = [0usize; SCAN_FRAMES];
        let mut len = 0usize;
        let mut anchor_at = None;

        ::backtrace::trace(|frame| {
            if anchor_at.is_none() && frame.symbol_address() as usize == anchor {
                anchor_at = Some(len);
            }
            buf[len] = frame.ip() as usize;
            len += 1;
            len < SCAN_FRAMES
        });

        let first = match anchor_at {
            Some(at) => at + 1 + skip,
            None => skip,
        }
        .min(len);
        let end = (first + MAX_FRAMES).min(len);
        Self::from_frames(&buf[first..end])
    }

    /// Build a trace from already captured instruction pointers.
    pub fn from_frames(ips: &[usize]) -> Self {
        let ips = &ips[..ips.len().min(MAX_FRAMES)];
        let mut frames = Vec::new_in(BootstrapAlloc);
        if frames.try_reserve_exact(ips.len()).is_ok() {
            frames.extend_from_slice(ips);
        }
        Self { frames }
    }

    /// A trace with no frames.
    pub fn empty() -> Self {
        Self {
            frames: Vec::new_in(BootstrapAlloc),
        }
    }

    /// Captured instruction pointers, innermost first.
    pub fn frames(&self) -> &[usize] {
        &self.frames
    }

    /// Number of captured frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if no frames were captured.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return writeln!(f, "    <no frames captured>");
        }

        let symbolize = symbolize_enabled();
        for (index, &ip) in self.frames.iter().enumerate() {
            write!(f, "    #{:<2} {:#018x}", index, ip)?;
            if symbolize {
                write_symbols(f, ip)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Append every symbol resolved for `ip`; inlined frames yield several.
fn write_symbols(f: &mut fmt::Formatter<'_>, ip: usize) -> fmt::Result {
    let mut result = Ok(());
    let mut first = true;

    ::backtrace::resolve(ip as *mut c_void, |symbol| {
        if result.is_err() {
            return;
        }
        result = write_symbol(f, symbol, first);
        first = false;
    });

    result
}

fn write_symbol(f: &mut fmt::Formatter<'_>, symbol: &::backtrace::Symbol, first: bool) -> fmt::Result {
    if !first {
        write!(f, "\n        {:>18}", "(inlined)")?;
    }
    match symbol.name() {
        Some(name) => write!(f, " - {:#}", name)?,
        None => write!(f, " - <unknown>")?,
    }
    if let Some(file) = symbol.filename() {
        write!(f, "\n          at {}", file.display())?;
        if let Some(line) = symbol.lineno() {
            write!(f, ":{}", line)?;
        }
    }
    Ok(())
}

/// Resolved function name of every frame, `"?"` where none resolves.
#[cfg(test)]
pub(crate) fn frame_names(trace: &StackTrace) -> std::vec::Vec<String> {
    trace
        .frames()
        .iter()
        .map(|&ip| {
            let mut name = String::from("?");
            ::backtrace::resolve(ip as *mut c_void, |symbol| {
                if let Some(resolved) = symbol.name() {
                    name = format!("{:#}", resolved);
                }
            });
            name
        })
        .collect()
}
