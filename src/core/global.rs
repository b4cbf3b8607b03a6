//! Process-wide auditor singleton.
//!
//! Lifecycle: `Uninit -> Live -> TornDown`. The auditor is created on the
//! first hook call, and creation registers [`teardown`] with `atexit` so
//! that leaks are reported during normal process exit. After teardown the
//! hooks stop auditing and serve requests straight from the bootstrap
//! allocator, since late frees from exit handlers cannot be validated
//! against registries that were already drained.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

use crate::api::config;
use crate::core::auditor::Auditor;
use crate::core::tls::ReentrancyGuard;
use crate::diagnostics::emit::{DiagnosticSink, StderrSink};
use crate::diagnostics::report::Report;

const UNINIT: u8 = 0;
const LIVE: u8 = 1;
const TORN_DOWN: u8 = 2;

static AUDITOR: OnceLock<Auditor> = OnceLock::new();
static LIFECYCLE: AtomicU8 = AtomicU8::new(UNINIT);

/// The process-wide auditor, created on first use.
///
/// Returns `None` once teardown has started. Must be called with a
/// [`ReentrancyGuard`] held: creation reads the environment and may log.
pub(crate) fn auditor() -> Option<&'static Auditor> {
    if LIFECYCLE.load(Ordering::Acquire) == TORN_DOWN {
        return None;
    }
    Some(AUDITOR.get_or_init(create))
}

/// The auditor if it exists and is still live. Never creates it.
pub(crate) fn existing_auditor() -> Option<&'static Auditor> {
    if LIFECYCLE.load(Ordering::Acquire) == TORN_DOWN {
        return None;
    }
    AUDITOR.get()
}

fn create() -> Auditor {
    config::init_from_env();

    // SAFETY: registering a plain extern "C" fn with no captured state.
    let rc = unsafe { libc::atexit(run_teardown) };

    #[cfg(feature = "log")]
    {
        if rc == 0 {
            log::debug!("memaudit: registries created, leak report registered for exit");
        } else {
            log::warn!("memaudit: atexit registration failed, leaks will not be reported");
        }
    }
    #[cfg(not(feature = "log"))]
    let _ = rc;

    let _ = LIFECYCLE.compare_exchange(UNINIT, LIVE, Ordering::AcqRel, Ordering::Acquire);
    Auditor::new()
}

extern "C" fn run_teardown() {
    teardown();
}

/// Tear down the registries, reporting every surviving allocation as a
/// leak (unless leak reports are disabled).
///
/// Runs automatically at process exit. Calling it earlier is allowed; from
/// then on allocations are no longer audited. Idempotent. Returns the number
/// of leaks found.
pub fn teardown() -> usize {
    if LIFECYCLE.swap(TORN_DOWN, Ordering::AcqRel) == TORN_DOWN {
        return 0;
    }
    let Some(auditor) = AUDITOR.get() else {
        return 0;
    };

    // Whatever the reports allocate is served raw and never recorded.
    let _guard = ReentrancyGuard::enter();

    let report = config::leak_reports_enabled();
    let sink = StderrSink;
    let mut leaks = 0usize;
    let mut bytes = 0usize;

    for (kind, record) in auditor.drain_leaks() {
        leaks += 1;
        bytes += record.size();
        if report {
            let report = Report::Leak { kind, record: &record };
            sink.emit(&report);
            #[cfg(feature = "log")]
            crate::diagnostics::emit::emit_to_log(&report);
        }
    }

    #[cfg(feature = "log")]
    log::info!("memaudit: teardown found {} leaked allocations ({} bytes)", leaks, bytes);
    #[cfg(not(feature = "log"))]
    let _ = bytes;

    leaks
}

/// Check if [`teardown`] has run.
pub fn is_torn_down() -> bool {
    LIFECYCLE.load(Ordering::Acquire) == TORN_DOWN
}
