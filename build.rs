//! Build script for memaudit.
//!
//! Provides build-time notes about enabled features and the target.

use std::env;

fn main() {
    // Re-run if features change
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_PARKING_LOT");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_LOG");

    let parking_lot_enabled = env::var("CARGO_FEATURE_PARKING_LOT").is_ok();
    let log_enabled = env::var("CARGO_FEATURE_LOG").is_ok();

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let is_release = profile == "release";

    // =========================================================================
    // Feature-specific diagnostics
    // =========================================================================

    if parking_lot_enabled {
        emit_info("Using parking_lot for registry mutexes");
    }

    if log_enabled {
        emit_info("log integration enabled");
        emit_note("Reports are mirrored to the `log` facade in addition to stderr.");
        emit_note("A logger that allocates is served raw while inside the auditor.");
    }

    if is_release {
        emit_warning("memaudit built in release mode");
        emit_note("Every allocation captures a stack trace; expect a large slowdown.");
        emit_note("Inlined frames may be missing from reports without debug info.");
    }

    check_target();
}

// =============================================================================
// Diagnostic emission helpers
// =============================================================================

fn emit_info(msg: &str) {
    println!("cargo:warning=[memaudit] {}", msg);
}

fn emit_note(msg: &str) {
    println!("cargo:warning=[memaudit]    {}", msg);
}

fn emit_warning(msg: &str) {
    println!("cargo:warning=[memaudit] warning: {}", msg);
}

// =============================================================================
// Target checks
// =============================================================================

fn check_target() {
    let family = env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();
    let target = env::var("TARGET").unwrap_or_default();

    if family != "unix" {
        emit_warning("non-unix target detected");
        emit_note("Over-aligned requests (align > malloc alignment) will fail with AllocError.");
    }

    if target.contains("wasm") {
        emit_warning("WebAssembly target detected");
        emit_note("Stack capture is unavailable; reports will show no frames.");
    }
}
