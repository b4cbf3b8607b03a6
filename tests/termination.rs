//! Fatal-path and teardown tests.
//!
//! Invalid frees halt the process and leaks are reported at exit, so each
//! scenario runs in a child copy of this test binary selected by
//! `MEMAUDIT_SCENARIO`.

use std::process::{Command, Output};

use memaudit::{alloc_scalar, alloc_vector, free_scalar, free_vector, INVALID_FREE_STATUS};

const SCENARIO_ENV: &str = "MEMAUDIT_SCENARIO";

const SYMBOLIZED: &[(&str, &str)] = &[("MEMAUDIT_SYMBOLIZE", "1")];

#[inline(never)]
fn leak_forty_bytes() {
    let ptr = alloc_vector(40).unwrap();
    std::hint::black_box(ptr);
}

#[inline(never)]
fn release_scalar_as_vector(ptr: *mut u8) {
    unsafe { free_vector(std::hint::black_box(ptr)) };
}

/// Entry point of the child process. A no-op in the parent run.
#[test]
fn scenario_child() {
    let Ok(scenario) = std::env::var(SCENARIO_ENV) else {
        return;
    };

    match scenario.as_str() {
        "mismatch" => {
            let ptr = alloc_scalar(4).unwrap();
            unsafe { free_vector(ptr.as_ptr()) };
        }
        "stack_free" => {
            let mut local = 0u32;
            unsafe { free_scalar(&mut local as *mut u32 as *mut u8) };
        }
        "double_free" => {
            let ptr = alloc_vector(16).unwrap();
            unsafe {
                free_vector(ptr.as_ptr());
                free_vector(ptr.as_ptr());
            }
        }
        "leak" => {
            // Ten 32-bit integers, never freed.
            leak_forty_bytes();
        }
        "mismatch_in_helper" => {
            let ptr = alloc_scalar(4).unwrap();
            release_scalar_as_vector(ptr.as_ptr());
        }
        "balanced" => {
            let a = alloc_scalar(8).unwrap();
            let b = alloc_vector(40).unwrap();
            unsafe {
                free_scalar(std::ptr::null_mut());
                free_vector(std::ptr::null_mut());
                free_scalar(a.as_ptr());
                free_vector(b.as_ptr());
            }
        }
        other => panic!("unknown scenario {other}"),
    }
}

fn run_scenario(scenario: &str, envs: &[(&str, &str)]) -> Output {
    let exe = std::env::current_exe().unwrap();
    let mut command = Command::new(exe);
    command
        .args(["--exact", "scenario_child", "--nocapture", "--test-threads=1"])
        .env(SCENARIO_ENV, scenario)
        .env("MEMAUDIT_SYMBOLIZE", "0");
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().unwrap()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn expected_status() -> i32 {
    INVALID_FREE_STATUS & 0xff
}

#[test]
fn test_kind_mismatch_terminates() {
    let output = run_scenario("mismatch", &[]);
    let stderr = stderr_of(&output);

    assert_eq!(output.status.code(), Some(expected_status()), "stderr: {stderr}");
    assert!(stderr.contains("[memaudit][MA102] error: Invalid memory freed at 0x"));
    assert!(stderr.contains(
        "Note: this memory was allocated by alloc_scalar: allocated as Scalar, \
         should be freed as Scalar (free_scalar), not Vector (free_vector)"
    ));
    assert!(stderr.contains("Freed at:"));
    assert!(stderr.contains("    #0"));
    // The halt skips exit handlers, so no leak report follows.
    assert!(!stderr.contains("Memory leak!"));
}

#[test]
fn test_untracked_free_terminates() {
    let output = run_scenario("stack_free", &[]);
    let stderr = stderr_of(&output);

    assert_eq!(output.status.code(), Some(expected_status()), "stderr: {stderr}");
    assert!(stderr.contains("[memaudit][MA101] error: Invalid memory freed at 0x"));
    assert!(!stderr.contains("Note:"));
}

#[test]
fn test_double_free_terminates() {
    let output = run_scenario("double_free", &[]);
    let stderr = stderr_of(&output);

    assert_eq!(output.status.code(), Some(expected_status()), "stderr: {stderr}");
    assert!(stderr.contains("[memaudit][MA101]"));
}

#[test]
fn test_leak_reported_at_exit() {
    let output = run_scenario("leak", &[]);
    let stderr = stderr_of(&output);

    assert!(output.status.success(), "stderr: {stderr}");
    assert!(stderr.contains("[memaudit][MA201] warning: Memory leak! 40 bytes at 0x"));
    assert!(stderr.contains("Memory was allocated as Vector in"));
    assert_eq!(stderr.matches("Memory leak!").count(), 1);
}

#[test]
fn test_leak_reports_can_be_disabled() {
    let output = run_scenario("leak", &[("MEMAUDIT_LEAKS", "0")]);
    let stderr = stderr_of(&output);

    assert!(output.status.success(), "stderr: {stderr}");
    assert!(!stderr.contains("[memaudit]"));
}

#[test]
fn test_balanced_run_is_silent() {
    let output = run_scenario("balanced", &[]);
    let stderr = stderr_of(&output);

    assert!(output.status.success(), "stderr: {stderr}");
    assert!(!stderr.contains("[memaudit]"));
}

#[test]
fn test_leak_report_names_allocation_site() {
    let output = run_scenario("leak", SYMBOLIZED);
    let stderr = stderr_of(&output);

    assert!(output.status.success(), "stderr: {stderr}");
    let block = &stderr[stderr.find("Memory leak!").expect("leak block")..];
    let first_frame = block.lines().nth(1).unwrap_or_default();
    assert!(first_frame.contains("#0"), "stderr: {stderr}");
    assert!(first_frame.contains("leak_forty_bytes"), "stderr: {stderr}");
}

#[test]
fn test_invalid_free_report_names_free_site() {
    let output = run_scenario("mismatch_in_helper", SYMBOLIZED);
    let stderr = stderr_of(&output);

    assert_eq!(output.status.code(), Some(expected_status()), "stderr: {stderr}");
    let block = &stderr[stderr.find("Freed at:").expect("free site block")..];
    let first_frame = block.lines().nth(1).unwrap_or_default();
    assert!(first_frame.contains("#0"), "stderr: {stderr}");
    assert!(first_frame.contains("release_scalar_as_vector"), "stderr: {stderr}");
}
