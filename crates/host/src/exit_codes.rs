//! Stable exit codes for the host binary, one per [`InvocationStatus`].

use scriptinvoker_core::InvocationStatus;

/// Script ran and exited 0.
pub const OK: i32 = 0;
/// Script exited non-zero.
pub const SCRIPT_FAILED: i32 = 1;
/// Bad arguments, configuration or unreadable path.
pub const USAGE: i32 = 2;
/// Extension has no interpreter.
pub const UNSUPPORTED: i32 = 3;
/// Interpreter could not be launched.
pub const LAUNCH_FAILED: i32 = 4;
/// Script exceeded its timeout.
pub const TIMED_OUT: i32 = 5;
/// Output could not be read or delivered.
pub const IO_FAILED: i32 = 6;
/// Interrupted (Ctrl-C), following the shell convention of 128 + SIGINT.
pub const CANCELLED: i32 = 130;

pub fn for_status(status: InvocationStatus) -> i32 {
    match status {
        InvocationStatus::Completed => OK,
        InvocationStatus::Failed => SCRIPT_FAILED,
        InvocationStatus::Unsupported => UNSUPPORTED,
        InvocationStatus::LaunchFailed => LAUNCH_FAILED,
        InvocationStatus::TimedOut => TIMED_OUT,
        InvocationStatus::IoFailed => IO_FAILED,
        InvocationStatus::Cancelled => CANCELLED,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
