//! Terminal status of an invocation, for logs and host exit codes.

use std::fmt;

use serde::Serialize;

use super::executor::InvocationOutput;
use crate::error::InvokeError;

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    /// Script finished with exit code 0 and its output reached the sink.
    Completed,
    /// Script exited with a non-zero code.
    Failed,
    /// Script was killed because it exceeded its timeout.
    TimedOut,
    /// Caller cancelled the invocation.
    Cancelled,
    /// Interpreter could not be started.
    LaunchFailed,
    /// Script extension has no interpreter.
    Unsupported,
    /// Output could not be delivered, or the child could not be read.
    IoFailed,
}

impl InvocationStatus {
    pub fn from_result(result: &Result<InvocationOutput, InvokeError>) -> Self {
        match result {
            Ok(_) => Self::Completed,
            Err(err) => Self::from_error(err),
        }
    }

    pub fn from_error(err: &InvokeError) -> Self {
        match err {
            InvokeError::UnsupportedScriptType { .. } => Self::Unsupported,
            InvokeError::LaunchFailed { .. } => Self::LaunchFailed,
            InvokeError::NonZeroExit { .. } => Self::Failed,
            InvokeError::Timeout { .. } => Self::TimedOut,
            InvokeError::Cancelled => Self::Cancelled,
            InvokeError::Sink(_) | InvokeError::Io(_) => Self::IoFailed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
            Self::LaunchFailed => "launch_failed",
            Self::Unsupported => "unsupported",
            Self::IoFailed => "io_failed",
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
