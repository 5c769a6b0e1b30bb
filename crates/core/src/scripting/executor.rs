//! Invocation interface and shared result types.
//!
//! Defines [`FunctionInvoker`], the seam a host uses to run a registered
//! function, along with [`InvocationOutput`].

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;

use crate::error::InvokeError;

/// Captured result of a script run that exited on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationOutput {
    /// Stdout captured from the process (up to the output limit), decoded
    /// lossily for logs and summaries.
    pub stdout: String,
    /// Stdout exactly as the process wrote it; this is what reaches the sink.
    #[serde(skip)]
    pub stdout_bytes: Vec<u8>,
    /// Stderr captured from the process (up to the output limit).
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Stdout bytes drained but not kept because of the output limit.
    pub stdout_truncated: usize,
    /// Stderr bytes drained but not kept because of the output limit.
    pub stderr_truncated: usize,
}

impl InvocationOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait implemented by function invokers.
///
/// An invocation takes the positional pair `(input, sink)`: the input text
/// handed to the function and the destination its captured output is
/// written to, in full, once the run completes.
pub trait FunctionInvoker: Send + Sync {
    /// Run the function with `input`, writing its output to `sink`.
    fn invoke<W>(
        &self,
        input: &str,
        sink: &mut W,
    ) -> impl Future<Output = Result<InvocationOutput, InvokeError>> + Send
    where
        W: AsyncWrite + Unpin + Send;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
