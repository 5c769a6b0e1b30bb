//! Error types for script invocation and configuration loading.

/// Errors that can occur while resolving or invoking a script.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// The file extension does not map to a supported interpreter.
    #[error("Unsupported script type: '{extension}'")]
    UnsupportedScriptType { extension: String },

    /// The interpreter binary could not be started (missing, not executable, ...).
    #[error("Failed to launch interpreter '{program}': {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The script ran but exited with a non-zero exit code (`-1` if killed by signal).
    #[error("Script failed with exit code {exit_code}: {stderr}")]
    NonZeroExit { exit_code: i32, stderr: String },

    /// The script exceeded its configured timeout and its process tree was killed.
    #[error("Script timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The invocation was cancelled by the caller and its process tree was killed.
    #[error("Script invocation cancelled")]
    Cancelled,

    /// Writing captured output to the caller's sink failed.
    #[error("Failed to write script output: {0}")]
    Sink(#[source] std::io::Error),

    /// Waiting on or reading from the child process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading [`InvokerConfig`](crate::InvokerConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
