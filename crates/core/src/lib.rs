//! `scriptinvoker-core` -- script invocation dispatcher.
//!
//! Maps a script file to an interpreter by extension, launches the
//! interpreter as a child process with the caller's input, and writes the
//! captured stdout to a caller-supplied sink. Failures (unsupported script
//! type, launch failure, non-zero exit, timeout, cancellation) are reported
//! as a typed [`InvokeError`].

pub mod config;
pub mod error;
pub mod scripting;

pub use config::InvokerConfig;
pub use error::{ConfigError, InvokeError};
pub use scripting::executor::{FunctionInvoker, InvocationOutput};
pub use scripting::invoker::ScriptInvoker;
pub use scripting::kind::{is_supported_script_type, ScriptKind, SUPPORTED_SCRIPT_TYPES};
pub use scripting::status::InvocationStatus;
