//! Script invoker: one script file bound to one interpreter.
//!
//! Kind resolution and validation happen together at construction, so a
//! [`ScriptInvoker`] always has a runnable interpreter. Invocations share
//! no mutable state; one invoker can serve concurrent calls.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use super::command::{Interpreters, ScriptCommand};
use super::executor::{FunctionInvoker, InvocationOutput};
use super::kind::ScriptKind;
use super::subprocess::{self, RunOptions};
use crate::config::InvokerConfig;
use crate::error::InvokeError;

/// Invoker for a single PowerShell, batch or Python script.
#[derive(Debug, Clone)]
pub struct ScriptInvoker {
    script_path: PathBuf,
    kind: ScriptKind,
    interpreters: Interpreters,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
    env_vars: Vec<(String, String)>,
}

impl ScriptInvoker {
    /// Create an invoker with the default [`InvokerConfig`].
    ///
    /// Fails with [`InvokeError::UnsupportedScriptType`] when the extension
    /// has no interpreter.
    pub fn new(script_path: impl AsRef<Path>) -> Result<Self, InvokeError> {
        Self::from_config(script_path, &InvokerConfig::default())
    }

    /// Create an invoker using the timeout, output limit and interpreter
    /// binaries from `config`.
    ///
    /// The path is made absolute (without touching the filesystem) because
    /// the interpreter runs inside the script's own directory.
    pub fn from_config(
        script_path: impl AsRef<Path>,
        config: &InvokerConfig,
    ) -> Result<Self, InvokeError> {
        let path = script_path.as_ref();
        let kind = ScriptKind::from_path(path)?;
        let script_path = std::path::absolute(path)?;

        Ok(Self {
            script_path,
            kind,
            interpreters: config.interpreters.clone(),
            timeout: config.timeout,
            output_limit_bytes: config.output_limit_bytes,
            env_vars: Vec::new(),
        })
    }

    /// Replace the wall-clock timeout (`None` waits indefinitely).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output_limit(mut self, bytes: usize) -> Self {
        self.output_limit_bytes = bytes;
        self
    }

    pub fn with_interpreters(mut self, interpreters: Interpreters) -> Self {
        self.interpreters = interpreters;
        self
    }

    /// Overlay one environment variable on the inherited environment.
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Directory the interpreter runs in: the one containing the script.
    pub fn working_directory(&self) -> Option<&Path> {
        self.script_path.parent()
    }

    /// Compose the interpreter command for `input` without running it.
    pub fn command(&self, input: &str) -> ScriptCommand {
        ScriptCommand::for_kind(self.kind, &self.interpreters, &self.script_path, input)
    }

    /// Run the script with `input` and write its stdout to `sink`.
    ///
    /// Stdout is written in one piece once the child has exited, including
    /// when it exited non-zero (the [`InvokeError::NonZeroExit`] is returned
    /// after the write). Nothing is written on timeout, cancellation or
    /// launch failure.
    pub async fn invoke_with_cancel<W>(
        &self,
        input: &str,
        sink: &mut W,
        cancel: &CancellationToken,
    ) -> Result<InvocationOutput, InvokeError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let command = self.command(input);
        tracing::info!(
            script = %self.script_path.display(),
            kind = %self.kind,
            timeout_ms = self.timeout.map(|t| t.as_millis() as u64),
            "Invoking script",
        );
        tracing::debug!(command_line = %command.command_line(), "Composed interpreter command");

        let options = RunOptions {
            working_directory: self.working_directory().map(Path::to_path_buf),
            env_vars: self.env_vars.clone(),
            timeout: self.timeout,
            output_limit_bytes: self.output_limit_bytes,
        };
        let output = subprocess::run_command(&mut command.to_command(), &options, cancel).await?;

        sink.write_all(&output.stdout_bytes)
            .await
            .map_err(InvokeError::Sink)?;
        sink.flush().await.map_err(InvokeError::Sink)?;

        if !output.succeeded() {
            tracing::warn!(
                script = %self.script_path.display(),
                exit_code = output.exit_code,
                duration_ms = output.duration_ms,
                "Script exited with failure",
            );
            return Err(InvokeError::NonZeroExit {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        tracing::info!(
            script = %self.script_path.display(),
            duration_ms = output.duration_ms,
            "Script completed",
        );
        Ok(output)
    }
}

impl FunctionInvoker for ScriptInvoker {
    async fn invoke<W>(&self, input: &str, sink: &mut W) -> Result<InvocationOutput, InvokeError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        self.invoke_with_cancel(input, sink, &CancellationToken::new())
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn unsupported_extension_is_rejected_at_construction() {
        assert_matches!(
            ScriptInvoker::new("/funcs/run.sh"),
            Err(InvokeError::UnsupportedScriptType { extension }) if extension == "sh"
        );
        assert_matches!(
            ScriptInvoker::new("/funcs/run"),
            Err(InvokeError::UnsupportedScriptType { .. })
        );
    }

    #[test]
    fn kind_is_resolved_once_case_insensitively() {
        let invoker = ScriptInvoker::new("/funcs/Run.PS1").expect("invoker");
        assert_eq!(invoker.kind(), ScriptKind::PowerShell);
        let invoker = ScriptInvoker::new("/funcs/run.BAT").expect("invoker");
        assert_eq!(invoker.kind(), ScriptKind::WindowsBatch);
    }

    #[test]
    fn relative_path_is_made_absolute() {
        let invoker = ScriptInvoker::new("funcs/run.py").expect("invoker");
        assert!(invoker.script_path().is_absolute());
        assert!(invoker.script_path().ends_with("funcs/run.py"));
        let cwd = std::env::current_dir().expect("cwd");
        assert_eq!(invoker.working_directory(), Some(cwd.join("funcs").as_path()));
    }

    #[test]
    fn config_is_applied() {
        let config = InvokerConfig {
            timeout: Some(Duration::from_secs(7)),
            output_limit_bytes: 64,
            interpreters: Interpreters {
                powershell: "ps".to_string(),
                cmd: "cmd.exe".to_string(),
                python: "py3".to_string(),
            },
        };
        let invoker = ScriptInvoker::from_config("/funcs/run.py", &config).expect("invoker");
        assert_eq!(invoker.timeout(), Some(Duration::from_secs(7)));
        assert_eq!(invoker.command("x").program(), "py3");

        let invoker = invoker.with_timeout(None);
        assert_eq!(invoker.timeout(), None);
    }

    #[test]
    fn command_uses_absolute_script_path() {
        let invoker = ScriptInvoker::new("/funcs/run.cmd").expect("invoker");
        let command = invoker.command("abc");
        assert_eq!(command.args()[0], "/c");
        assert_eq!(Path::new(&command.args()[1]), invoker.script_path());
        assert_eq!(&command.args()[2..], ["-p1", "abc"]);
    }

    #[test]
    fn env_vars_accumulate() {
        let invoker = ScriptInvoker::new("/funcs/run.py")
            .expect("invoker")
            .with_env_var("A", "1")
            .with_env_vars([("B", "2"), ("C", "3")]);
        assert_eq!(
            invoker.env_vars,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "2".to_string()),
                ("C".to_string(), "3".to_string()),
            ]
        );
    }
}
