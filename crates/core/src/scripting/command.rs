//! Per-interpreter command composition.
//!
//! Each [`ScriptKind`] has one fixed template. Arguments are kept as an
//! argument vector and handed to the OS as such; the single-string form
//! returned by [`ScriptCommand::command_line`] is only for logs. The one
//! exception is `cmd /c` on Windows, which re-parses its own command line,
//! so its tail is appended raw with explicit quoting.

use std::path::Path;

use tokio::process::Command;

use super::kind::ScriptKind;

/// Interpreter binaries used for each script kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreters {
    pub powershell: String,
    pub cmd: String,
    pub python: String,
}

impl Default for Interpreters {
    fn default() -> Self {
        let (powershell, python) = if cfg!(windows) {
            ("PowerShell.exe", "python.exe")
        } else {
            ("pwsh", "python3")
        };
        Self {
            powershell: powershell.to_string(),
            cmd: "cmd".to_string(),
            python: python.to_string(),
        }
    }
}

impl Interpreters {
    pub fn program_for(&self, kind: ScriptKind) -> &str {
        match kind {
            ScriptKind::PowerShell => &self.powershell,
            ScriptKind::WindowsBatch => &self.cmd,
            ScriptKind::Python => &self.python,
        }
    }
}

/// A fully composed interpreter invocation for one script and one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCommand {
    kind: ScriptKind,
    program: String,
    args: Vec<String>,
    /// Position of the caller's input within `args`.
    input_index: usize,
}

impl ScriptCommand {
    /// Build the command for `kind`:
    ///
    /// | Kind | Arguments |
    /// |------|-----------|
    /// | PowerShell | `-ExecutionPolicy RemoteSigned -File <script> -p1 <input>` |
    /// | WindowsBatch | `/c <script> -p1 <input>` |
    /// | Python | `<script> <input>` |
    pub fn for_kind(
        kind: ScriptKind,
        interpreters: &Interpreters,
        script_path: &Path,
        input: &str,
    ) -> Self {
        let script = script_path.to_string_lossy().into_owned();
        let input = input.to_string();
        let args = match kind {
            ScriptKind::PowerShell => vec![
                "-ExecutionPolicy".to_string(),
                "RemoteSigned".to_string(),
                "-File".to_string(),
                script,
                "-p1".to_string(),
                input,
            ],
            ScriptKind::WindowsBatch => vec!["/c".to_string(), script, "-p1".to_string(), input],
            ScriptKind::Python => vec![script, input],
        };
        let input_index = args.len() - 1;

        Self {
            kind,
            program: interpreters.program_for(kind).to_string(),
            args,
            input_index,
        }
    }

    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Render as a single command line, e.g.
    /// `pwsh -ExecutionPolicy RemoteSigned -File /f/run.ps1 -p1 "hello world"`.
    ///
    /// The input is always double-quoted; other arguments only when they
    /// contain whitespace or quotes.
    pub fn command_line(&self) -> String {
        let mut line = quote_if_needed(&self.program);
        for (i, arg) in self.args.iter().enumerate() {
            line.push(' ');
            if i == self.input_index {
                line.push_str(&quote(arg));
            } else {
                line.push_str(&quote_if_needed(arg));
            }
        }
        line
    }

    /// Build a [`tokio::process::Command`] for this invocation.
    ///
    /// Stdio, working directory and environment are configured by the caller.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);

        #[cfg(windows)]
        {
            if self.kind == ScriptKind::WindowsBatch {
                cmd.raw_arg("/c");
                cmd.raw_arg(self.cmd_tail());
                return cmd;
            }
        }

        cmd.args(&self.args);
        cmd
    }

    /// Everything after `/c`, wrapped in one extra pair of quotes so that
    /// cmd strips exactly those and keeps the inner quoting intact.
    #[cfg_attr(not(windows), allow(dead_code))]
    fn cmd_tail(&self) -> String {
        let inner = self
            .args
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, arg)| {
                if i == self.input_index || needs_quotes(arg) {
                    format!("\"{}\"", arg.replace('"', "\"\""))
                } else {
                    arg.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!("\"{inner}\"")
    }
}

fn needs_quotes(arg: &str) -> bool {
    arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '&' | '|' | '<' | '>' | '^'))
}

fn quote_if_needed(arg: &str) -> String {
    if needs_quotes(arg) {
        quote(arg)
    } else {
        arg.to_string()
    }
}

/// Double-quote `arg` using the MSVC argv conventions: embedded quotes are
/// backslash-escaped and backslashes preceding a quote are doubled.
fn quote(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    let mut backslashes = 0usize;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                out.extend(std::iter::repeat('\\').take(backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            _ => {
                out.extend(std::iter::repeat('\\').take(backslashes));
                out.push(c);
                backslashes = 0;
            }
        }
    }
    out.extend(std::iter::repeat('\\').take(backslashes * 2));
    out.push('"');
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
