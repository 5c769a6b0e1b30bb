use std::time::Duration;

use crate::error::ConfigError;
use crate::scripting::command::Interpreters;
use crate::scripting::subprocess::DEFAULT_OUTPUT_LIMIT_BYTES;

/// Default wall-clock limit for one invocation (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Invoker configuration loaded from environment variables.
///
/// All fields have defaults suitable for local use; override via environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokerConfig {
    /// Wall-clock limit per invocation; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Bytes of stdout/stderr kept per stream.
    pub output_limit_bytes: usize,
    /// Interpreter binary per script kind.
    pub interpreters: Interpreters,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            interpreters: Interpreters::default(),
        }
    }
}

impl InvokerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                        |
    /// |-----------------------------|--------------------------------|
    /// | `SCRIPT_TIMEOUT_SECS`       | `300` (`0` disables)           |
    /// | `SCRIPT_OUTPUT_LIMIT_BYTES` | `10485760`                     |
    /// | `SCRIPT_POWERSHELL_BIN`     | `PowerShell.exe` / `pwsh`      |
    /// | `SCRIPT_CMD_BIN`            | `cmd`                          |
    /// | `SCRIPT_PYTHON_BIN`         | `python.exe` / `python3`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout = match parse_u64(&lookup, "SCRIPT_TIMEOUT_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.timeout,
        };

        let output_limit_bytes = match parse_u64(&lookup, "SCRIPT_OUTPUT_LIMIT_BYTES")? {
            Some(0) => {
                return Err(ConfigError::Zero {
                    key: "SCRIPT_OUTPUT_LIMIT_BYTES",
                })
            }
            Some(bytes) => usize::try_from(bytes).map_err(|_| ConfigError::Invalid {
                key: "SCRIPT_OUTPUT_LIMIT_BYTES",
                value: bytes.to_string(),
            })?,
            None => defaults.output_limit_bytes,
        };

        let binary = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        let interpreters = Interpreters {
            powershell: binary("SCRIPT_POWERSHELL_BIN", defaults.interpreters.powershell),
            cmd: binary("SCRIPT_CMD_BIN", defaults.interpreters.cmd),
            python: binary("SCRIPT_PYTHON_BIN", defaults.interpreters.python),
        };

        Ok(Self {
            timeout,
            output_limit_bytes,
            interpreters,
        })
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
