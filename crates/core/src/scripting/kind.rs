//! Interpreter resolution from script file extensions.
//!
//! Pure functions only: no I/O, case-insensitive, deterministic.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::InvokeError;

/// Extensions (lower-case, without the leading dot) that map to an interpreter.
pub const SUPPORTED_SCRIPT_TYPES: [&str; 4] = ["ps1", "cmd", "bat", "py"];

/// Interpreter a script is executed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    /// `.ps1`, run with PowerShell.
    PowerShell,
    /// `.cmd` / `.bat`, run with the system command shell.
    WindowsBatch,
    /// `.py`, run with Python.
    Python,
}

impl ScriptKind {
    /// Resolve an extension such as `"PS1"`, `".py"` or `"bat"`.
    ///
    /// Returns `None` for anything outside [`SUPPORTED_SCRIPT_TYPES`].
    pub fn from_extension(extension: &str) -> Option<Self> {
        match normalize_extension(extension).as_str() {
            "ps1" => Some(Self::PowerShell),
            "cmd" | "bat" => Some(Self::WindowsBatch),
            "py" => Some(Self::Python),
            _ => None,
        }
    }

    /// Resolve the kind of the script at `path` from its file name.
    pub fn from_path(path: &Path) -> Result<Self, InvokeError> {
        let extension = extension_of(path);
        Self::from_extension(&extension).ok_or(InvokeError::UnsupportedScriptType { extension })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PowerShell => "powershell",
            Self::WindowsBatch => "windows_batch",
            Self::Python => "python",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `extension` names a supported script type.
///
/// Lets a host check a bare extension before an invoker is constructed.
/// `".PS1"`, `"ps1"` and `".ps1"` are equivalent.
pub fn is_supported_script_type(extension: &str) -> bool {
    ScriptKind::from_extension(extension).is_some()
}

fn normalize_extension(extension: &str) -> String {
    extension.to_lowercase().trim_start_matches('.').to_string()
}

/// Lower-cased text after the last `.` of the file name, or `""`.
///
/// Unlike [`Path::extension`], a bare `.ps1` file name yields `ps1`.
fn extension_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn supported_types_ignore_case_and_leading_dot() {
        for ext in SUPPORTED_SCRIPT_TYPES {
            let upper = ext.to_uppercase();
            for variant in [
                ext.to_string(),
                format!(".{ext}"),
                upper.clone(),
                format!(".{upper}"),
            ] {
                assert!(
                    is_supported_script_type(&variant),
                    "{variant} should be supported"
                );
            }
        }
    }

    #[test]
    fn unsupported_types() {
        for ext in ["sh", ".sh", "php", "", ".", "exe", "ps", "pyc", "ps1x"] {
            assert!(!is_supported_script_type(ext), "{ext:?} should be rejected");
        }
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(ScriptKind::from_extension("ps1"), Some(ScriptKind::PowerShell));
        assert_eq!(ScriptKind::from_extension("CMD"), Some(ScriptKind::WindowsBatch));
        assert_eq!(ScriptKind::from_extension(".bat"), Some(ScriptKind::WindowsBatch));
        assert_eq!(ScriptKind::from_extension("..py"), Some(ScriptKind::Python));
        assert_eq!(ScriptKind::from_extension("php"), None);
    }

    #[test]
    fn from_path_uses_last_extension() {
        let kind = ScriptKind::from_path(Path::new("/funcs/archive.tar.PY")).expect("resolve");
        assert_eq!(kind, ScriptKind::Python);

        let kind = ScriptKind::from_path(Path::new("run.Bat")).expect("resolve");
        assert_eq!(kind, ScriptKind::WindowsBatch);
    }

    #[test]
    fn from_path_accepts_dot_only_file_name() {
        let kind = ScriptKind::from_path(Path::new("scripts/.ps1")).expect("resolve");
        assert_eq!(kind, ScriptKind::PowerShell);
    }

    #[test]
    fn from_path_rejects_unsupported() {
        assert_matches!(
            ScriptKind::from_path(Path::new("/funcs/run.sh")),
            Err(InvokeError::UnsupportedScriptType { extension }) if extension == "sh"
        );
        assert_matches!(
            ScriptKind::from_path(Path::new("/funcs/Makefile")),
            Err(InvokeError::UnsupportedScriptType { extension }) if extension.is_empty()
        );
    }

    #[test]
    fn directory_dots_are_not_extensions() {
        assert_matches!(
            ScriptKind::from_path(Path::new("/funcs.py/run")),
            Err(InvokeError::UnsupportedScriptType { .. })
        );
    }

    #[test]
    fn kind_display() {
        assert_eq!(ScriptKind::PowerShell.to_string(), "powershell");
        assert_eq!(ScriptKind::WindowsBatch.to_string(), "windows_batch");
        assert_eq!(ScriptKind::Python.to_string(), "python");
    }
}
