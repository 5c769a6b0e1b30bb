//! Integration tests for script discovery and the host binary.

use std::path::Path;
use std::process::Command;

use scriptinvoker_host::discovery::discover_scripts;
use scriptinvoker_host::exit_codes;

fn touch(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).expect("write file");
}

// ---------------------------------------------------------------------------
// Test: discovery
// ---------------------------------------------------------------------------

/// Only files with a supported extension are returned, in sorted order,
/// regardless of extension case. A bare `.ps1` counts, as it does for
/// `ScriptInvoker::new`.
#[tokio::test]
async fn discovery_filters_and_sorts() {
    let dir = tempfile::tempdir().expect("tempdir");
    touch(dir.path(), "b.py", "");
    touch(dir.path(), "a.PS1", "");
    touch(dir.path(), "c.bat", "");
    touch(dir.path(), "d.cmd", "");
    touch(dir.path(), ".ps1", "");
    touch(dir.path(), "notes.txt", "");
    touch(dir.path(), "run.sh", "");
    touch(dir.path(), "README", "");
    std::fs::create_dir(dir.path().join("nested.py")).expect("mkdir");

    let scripts = discover_scripts(dir.path()).await.expect("discover");
    let names: Vec<_> = scripts
        .iter()
        .map(|p| p.file_name().and_then(|n| n.to_str()).expect("name"))
        .collect();

    assert_eq!(names, [".ps1", "a.PS1", "b.py", "c.bat", "d.cmd"]);
}

#[tokio::test]
async fn discovery_of_missing_directory_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = discover_scripts(&dir.path().join("missing")).await;
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Test: host binary
// ---------------------------------------------------------------------------

fn host() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_scriptinvoker-host"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn host_lists_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    touch(dir.path(), "f.py", "");
    touch(dir.path(), "g.txt", "");

    let output = host().arg(dir.path()).output().expect("run host");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.trim().ends_with("f.py"));
}

#[test]
fn host_rejects_unsupported_script() {
    let dir = tempfile::tempdir().expect("tempdir");
    touch(dir.path(), "run.sh", "echo hi\n");

    let output = host()
        .arg(dir.path().join("run.sh"))
        .output()
        .expect("run host");

    assert_eq!(output.status.code(), Some(exit_codes::UNSUPPORTED));
    assert!(output.stdout.is_empty());
}

#[cfg(unix)]
#[test]
fn host_runs_script_and_maps_exit_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    touch(dir.path(), "ok.py", "echo \"in: $1\"\n");
    touch(dir.path(), "fail.py", "echo out\nexit 2\n");

    let output = host()
        .env("SCRIPT_PYTHON_BIN", "sh")
        .arg(dir.path().join("ok.py"))
        .arg("hello world")
        .output()
        .expect("run host");
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(output.stdout, b"in: hello world\n");

    let output = host()
        .env("SCRIPT_PYTHON_BIN", "sh")
        .arg("--json")
        .arg(dir.path().join("fail.py"))
        .output()
        .expect("run host");
    assert_eq!(output.status.code(), Some(exit_codes::SCRIPT_FAILED));
    assert_eq!(output.stdout, b"out\n");
    let stderr = String::from_utf8(output.stderr).expect("utf8");
    assert!(stderr.contains("\"status\":\"failed\""), "stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn host_reports_timeout() {
    let dir = tempfile::tempdir().expect("tempdir");
    touch(dir.path(), "slow.py", "sleep 60\n");

    let output = host()
        .env("SCRIPT_PYTHON_BIN", "sh")
        .arg("--timeout-secs")
        .arg("1")
        .arg(dir.path().join("slow.py"))
        .output()
        .expect("run host");

    assert_eq!(output.status.code(), Some(exit_codes::TIMED_OUT));
}
