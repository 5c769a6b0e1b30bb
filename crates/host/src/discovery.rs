//! Function discovery: find candidate script files in a directory.

use std::path::{Path, PathBuf};

use scriptinvoker_core::ScriptKind;

/// List the regular files directly inside `dir` whose extension has an
/// interpreter, sorted by path.
///
/// Files are matched with [`ScriptKind::from_path`], the same rule
/// `ScriptInvoker` applies, so a bare `.ps1` is listed too. Subdirectories
/// are not descended into.
pub async fn discover_scripts(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut scripts = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        if ScriptKind::from_path(&path).is_ok() {
            scripts.push(path);
        } else {
            tracing::debug!(path = %path.display(), "Skipping unsupported file");
        }
    }

    scripts.sort();
    Ok(scripts)
}
