//! Delete Items: selective removal of a directory's top-level entries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::lifecycle::error::ItemFailure;
use crate::lifecycle::LifecycleError;

/// Entries removed by `env` mode besides the venv itself
pub const ENV_ARTIFACTS: &[&str] = &["node_modules", "db.sqlite3", "__pycache__"];

const UNREADABLE_ENTRY: &str = "<unreadable entry>";

/// Which top-level entries a deletion pass removes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeleteMode {
    /// Everything except the venv
    Repo,
    /// The venv plus build artifacts
    Env,
    /// Everything
    Workspace,
    Unrecognized(String),
}

impl DeleteMode {
    /// Inclusion rule for one top-level entry name
    pub fn selects(&self, name: &str, venv_name: &str) -> bool {
        match self {
            DeleteMode::Repo => name != venv_name,
            DeleteMode::Env => {
                name == venv_name || ENV_ARTIFACTS.contains(&name) || name.ends_with(".pyc")
            }
            DeleteMode::Workspace => true,
            DeleteMode::Unrecognized(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeleteMode::Repo => "repo",
            DeleteMode::Env => "env",
            DeleteMode::Workspace => "workspace",
            DeleteMode::Unrecognized(other) => other,
        }
    }
}

impl From<String> for DeleteMode {
    fn from(value: String) -> Self {
        DeleteMode::from(value.as_str())
    }
}

impl From<&str> for DeleteMode {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "repo" => DeleteMode::Repo,
            "env" => DeleteMode::Env,
            "workspace" => DeleteMode::Workspace,
            _ => DeleteMode::Unrecognized(value.to_string()),
        }
    }
}

impl From<DeleteMode> for String {
    fn from(mode: DeleteMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub removed: usize,
    pub skipped: usize,
}

/// Remove one entry without following symlinks. A vanished entry counts
/// as removed.
pub fn remove_entry(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Collect `(display name, real path)` pairs. Removal goes through the real
/// path; the lossy name is only for matching and messages. Entries that
/// cannot be read are recorded as failures.
fn gather_entries<I>(listing: I, failures: &mut Vec<ItemFailure>) -> Vec<(String, PathBuf)>
where
    I: Iterator<Item = io::Result<(String, PathBuf)>>,
{
    let mut entries = Vec::new();
    for entry in listing {
        match entry {
            Ok(pair) => entries.push(pair),
            Err(e) => {
                warn!(error = %e, "Failed to read directory entry");
                failures.push(ItemFailure {
                    name: UNREADABLE_ENTRY.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
    entries
}

pub fn delete_items(directory: &Path, mode: &DeleteMode, venv_name: &str) -> Result<DeleteReport, LifecycleError> {
    delete_items_with(directory, mode, venv_name, remove_entry)
}

/// Deletion pass with an injectable remover. Keeps going after a failure
/// and reports every failed entry at the end.
pub fn delete_items_with<F>(
    directory: &Path,
    mode: &DeleteMode,
    venv_name: &str,
    mut remove: F,
) -> Result<DeleteReport, LifecycleError>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    if !directory.is_dir() {
        return Err(LifecycleError::DirectoryNotFound(directory.to_path_buf()));
    }
    if let DeleteMode::Unrecognized(other) = mode {
        warn!(mode = %other, dir = %directory.display(), "Unknown delete mode, nothing removed");
    }

    let mut report = DeleteReport::default();
    let mut failures = Vec::new();

    let listing = fs::read_dir(directory)?
        .map(|entry| entry.map(|e| (e.file_name().to_string_lossy().into_owned(), e.path())));
    let mut entries = gather_entries(listing, &mut failures);
    entries.sort();

    for (name, path) in entries {
        if !mode.selects(&name, venv_name) {
            report.skipped += 1;
            continue;
        }
        match remove(&path) {
            Ok(()) => {
                debug!(entry = %name, "Removed");
                report.removed += 1;
            }
            Err(e) => {
                warn!(entry = %name, error = %e, "Failed to remove entry");
                failures.push(ItemFailure {
                    name,
                    message: e.to_string(),
                });
            }
        }
    }

    if !failures.is_empty() {
        return Err(LifecycleError::PartialDeletion {
            removed: report.removed,
            failures,
        });
    }

    info!(
        dir = %directory.display(),
        mode = %mode,
        removed = report.removed,
        skipped = report.skipped,
        "Delete items finished"
    );
    Ok(report)
}
