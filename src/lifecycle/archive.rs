//! Archive Workspace via the system `tar`

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::lifecycle::exclusions::ExclusionSet;
use crate::lifecycle::paths::to_slash;
use crate::lifecycle::LifecycleError;

pub const UNSUPPORTED_PLATFORM_MSG: &str =
    "Native archive is not implemented on this platform. Please use Linux/Mac or manual mode.";

/// Canonical form of `dest` relative to `source` when the archive would be
/// written inside the tree being archived
fn dest_inside_source(source: &Path, dest: &Path) -> Option<String> {
    let source = source.canonicalize().ok()?;
    let parent = dest.parent()?.canonicalize().ok()?;
    let file_name = dest.file_name()?;
    let rel = parent.join(file_name).strip_prefix(&source).ok()?.to_path_buf();
    Some(to_slash(&rel))
}

/// Arguments for `tar`: gzip, exclusions, then the source contents as `.`
pub fn tar_arguments(source: &Path, dest: &Path, venv_name: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "-czf".to_string(),
        dest.to_string_lossy().into_owned(),
        "-C".to_string(),
        source.to_string_lossy().into_owned(),
    ];
    args.extend(ExclusionSet::new(venv_name).tar_patterns());
    if let Some(rel) = dest_inside_source(source, dest) {
        args.push(format!("--exclude=./{}", rel));
    }
    args.push(".".to_string());
    args
}

/// Write a gzip tar of `source` to `dest`. Returns the archive path.
pub async fn archive_workspace(
    source: &Path,
    dest: &Path,
    venv_name: Option<&str>,
) -> Result<PathBuf, LifecycleError> {
    if cfg!(windows) {
        return Err(LifecycleError::UnsupportedPlatform(UNSUPPORTED_PLATFORM_MSG.to_string()));
    }
    if source.as_os_str().is_empty() || dest.as_os_str().is_empty() {
        return Err(LifecycleError::InvalidInput(
            "Source directory and destination path are required".to_string(),
        ));
    }
    if !source.is_dir() {
        return Err(LifecycleError::DirectoryNotFound(source.to_path_buf()));
    }

    let tar = which::which("tar").map_err(|_| LifecycleError::ToolMissing("tar".to_string()))?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| LifecycleError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let args = tar_arguments(source, dest, venv_name);
    debug!(tar = %tar.display(), ?args, "Running tar");

    let output = Command::new(&tar)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(LifecycleError::ArchiveFailed {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        });
    }

    info!(source = %source.display(), dest = %dest.display(), "Workspace archived");
    Ok(dest.to_path_buf())
}
