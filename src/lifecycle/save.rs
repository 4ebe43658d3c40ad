//! Save File and Ensure Executable

use chrono::Local;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::lifecycle::paths::{require_absolute, resolve_within, sanitize_filename};
use crate::lifecycle::LifecycleError;

const WRITE_PROBE: &str = ".write-test";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Copy an existing file to `<name>.<YYYYmmdd-HHMMSS>.bak` before overwriting
    pub backup_on_overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    pub path: PathBuf,
    /// Filename actually used after sanitization
    pub filename: String,
    pub sanitized: bool,
    pub backup: Option<PathBuf>,
    pub executable: bool,
}

/// Scoped write probe, removed on drop
struct WriteProbe {
    path: PathBuf,
}

impl WriteProbe {
    fn create(dir: &Path) -> std::io::Result<Self> {
        let path = dir.join(WRITE_PROBE);
        let mut file = fs::File::create(&path)?;
        file.write_all(b"test")?;
        Ok(Self { path })
    }
}

impl Drop for WriteProbe {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn is_shell_script(name: &str) -> bool {
    name.ends_with(".sh") || name.ends_with(".bash")
}

/// Write `content` to `directory/filename`, creating the directory and
/// overwriting any previous file.
pub fn save_file(
    directory: &str,
    filename: &str,
    content: &[u8],
    opts: SaveOptions,
) -> Result<SavedFile, LifecycleError> {
    let dir = require_absolute(directory, "Directory")?;
    if filename.trim().is_empty() {
        return Err(LifecycleError::InvalidInput("Filename is required".to_string()));
    }

    let clean = sanitize_filename(filename);
    let sanitized = clean != filename;
    if sanitized {
        warn!(original = filename, sanitized = %clean, "Filename sanitized");
    }
    if clean == "." || clean == ".." {
        return Err(LifecycleError::InvalidInput(format!("Invalid filename: {}", filename)));
    }

    fs::create_dir_all(&dir).map_err(|source| LifecycleError::CreateDirectory {
        path: dir.clone(),
        source,
    })?;

    {
        let _probe = WriteProbe::create(&dir).map_err(|source| LifecycleError::NotWritable {
            path: dir.clone(),
            source,
        })?;
    }

    let target = resolve_within(&dir, &clean)?;

    let backup = if opts.backup_on_overwrite && target.is_file() {
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let backup_path = dir.join(format!("{}.{}.bak", clean, stamp));
        fs::copy(&target, &backup_path).map_err(|source| LifecycleError::WriteFailed {
            path: backup_path.clone(),
            source,
        })?;
        debug!(backup = %backup_path.display(), "Previous file backed up");
        Some(backup_path)
    } else {
        None
    };

    // Atomic write: temp file then rename
    let temp_path = dir.join(format!(".{}.tmp", clean));
    let written = fs::write(&temp_path, content).and_then(|_| fs::rename(&temp_path, &target));
    if let Err(source) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(LifecycleError::WriteFailed {
            path: target,
            source,
        });
    }

    let executable = is_shell_script(&clean) && make_executable(&target);

    info!(path = %target.display(), bytes = content.len(), "File saved");
    Ok(SavedFile {
        path: target,
        filename: clean,
        sanitized,
        backup,
        executable,
    })
}

/// chmod 755. Failure is logged and reported as `false`.
#[cfg(unix)]
fn make_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match fs::set_permissions(path, fs::Permissions::from_mode(0o755)) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to set executable permission");
            false
        }
    }
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> bool {
    false
}

/// Normalize a script to mode 755 when it is not already executable.
/// Returns whether the mode was changed.
#[cfg(unix)]
pub fn ensure_executable(path: &Path) -> Result<bool, LifecycleError> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path)?.permissions().mode();
    if mode & 0o111 == 0o111 {
        return Ok(false);
    }
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    debug!(path = %path.display(), old_mode = mode & 0o777, "Made executable");
    Ok(true)
}

#[cfg(not(unix))]
pub fn ensure_executable(path: &Path) -> Result<bool, LifecycleError> {
    fs::metadata(path)?;
    Ok(false)
}
