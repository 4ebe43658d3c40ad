//! Path safety helpers

use std::path::{Component, Path, PathBuf};

use crate::lifecycle::LifecycleError;

/// Maximum accepted path length
pub const MAX_PATH_LENGTH: usize = 4096;

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
/// Idempotent: sanitizing a sanitized name is a no-op.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Reject empty and relative directory arguments
pub fn require_absolute(dir: &str, what: &str) -> Result<PathBuf, LifecycleError> {
    let trimmed = dir.trim();
    if trimmed.is_empty() {
        return Err(LifecycleError::InvalidInput(format!("{} is required", what)));
    }
    if trimmed.len() > MAX_PATH_LENGTH {
        return Err(LifecycleError::InvalidInput(format!("{} exceeds maximum length", what)));
    }
    let path = PathBuf::from(trimmed);
    if !path.is_absolute() {
        return Err(LifecycleError::InvalidInput(format!(
            "{} must be an absolute path: {}",
            what, trimmed
        )));
    }
    Ok(path)
}

/// Join a relative path onto `root`, refusing anything that would escape it
pub fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf, LifecycleError> {
    let mut resolved = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(LifecycleError::InvalidInput(format!(
                    "Path escapes {}: {}",
                    root.display(),
                    relative
                )));
            }
        }
    }
    Ok(resolved)
}

/// Relative path with `/` separators
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
