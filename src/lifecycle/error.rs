use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Per-entry failure collected during a deletion pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub name: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDirectory { path: PathBuf, source: io::Error },

    #[error("Directory is not writable {}: {source}", .path.display())]
    NotWritable { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailed { path: PathBuf, source: io::Error },

    #[error("Partial deletion. Failed: {}", join_failures(.failures))]
    PartialDeletion {
        removed: usize,
        failures: Vec<ItemFailure>,
    },

    #[error("{0}")]
    UnsupportedPlatform(String),

    #[error("Required tool '{0}' was not found on PATH")]
    ToolMissing(String),

    #[error("Tar process failed (code {code}): {stderr}")]
    ArchiveFailed { code: i32, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn join_failures(failures: &[ItemFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.name, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl LifecycleError {
    pub fn code(&self) -> &'static str {
        match self {
            LifecycleError::InvalidInput(_) => "invalid_input",
            LifecycleError::DirectoryNotFound(_) => "not_found",
            LifecycleError::CreateDirectory { source, .. }
            | LifecycleError::NotWritable { source, .. }
            | LifecycleError::WriteFailed { source, .. } => io_code(source),
            LifecycleError::PartialDeletion { .. } => "partial_failure",
            LifecycleError::UnsupportedPlatform(_) => "unsupported_platform",
            LifecycleError::ToolMissing(_) => "tool_missing",
            LifecycleError::ArchiveFailed { .. } => "archive_failed",
            LifecycleError::Io(e) => io_code(e),
        }
    }

    /// Entries removed before the failure, for partial deletions
    pub fn removed_count(&self) -> Option<usize> {
        match self {
            LifecycleError::PartialDeletion { removed, .. } => Some(*removed),
            _ => None,
        }
    }
}

fn io_code(e: &io::Error) -> &'static str {
    match e.kind() {
        io::ErrorKind::PermissionDenied => "permission_denied",
        io::ErrorKind::NotFound => "not_found",
        _ => "io_error",
    }
}
