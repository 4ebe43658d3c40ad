//! Read Directory Recursive

use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::lifecycle::exclusions::ExclusionSet;
use crate::lifecycle::paths::to_slash;
use crate::lifecycle::LifecycleError;

/// One file found under the walked directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    /// Path relative to the walked root, `/`-separated
    pub relative_path: String,
    pub content: Vec<u8>,
}

/// Collect every non-excluded file below `dir`, sorted by path.
/// Symlinks are not followed and unreadable files are skipped.
pub fn read_directory_recursive(dir: &Path, venv_name: Option<&str>) -> Result<Vec<TreeFile>, LifecycleError> {
    if !dir.is_dir() {
        return Err(LifecycleError::DirectoryNotFound(dir.to_path_buf()));
    }
    let exclusions = ExclusionSet::new(venv_name);

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !exclusions.is_excluded(&entry.file_name().to_string_lossy())
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(dir) else {
            continue;
        };
        match fs::read(entry.path()) {
            Ok(content) => files.push(TreeFile {
                relative_path: to_slash(rel),
                content,
            }),
            Err(e) => warn!(path = %entry.path().display(), error = %e, "Skipping unreadable file"),
        }
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    debug!(dir = %dir.display(), count = files.len(), "Directory read");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_nested_files_and_skips_excluded() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("app/templates")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::create_dir_all(root.join("SHOP_VENV/bin")).unwrap();
        fs::create_dir_all(root.join("app/__pycache__")).unwrap();
        fs::write(root.join("manage.py"), "print()").unwrap();
        fs::write(root.join("app/templates/index.html"), "<h1/>").unwrap();
        fs::write(root.join("app/views.pyc"), "x").unwrap();
        fs::write(root.join("app/__pycache__/views.cpython.pyc"), "x").unwrap();
        fs::write(root.join(".git/objects/ab"), "x").unwrap();
        fs::write(root.join("SHOP_VENV/bin/python"), "x").unwrap();
        fs::write(root.join(".DS_Store"), "x").unwrap();

        let files = read_directory_recursive(root, Some("SHOP_VENV")).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["app/templates/index.html", "manage.py"]);
        assert_eq!(files[1].content, b"print()");
    }

    #[test]
    fn test_custom_venv_name_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("py311/lib")).unwrap();
        fs::write(tmp.path().join("py311/lib/site.py"), "x").unwrap();
        assert!(read_directory_recursive(tmp.path(), Some("py311")).unwrap().is_empty());
        assert_eq!(read_directory_recursive(tmp.path(), None).unwrap().len(), 1);
    }
}
