//! Workspace lifecycle manager
//!
//! Stateless file-system operations on a caller-supplied directory:
//! save, selective delete, archive and recursive read. Every call
//! re-reads the directory.

pub mod archive;
pub mod delete;
pub mod error;
pub mod exclusions;
pub mod paths;
pub mod save;
pub mod tree;

pub use archive::{archive_workspace, tar_arguments};
pub use delete::{delete_items, delete_items_with, remove_entry, DeleteMode, DeleteReport};
pub use error::{ItemFailure, LifecycleError};
pub use exclusions::ExclusionSet;
pub use paths::{require_absolute, sanitize_filename};
pub use save::{ensure_executable, save_file, SaveOptions, SavedFile};
pub use tree::{read_directory_recursive, TreeFile};
