//! Control-plane protocol
//!
//! JSON text frames, internally tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::catalog::{Category, Framework, RepositoryDescriptor};
use crate::generator::SetupOptions;
use crate::lifecycle::DeleteMode;

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentEncoding {
    #[default]
    Utf8,
    Base64,
}

fn default_reset_mode() -> DeleteMode {
    DeleteMode::Env
}

/// Requests sent by a UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,

    ListCatalog,

    /// Look up `repo_url` in the catalog, or use an inline `repo`
    GenerateScripts {
        #[serde(default)]
        repo_url: Option<String>,
        #[serde(default)]
        repo: Option<RepositoryDescriptor>,
        /// Framework for a URL not found in the catalog
        #[serde(default)]
        framework: Option<Framework>,
        #[serde(default)]
        options: Option<SetupOptions>,
        #[serde(default = "default_reset_mode")]
        reset_mode: DeleteMode,
    },

    SaveFile {
        directory: String,
        filename: String,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        encoding: ContentEncoding,
    },

    /// Generate and save every companion file into `directory`
    SaveBundle {
        directory: String,
        #[serde(default)]
        repo_url: Option<String>,
        #[serde(default)]
        repo: Option<RepositoryDescriptor>,
        #[serde(default)]
        framework: Option<Framework>,
        #[serde(default)]
        options: Option<SetupOptions>,
        #[serde(default = "default_reset_mode")]
        reset_mode: DeleteMode,
    },

    DeleteItems {
        directory: String,
        mode: DeleteMode,
        venv_name: String,
    },

    ArchiveWorkspace {
        source_dir: String,
        dest_path: String,
        #[serde(default)]
        venv_name: Option<String>,
    },

    ReadDirectory {
        directory: String,
        #[serde(default)]
        venv_name: Option<String>,
    },

    LogEntry {
        level: String,
        #[serde(default = "default_log_source")]
        source: String,
        #[serde(default)]
        category: Option<String>,
        msg: String,
        #[serde(default)]
        detail: Option<String>,
    },
}

fn default_log_source() -> String {
    "client".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedFile {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedFileInfo {
    pub filename: String,
    pub path: String,
    pub sanitized: bool,
    pub executable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryFile {
    pub relative_path: String,
    /// Base64
    pub content: String,
}

/// Responses and notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Hello {
        version: u32,
        capabilities: Vec<String>,
    },
    Pong,
    Catalog {
        categories: Vec<Category>,
    },
    Scripts {
        repo: RepositoryDescriptor,
        files: Vec<GeneratedFile>,
    },
    FileSaved {
        file: SavedFileInfo,
    },
    BundleSaved {
        directory: String,
        files: Vec<SavedFileInfo>,
    },
    ItemsDeleted {
        count: usize,
        skipped: usize,
    },
    WorkspaceArchived {
        path: String,
    },
    DirectoryContents {
        directory: String,
        files: Vec<DirectoryFile>,
    },
    Error {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<usize>,
    },
}

pub fn capabilities() -> Vec<String> {
    [
        "catalog",
        "script_generation",
        "companion_scripts",
        "save_file",
        "save_bundle",
        "delete_items",
        "archive_workspace",
        "read_directory",
        "client_log",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
