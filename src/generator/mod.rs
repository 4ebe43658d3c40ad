//! Setup-script generator
//!
//! Maps a repository descriptor and a set of options onto shell script
//! text. Nothing in here touches the file system.

pub mod companion;
pub mod framework;
pub mod options;
pub mod setup;
pub mod shell;
pub mod template;

use thiserror::Error;

pub use companion::{generate_bundle, ScriptBundle};
pub use framework::Stage;
pub use options::{AdminAccount, DatabaseBackend, SetupOptions};
pub use setup::{generate_setup_script, resolve_stage, CommandSource, Resolved};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("Repository URL is required")]
    MissingUrl,
    #[error("Invalid repository URL: {0}")]
    InvalidUrl(String),
    #[error("Project path is required")]
    MissingProjectPath,
    #[error("Invalid virtual environment name: '{0}'")]
    InvalidVenvName(String),
    #[error("Invalid server port: {0}")]
    InvalidPort(u16),
    #[error("Admin {field} must not contain the placeholder {token}")]
    PlaceholderInValue { field: String, token: String },
    #[error("Unknown reset mode '{0}' (expected repo, env or workspace)")]
    UnknownResetMode(String),
}

impl GeneratorError {
    pub fn code(&self) -> &'static str {
        match self {
            GeneratorError::MissingUrl => "missing_url",
            GeneratorError::InvalidUrl(_) => "invalid_url",
            GeneratorError::MissingProjectPath => "missing_project_path",
            GeneratorError::InvalidVenvName(_) => "invalid_venv_name",
            GeneratorError::InvalidPort(_) => "invalid_port",
            GeneratorError::PlaceholderInValue { .. } => "placeholder_in_value",
            GeneratorError::UnknownResetMode(_) => "unknown_reset_mode",
        }
    }
}
