//! Application configuration (~/.devsetup/config.toml)

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{Catalog, CatalogError};
use crate::generator::{DatabaseBackend, SetupOptions};
use crate::lifecycle::SaveOptions;

pub const DEFAULT_PORT: u16 = 47990;
pub const PORT_ENV: &str = "DEVSETUP_PORT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::ReadError(_) => "config_read_error",
            ConfigError::ParseError(_) => "config_parse_error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub save: SaveSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SaveSection {
    #[serde(default)]
    pub backup_on_overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CatalogSection {
    /// Extra catalog merged after the built-in one
    pub path: Option<PathBuf>,
}

/// Defaults applied on top of per-repository auto-configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DefaultsSection {
    pub venv_name: Option<String>,
    pub database: Option<DatabaseBackend>,
    pub admin_user: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub server_port: Option<u16>,
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".devsetup").join("config.toml"))
    }

    /// Load from the default location. No home directory or no file
    /// means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("Home directory not available, using default config");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Server port, `DEVSETUP_PORT` wins over the file
    pub fn effective_port(&self) -> u16 {
        env::var(PORT_ENV)
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(self.server.port)
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            backup_on_overwrite: self.save.backup_on_overwrite,
        }
    }

    /// Built-in catalog, merged with the configured extra file if any
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        let builtin = Catalog::builtin()?;
        match &self.catalog.path {
            Some(path) => Ok(builtin.merge(Catalog::load(path)?)),
            None => Ok(builtin),
        }
    }

    pub fn apply_defaults(&self, opts: &mut SetupOptions) {
        let d = &self.defaults;
        if let Some(venv) = &d.venv_name {
            opts.venv_name = venv.clone();
        }
        if let Some(db) = d.database {
            opts.database = db;
        }
        if let Some(user) = &d.admin_user {
            opts.admin.username = user.clone();
        }
        if let Some(email) = &d.admin_email {
            opts.admin.email = email.clone();
        }
        if let Some(password) = &d.admin_password {
            opts.admin.password = password.clone();
        }
        if let Some(port) = d.server_port {
            opts.server_port = port;
        }
    }
}
