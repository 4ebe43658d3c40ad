//! Repository catalog
//!
//! The catalog is versioned configuration: an ordered list of categories,
//! each a named group of repository descriptors. A built-in catalog is
//! embedded at compile time and can be extended by a user file.

pub mod descriptor;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub use descriptor::{slug_from_url, Dependencies, Framework, RepositoryDescriptor, SetupCommands};

// Embed the catalog data file directly in the binary at compile time
const BUILTIN_CATALOG: &str = include_str!("../../catalog.toml");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog file not found: {0}")]
    NotFound(String),
    #[error("Failed to read catalog: {0}")]
    ReadError(String),
    #[error("Failed to parse catalog: {0}")]
    ParseError(String),
    #[error("Invalid catalog entry '{name}': {reason}")]
    InvalidEntry { name: String, reason: String },
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::NotFound(_) => "catalog_not_found",
            CatalogError::ReadError(_) => "catalog_read_error",
            CatalogError::ParseError(_) => "catalog_parse_error",
            CatalogError::InvalidEntry { .. } => "catalog_invalid_entry",
        }
    }
}

/// Named group of descriptors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "category")]
    pub name: String,
    #[serde(default)]
    pub repos: Vec<RepositoryDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Catalog {
    /// The catalog shipped with the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Load an additional catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound(path.display().to_string()));
        }
        let content =
            fs::read_to_string(path).map_err(|e| CatalogError::ReadError(e.to_string()))?;
        let catalog = Self::from_toml_str(&content)?;
        info!(path = %path.display(), repos = catalog.len(), "Catalog file loaded");
        Ok(catalog)
    }

    /// Parse, validate and deduplicate a catalog document
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog =
            toml::from_str(content).map_err(|e| CatalogError::ParseError(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog.dedup())
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for repo in self.categories.iter().flat_map(|c| c.repos.iter()) {
            if repo.name.trim().is_empty() {
                return Err(CatalogError::InvalidEntry {
                    name: repo.url.clone(),
                    reason: "name is empty".to_string(),
                });
            }
            if repo.url.trim().is_empty() {
                return Err(CatalogError::InvalidEntry {
                    name: repo.name.clone(),
                    reason: "url is empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Keep the first occurrence of every url. Categories left empty are dropped.
    pub fn dedup(self) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut categories = Vec::with_capacity(self.categories.len());

        for mut category in self.categories {
            category.repos.retain(|repo| {
                let fresh = seen.insert(url_key(&repo.url));
                if !fresh {
                    debug!(category = %category.name, url = %repo.url, "Dropping duplicate catalog entry");
                }
                fresh
            });
            if !category.repos.is_empty() {
                categories.push(category);
            }
        }

        Self { categories }
    }

    /// Append another catalog. Categories with the same name are merged,
    /// and entries already present (by url) keep their first definition.
    pub fn merge(mut self, other: Catalog) -> Self {
        for category in other.categories {
            match self.categories.iter_mut().find(|c| c.name == category.name) {
                Some(existing) => existing.repos.extend(category.repos),
                None => self.categories.push(category),
            }
        }
        self.dedup()
    }

    /// Look up a descriptor by clone URL
    pub fn find(&self, url: &str) -> Option<&RepositoryDescriptor> {
        let key = url_key(url);
        self.iter().find(|repo| url_key(&repo.url) == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryDescriptor> {
        self.categories.iter().flat_map(|c| c.repos.iter())
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.repos.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn url_key(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
