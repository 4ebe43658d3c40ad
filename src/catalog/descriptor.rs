//! Repository descriptors as they appear in the catalog

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Coarse classifier selecting the default command templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Django,
    Flask,
    Fastapi,
    Frappe,
    #[default]
    Generic,
}

impl Framework {
    pub const ALL: [Framework; 5] = [
        Framework::Django,
        Framework::Flask,
        Framework::Fastapi,
        Framework::Frappe,
        Framework::Generic,
    ];

    /// Map a framework tag to a framework. Unknown tags fall back to `Generic`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "django" => Framework::Django,
            "flask" => Framework::Flask,
            "fastapi" => Framework::Fastapi,
            "frappe" => Framework::Frappe,
            _ => Framework::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Django => "django",
            Framework::Flask => "flask",
            Framework::Fastapi => "fastapi",
            Framework::Frappe => "frappe",
            Framework::Generic => "generic",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Framework {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Framework::from_tag(&tag))
    }
}

/// Per-repository overrides for the script pipeline stages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupCommands {
    #[serde(default, alias = "preInstall", skip_serializing_if = "Option::is_none")]
    pub pre_install: Option<String>,
    #[serde(default, alias = "postInstall", skip_serializing_if = "Option::is_none")]
    pub post_install: Option<String>,
    #[serde(default, alias = "adminCreate", skip_serializing_if = "Option::is_none")]
    pub admin_create: Option<String>,
    #[serde(default, alias = "demoData", skip_serializing_if = "Option::is_none")]
    pub demo_data: Option<String>,
    #[serde(default, alias = "runServer", skip_serializing_if = "Option::is_none")]
    pub run_server: Option<String>,
}

/// Dependency declaration. `command` wins over `files`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependencies {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

/// Immutable catalog entry describing one scaffoldable repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub framework: Framework,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<String>,
    #[serde(default, alias = "setupCommands", skip_serializing_if = "Option::is_none")]
    pub setup_commands: Option<SetupCommands>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Dependencies>,
}

impl RepositoryDescriptor {
    /// Descriptor for a repository that is not in the catalog
    pub fn custom(url: &str, framework: Framework) -> Self {
        let url = url.trim().to_string();
        Self {
            name: slug_from_url(&url),
            url,
            framework,
            description: None,
            complexity: None,
            stars: None,
            setup_commands: None,
            dependencies: None,
        }
    }

    /// Short lowercase identifier derived from the clone URL
    pub fn slug(&self) -> String {
        slug_from_url(&self.url)
    }

    /// Label shown in pickers, e.g. `Saleor (20k+)`
    pub fn display_label(&self) -> String {
        match &self.stars {
            Some(stars) => format!("{} ({})", self.name, stars),
            None => self.name.clone(),
        }
    }
}

/// Last path segment of a clone URL without `.git`, lowercased, with every
/// character outside `[a-z0-9]` collapsed into a single `-`.
pub fn slug_from_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed);
    let last = last.strip_suffix(".git").unwrap_or(last);

    let mut slug = String::with_capacity(last.len());
    for c in last.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "project".to_string()
    } else {
        slug
    }
}
