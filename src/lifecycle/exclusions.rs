//! Exclusion rules shared by archiving and recursive reads

/// Directory and file names never archived or read
pub const EXCLUDED_NAMES: &[&str] = &[
    ".git",
    "node_modules",
    "venv",
    ".venv",
    "__pycache__",
    ".pytest_cache",
    ".vscode",
    ".idea",
    ".DS_Store",
];

/// Name suffixes never archived or read
pub const EXCLUDED_SUFFIXES: &[&str] = &[".pyc", "VENV"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    venv_name: Option<String>,
}

impl ExclusionSet {
    pub fn new(venv_name: Option<&str>) -> Self {
        Self {
            venv_name: venv_name
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from),
        }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        is_builtin(name) || self.venv_name.as_deref() == Some(name)
    }

    /// The same rules as `--exclude=` arguments for tar
    pub fn tar_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = EXCLUDED_NAMES
            .iter()
            .map(|n| format!("--exclude={}", n))
            .collect();
        patterns.extend(EXCLUDED_SUFFIXES.iter().map(|s| format!("--exclude=*{}", s)));
        if let Some(venv) = &self.venv_name {
            if !is_builtin(venv) {
                patterns.push(format!("--exclude={}", venv));
            }
        }
        patterns
    }
}

fn is_builtin(name: &str) -> bool {
    EXCLUDED_NAMES.contains(&name) || EXCLUDED_SUFFIXES.iter().any(|s| name.ends_with(s))
}
