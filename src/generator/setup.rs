//! Setup script assembly
//!
//! Resolves one command per pipeline stage and lays the stages out in a
//! fixed order behind an idempotent clone/venv preamble.

use crate::catalog::RepositoryDescriptor;
use crate::generator::framework::{default_command, initializes_database, Stage};
use crate::generator::options::SetupOptions;
use crate::generator::shell::{quote, quote_path, ScriptWriter};
use crate::generator::template::substitute_admin;
use crate::generator::GeneratorError;

pub const SHEBANG: &str = "#!/usr/bin/env bash";
pub const ERR_TRAP: &str = r#"trap 'echo "Error encountered at line $LINENO"; exit 1' ERR"#;
pub const SKIP_DB_INIT: &str = r#"echo "Skipping database initialization as requested""#;

/// Where a stage's command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Override,
    Descriptor,
    RequirementsPath,
    Dependencies,
    Framework,
    /// Framework database init replaced by a notice (`init_db = false`)
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub source: CommandSource,
    pub command: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn override_for<'a>(opts: &'a SetupOptions, stage: Stage) -> Option<&'a str> {
    let value = match stage {
        Stage::PreInstall => &opts.pre_install_override,
        Stage::Install => &opts.custom_install_override,
        Stage::PostInstall => &opts.post_install_override,
        Stage::DemoData => &opts.demo_data_override,
        Stage::AdminCreate => &opts.admin_create_override,
        Stage::RunServer => return None,
    };
    non_empty(Some(value.as_str()))
}

fn descriptor_for(repo: &RepositoryDescriptor, stage: Stage) -> Option<&str> {
    let cmds = repo.setup_commands.as_ref()?;
    let value = match stage {
        Stage::PreInstall => cmds.pre_install.as_deref(),
        Stage::Install => None,
        Stage::PostInstall => cmds.post_install.as_deref(),
        Stage::DemoData => cmds.demo_data.as_deref(),
        Stage::AdminCreate => cmds.admin_create.as_deref(),
        Stage::RunServer => cmds.run_server.as_deref(),
    };
    non_empty(value)
}

/// Install-stage resolution below the explicit overrides. `Some(None)`
/// means a dependency block exists but yields nothing, which suppresses
/// the framework fallback.
fn install_from_dependencies(repo: &RepositoryDescriptor, opts: &SetupOptions) -> Option<Option<Resolved>> {
    if let Some(path) = non_empty(Some(opts.requirements_path.as_str())) {
        return Some(Some(Resolved {
            source: CommandSource::RequirementsPath,
            command: format!(
                "CUSTOM_REQ_PATH={}\npip install -r \"$CUSTOM_REQ_PATH\"",
                quote_path(path)
            ),
        }));
    }

    let deps = repo.dependencies.as_ref()?;
    if let Some(command) = non_empty(deps.command.as_deref()) {
        return Some(Some(Resolved {
            source: CommandSource::Dependencies,
            command: command.to_string(),
        }));
    }

    let lines: Vec<String> = deps
        .files
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(|f| format!("pip install -r {}", quote_path(f)))
        .collect();
    if lines.is_empty() {
        Some(None)
    } else {
        Some(Some(Resolved {
            source: CommandSource::Dependencies,
            command: lines.join("\n"),
        }))
    }
}

/// Resolve the command for one stage. Precedence: caller override,
/// descriptor `setup_commands`, dependency declarations (install only),
/// framework default. Admin commands come back with placeholders filled.
pub fn resolve_stage(
    repo: &RepositoryDescriptor,
    opts: &SetupOptions,
    stage: Stage,
) -> Option<Resolved> {
    let resolved = resolve_raw(repo, opts, stage)?;
    if stage == Stage::AdminCreate {
        return Some(Resolved {
            command: substitute_admin(&resolved.command, &opts.admin),
            ..resolved
        });
    }
    Some(resolved)
}

fn resolve_raw(repo: &RepositoryDescriptor, opts: &SetupOptions, stage: Stage) -> Option<Resolved> {
    if let Some(cmd) = override_for(opts, stage) {
        return Some(Resolved {
            source: CommandSource::Override,
            command: cmd.to_string(),
        });
    }
    if let Some(cmd) = descriptor_for(repo, stage) {
        return Some(Resolved {
            source: CommandSource::Descriptor,
            command: cmd.to_string(),
        });
    }
    if stage == Stage::Install {
        if let Some(from_deps) = install_from_dependencies(repo, opts) {
            return from_deps;
        }
    }

    let command = default_command(repo.framework, stage, opts)?;
    if !opts.init_db && initializes_database(repo.framework, stage) {
        return Some(Resolved {
            source: CommandSource::Skipped,
            command: SKIP_DB_INIT.to_string(),
        });
    }
    Some(Resolved {
        source: CommandSource::Framework,
        command,
    })
}

/// Whether the options enable a conditional stage
fn stage_enabled(opts: &SetupOptions, stage: Stage) -> bool {
    match stage {
        Stage::DemoData => opts.load_demo,
        Stage::AdminCreate => opts.create_superuser,
        Stage::RunServer => opts.run_server_at_end,
        _ => true,
    }
}

pub(crate) fn validate_url(url: &str) -> Result<(), GeneratorError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(GeneratorError::MissingUrl);
    }
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(GeneratorError::InvalidUrl(url.to_string()));
    }
    if let Ok(parsed) = url::Url::parse(url) {
        if matches!(parsed.scheme(), "http" | "https" | "ssh" | "git" | "file") {
            return Ok(());
        }
        // `git@host:path` parses with scheme `git@host`, fall through
    }
    // scp-like syntax: user@host:path
    if let Some((user_host, path)) = url.split_once(':') {
        if let Some((user, host)) = user_host.split_once('@') {
            if !user.is_empty() && !host.is_empty() && !path.is_empty() && !path.starts_with('/') {
                return Ok(());
            }
        }
    }
    Err(GeneratorError::InvalidUrl(url.to_string()))
}

/// Common preamble shared by every generated script
pub(crate) fn write_header(w: &mut ScriptWriter, title: &str, repo: &RepositoryDescriptor) {
    w.line(SHEBANG);
    w.line(&format!("# {} for {} ({})", title, repo.name, repo.framework));
    w.line("# Generated by devsetup");
    w.line("set -e");
    w.line(ERR_TRAP);
}

pub(crate) fn write_locations(w: &mut ScriptWriter, opts: &SetupOptions) {
    w.blank();
    w.line(&format!("PROJECT_DIR={}", quote_path(&opts.project_path)));
    w.line(&format!("VENV_NAME={}", quote(&opts.venv_name)));
}

pub(crate) fn write_database_env(w: &mut ScriptWriter, opts: &SetupOptions) {
    w.section(&format!("Database configuration ({})", opts.database));
    for (name, value) in opts.database.env_vars(opts) {
        w.export(name, &value);
    }
}

pub(crate) fn write_activate(w: &mut ScriptWriter) {
    w.line("source \"$VENV_NAME/bin/activate\"");
}

/// Generate the setup script. Pure: identical inputs give identical bytes.
pub fn generate_setup_script(
    repo: &RepositoryDescriptor,
    opts: &SetupOptions,
) -> Result<String, GeneratorError> {
    validate_url(&repo.url)?;
    opts.validate()?;

    let mut w = ScriptWriter::new();
    write_header(&mut w, "Setup script", repo);
    w.blank();
    w.line(&format!("REPO_URL={}", quote(repo.url.trim())));
    write_locations(&mut w, opts);

    w.section("Clone repository");
    w.command(
        r#"if [ -d "$PROJECT_DIR/.git" ]; then
    echo "Repository already present, skipping clone"
elif [ -d "$PROJECT_DIR" ] && [ -n "$(ls -A "$PROJECT_DIR")" ]; then
    echo "Directory is not empty, cloning through a temporary directory"
    rm -rf "$PROJECT_DIR/.clone-tmp"
    git clone "$REPO_URL" "$PROJECT_DIR/.clone-tmp"
    cp -a "$PROJECT_DIR/.clone-tmp/." "$PROJECT_DIR/"
    rm -rf "$PROJECT_DIR/.clone-tmp"
else
    mkdir -p "$(dirname "$PROJECT_DIR")"
    git clone "$REPO_URL" "$PROJECT_DIR"
fi
cd "$PROJECT_DIR""#,
    );

    w.section("Virtual environment");
    w.command(
        r#"if [ ! -d "$VENV_NAME" ]; then
    python3 -m venv "$VENV_NAME"
else
    echo "Virtual environment $VENV_NAME already exists"
fi"#,
    );
    write_activate(&mut w);
    w.line("pip install --upgrade pip");

    for stage in Stage::ALL {
        if stage == Stage::PostInstall {
            write_database_env(&mut w, opts);
        }
        if stage == Stage::RunServer {
            w.blank();
            w.echo(&format!("Setup complete for {}", repo.name));
        }
        if !stage_enabled(opts, stage) {
            continue;
        }
        if let Some(resolved) = resolve_stage(repo, opts, stage) {
            w.section(stage.title());
            w.command(&resolved.command);
        }
    }

    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Dependencies, Framework, SetupCommands};

    fn opts() -> SetupOptions {
        SetupOptions {
            project_path: "~/dev/demo".to_string(),
            ..SetupOptions::default()
        }
    }

    fn repo(framework: Framework) -> RepositoryDescriptor {
        RepositoryDescriptor::custom("https://github.com/acme/demo.git", framework)
    }

    #[test]
    fn test_override_beats_descriptor_beats_framework() {
        let mut r = repo(Framework::Django);
        assert_eq!(
            resolve_stage(&r, &opts(), Stage::PostInstall).unwrap().source,
            CommandSource::Framework
        );

        r.setup_commands = Some(SetupCommands {
            post_install: Some("make migrate".to_string()),
            ..SetupCommands::default()
        });
        let resolved = resolve_stage(&r, &opts(), Stage::PostInstall).unwrap();
        assert_eq!(resolved.source, CommandSource::Descriptor);
        assert_eq!(resolved.command, "make migrate");

        let mut o = opts();
        o.post_install_override = "  ./custom.sh ".to_string();
        let resolved = resolve_stage(&r, &o, Stage::PostInstall).unwrap();
        assert_eq!(resolved.source, CommandSource::Override);
        assert_eq!(resolved.command, "./custom.sh");

        o.post_install_override = "   ".to_string();
        assert_eq!(
            resolve_stage(&r, &o, Stage::PostInstall).unwrap().source,
            CommandSource::Descriptor
        );
    }

    #[test]
    fn test_install_precedence() {
        let mut r = repo(Framework::Generic);
        r.dependencies = Some(Dependencies {
            command: Some("pip install .".to_string()),
            files: vec!["requirements.txt".to_string()],
        });
        assert_eq!(resolve_stage(&r, &opts(), Stage::Install).unwrap().command, "pip install .");

        let mut o = opts();
        o.requirements_path = "requirements/production.txt".to_string();
        let resolved = resolve_stage(&r, &o, Stage::Install).unwrap();
        assert_eq!(resolved.source, CommandSource::RequirementsPath);
        assert!(resolved.command.contains(r#"CUSTOM_REQ_PATH="requirements/production.txt""#));

        o.custom_install_override = "poetry install".to_string();
        assert_eq!(resolve_stage(&r, &o, Stage::Install).unwrap().command, "poetry install");
    }

    #[test]
    fn test_dependency_files_one_line_each() {
        let mut r = repo(Framework::Django);
        r.dependencies = Some(Dependencies {
            command: None,
            files: vec!["requirements/pip.txt".to_string(), "requirements/edx/base.txt".to_string()],
        });
        let resolved = resolve_stage(&r, &opts(), Stage::Install).unwrap();
        assert_eq!(
            resolved.command,
            "pip install -r \"requirements/pip.txt\"\npip install -r \"requirements/edx/base.txt\""
        );
    }

    #[test]
    fn test_empty_dependency_files_emit_nothing() {
        let mut r = repo(Framework::Django);
        r.dependencies = Some(Dependencies::default());
        assert!(resolve_stage(&r, &opts(), Stage::Install).is_none());
    }

    #[test]
    fn test_init_db_false_skips_only_framework_default() {
        let mut o = opts();
        o.init_db = false;
        let mut r = repo(Framework::Django);
        let resolved = resolve_stage(&r, &o, Stage::PostInstall).unwrap();
        assert_eq!(resolved.source, CommandSource::Skipped);
        assert_eq!(resolved.command, SKIP_DB_INIT);

        r.setup_commands = Some(SetupCommands {
            post_install: Some("python3 manage.py migrate --run-syncdb".to_string()),
            ..SetupCommands::default()
        });
        assert_eq!(
            resolve_stage(&r, &o, Stage::PostInstall).unwrap().source,
            CommandSource::Descriptor
        );
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://github.com/saleor/saleor.git").is_ok());
        assert!(validate_url("git@github.com:frappe/frappe.git").is_ok());
        assert!(matches!(validate_url("  "), Err(GeneratorError::MissingUrl)));
        assert!(matches!(validate_url("not a url"), Err(GeneratorError::InvalidUrl(_))));
        assert!(matches!(validate_url("saleor"), Err(GeneratorError::InvalidUrl(_))));
    }

    #[test]
    fn test_script_starts_with_header() {
        let script = generate_setup_script(&repo(Framework::Flask), &opts()).unwrap();
        let mut lines = script.lines();
        assert_eq!(lines.next(), Some(SHEBANG));
        assert!(script.contains("set -e\n"));
        assert!(script.contains(ERR_TRAP));
        assert!(script.ends_with('\n'));
        assert!(!script.contains("\n\n\n"));
    }
}
