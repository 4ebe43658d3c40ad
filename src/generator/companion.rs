//! Companion scripts generated alongside the setup script

use serde::Serialize;

use crate::catalog::RepositoryDescriptor;
use crate::generator::framework::Stage;
use crate::generator::options::{DatabaseBackend, SetupOptions};
use crate::generator::setup::{
    generate_setup_script, resolve_stage, validate_url, write_activate, write_database_env,
    write_header, write_locations,
};
use crate::generator::shell::{quote, ScriptWriter};
use crate::generator::GeneratorError;
use crate::lifecycle::delete::ENV_ARTIFACTS;
use crate::lifecycle::DeleteMode;

pub const SETUP_FILE: &str = "setup.sh";
pub const DEV_SERVER_FILE: &str = "dev-server.sh";
pub const FRESH_DB_FILE: &str = "fresh-db.sh";
pub const RESET_ENV_FILE: &str = "reset_env.sh";
pub const ENV_FILE: &str = ".env";

/// Every generated artifact for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptBundle {
    pub setup: String,
    pub dev_server: String,
    pub fresh_db: String,
    pub reset_env: String,
    pub env_file: String,
}

impl ScriptBundle {
    /// `(filename, content)` pairs in save order
    pub fn files(&self) -> Vec<(&'static str, &str)> {
        vec![
            (SETUP_FILE, self.setup.as_str()),
            (DEV_SERVER_FILE, self.dev_server.as_str()),
            (FRESH_DB_FILE, self.fresh_db.as_str()),
            (RESET_ENV_FILE, self.reset_env.as_str()),
            (ENV_FILE, self.env_file.as_str()),
        ]
    }
}

pub fn generate_bundle(
    repo: &RepositoryDescriptor,
    opts: &SetupOptions,
    reset_mode: &DeleteMode,
) -> Result<ScriptBundle, GeneratorError> {
    Ok(ScriptBundle {
        setup: generate_setup_script(repo, opts)?,
        dev_server: dev_server_script(repo, opts)?,
        fresh_db: fresh_db_script(repo, opts)?,
        reset_env: reset_env_script(repo, opts, reset_mode)?,
        env_file: env_file(opts),
    })
}

fn enter_project(w: &mut ScriptWriter, opts: &SetupOptions) {
    write_locations(w, opts);
    w.blank();
    w.line("cd \"$PROJECT_DIR\"");
}

fn check_inputs(repo: &RepositoryDescriptor, opts: &SetupOptions) -> Result<(), GeneratorError> {
    validate_url(&repo.url)?;
    opts.validate()
}

/// Start the development server of an already set up project
pub fn dev_server_script(repo: &RepositoryDescriptor, opts: &SetupOptions) -> Result<String, GeneratorError> {
    check_inputs(repo, opts)?;

    let mut w = ScriptWriter::new();
    write_header(&mut w, "Development server", repo);
    enter_project(&mut w, opts);
    write_activate(&mut w);
    write_database_env(&mut w, opts);

    w.section(Stage::RunServer.title());
    match resolve_stage(repo, opts, Stage::RunServer) {
        Some(resolved) => {
            w.command(&resolved.command);
        }
        None => {
            w.echo(&format!(
                "No development server command is known for {} projects",
                repo.framework
            ));
        }
    }
    Ok(w.finish())
}

/// Drop and recreate the database, then re-run initialization
pub fn fresh_db_script(repo: &RepositoryDescriptor, opts: &SetupOptions) -> Result<String, GeneratorError> {
    check_inputs(repo, opts)?;
    let db_name = opts.effective_db_name();

    let mut w = ScriptWriter::new();
    write_header(&mut w, "Fresh database", repo);
    enter_project(&mut w, opts);
    write_activate(&mut w);
    write_database_env(&mut w, opts);

    w.section("Recreate database");
    match opts.database {
        DatabaseBackend::Sqlite => {
            w.echo("Removing SQLite database files...");
            w.line(&format!("rm -f {} db.sqlite3", quote(&format!("{}.sqlite3", db_name))));
        }
        DatabaseBackend::Postgresql => {
            w.export("PGPASSWORD", &opts.db_password);
            let args = format!("-h localhost -U {}", quote(&opts.db_user));
            w.line(&format!("dropdb --if-exists {} {}", args, quote(&db_name)));
            w.line(&format!("createdb {} {}", args, quote(&db_name)));
        }
        DatabaseBackend::Mysql => {
            w.export("MYSQL_PWD", &opts.db_password);
            let ident = db_name.replace('`', "");
            let sql = format!(
                "DROP DATABASE IF EXISTS `{0}`; CREATE DATABASE `{0}` CHARACTER SET utf8mb4;",
                ident
            );
            w.line(&format!("mysql -h localhost -u {} -e {}", quote(&opts.db_user), quote(&sql)));
        }
    }

    let forced = SetupOptions {
        init_db: true,
        ..opts.clone()
    };
    if let Some(resolved) = resolve_stage(repo, &forced, Stage::PostInstall) {
        w.section(Stage::PostInstall.title());
        w.command(&resolved.command);
    }
    if opts.create_superuser {
        if let Some(resolved) = resolve_stage(repo, &forced, Stage::AdminCreate) {
            w.section(Stage::AdminCreate.title());
            w.command(&resolved.command);
        }
    }
    w.blank();
    w.echo("Database reset complete");
    Ok(w.finish())
}

/// Shell rendition of a deletion mode over the project directory
pub fn reset_env_script(
    repo: &RepositoryDescriptor,
    opts: &SetupOptions,
    mode: &DeleteMode,
) -> Result<String, GeneratorError> {
    check_inputs(repo, opts)?;

    let mut w = ScriptWriter::new();
    write_header(&mut w, &format!("Reset ({})", mode), repo);
    enter_project(&mut w, opts);

    match mode {
        DeleteMode::Repo => {
            w.section("Remove repository files");
            w.echo("Removing repository files, keeping the virtual environment...");
            w.line("find . -mindepth 1 -maxdepth 1 ! -name \"$VENV_NAME\" -exec rm -rf {} +");
        }
        DeleteMode::Env => {
            w.section("Remove environment");
            w.echo("Removing virtual environment...");
            w.line("rm -rf \"$VENV_NAME\"");
            w.echo("Removing build artifacts...");
            w.line(&format!("rm -rf {}", ENV_ARTIFACTS.join(" ")));
            w.line("find . -mindepth 1 -maxdepth 1 -name '*.pyc' -exec rm -f {} +");
        }
        DeleteMode::Workspace => {
            w.section("Remove workspace");
            w.echo("Removing virtual environment...");
            w.line("rm -rf \"$VENV_NAME\"");
            w.echo("Removing all workspace contents...");
            w.line("find . -mindepth 1 -maxdepth 1 -exec rm -rf {} +");
        }
        DeleteMode::Unrecognized(other) => {
            return Err(GeneratorError::UnknownResetMode(other.clone()));
        }
    }
    w.blank();
    w.echo("Reset complete");
    Ok(w.finish())
}

/// `.env` file with the database connection settings
pub fn env_file(opts: &SetupOptions) -> String {
    let vars = opts.database.env_vars(opts);
    let lookup = |name: &str| {
        vars.iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };

    let mut out = String::from("# Generated by devsetup\n");
    for name in ["DATABASE_URL", "DB_ENGINE", "DB_NAME", "DB_USER", "DB_PASSWORD", "DB_HOST", "DB_PORT"] {
        out.push_str(&format!("{}={}\n", name, lookup(name)));
    }
    out.push_str("DEBUG=True\n");
    out.push_str("ALLOWED_HOSTS=localhost,127.0.0.1\n");
    out
}
