use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::info;

use devsetup_core::catalog::{Framework, RepositoryDescriptor};
use devsetup_core::config::AppConfig;
use devsetup_core::generator::{generate_bundle, generate_setup_script, DatabaseBackend, SetupOptions};
use devsetup_core::lifecycle::{
    archive_workspace, delete_items, ensure_executable, read_directory_recursive, require_absolute,
    save_file, DeleteMode,
};
use devsetup_core::server::{run_server, AppContext};

#[derive(Parser, Debug)]
#[command(name = "devsetup", version, about = "Scaffold local Python web-project environments")]
struct Cli {
    /// Config file (default ~/.devsetup/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the WebSocket control-plane server
    Serve {
        #[arg(long)]
        port: Option<u16>,
        /// Exit when the launching process goes away
        #[arg(long)]
        exit_with_parent: bool,
    },
    /// List catalog repositories
    Catalog {
        #[arg(long)]
        json: bool,
    },
    /// Generate the setup script for a repository
    Generate(GenerateArgs),
    /// Save stdin (or --from) to DIRECTORY/FILENAME
    Save {
        directory: String,
        filename: String,
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Delete top-level entries of a workspace by mode
    Delete {
        directory: String,
        /// repo, env or workspace
        #[arg(long)]
        mode: String,
        #[arg(long = "venv", default_value = "venv")]
        venv_name: String,
    },
    /// Archive a workspace into a .tar.gz
    Archive {
        source: String,
        dest: String,
        #[arg(long = "venv")]
        venv_name: Option<String>,
    },
    /// List files a recursive read would return
    Tree {
        directory: String,
        #[arg(long = "venv")]
        venv_name: Option<String>,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Clone URL, looked up in the catalog first
    repo_url: String,
    /// Framework for a repository outside the catalog
    #[arg(long)]
    framework: Option<String>,
    /// Write every companion file here instead of printing setup.sh
    #[arg(long)]
    out: Option<String>,
    /// Deletion mode rendered into reset_env.sh
    #[arg(long, default_value = "env")]
    reset_mode: String,
    #[command(flatten)]
    options: OptionArgs,
}

#[derive(Args, Debug)]
struct OptionArgs {
    #[arg(long)]
    project_path: Option<String>,
    #[arg(long)]
    venv: Option<String>,
    #[arg(long)]
    database: Option<DatabaseBackend>,
    #[arg(long)]
    db_name: Option<String>,
    #[arg(long)]
    admin_user: Option<String>,
    #[arg(long)]
    admin_email: Option<String>,
    #[arg(long)]
    admin_password: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    requirements: Option<String>,
    #[arg(long)]
    pre_install: Option<String>,
    #[arg(long)]
    post_install: Option<String>,
    #[arg(long)]
    install: Option<String>,
    #[arg(long)]
    load_demo: bool,
    #[arg(long)]
    no_superuser: bool,
    #[arg(long)]
    no_run_server: bool,
    #[arg(long)]
    skip_db_init: bool,
}

impl OptionArgs {
    fn apply(self, opts: &mut SetupOptions) {
        let OptionArgs {
            project_path,
            venv,
            database,
            db_name,
            admin_user,
            admin_email,
            admin_password,
            port,
            requirements,
            pre_install,
            post_install,
            install,
            load_demo,
            no_superuser,
            no_run_server,
            skip_db_init,
        } = self;

        if let Some(v) = project_path {
            opts.project_path = v;
        }
        if let Some(v) = venv {
            opts.venv_name = v;
        }
        if let Some(v) = database {
            opts.database = v;
        }
        if db_name.is_some() {
            opts.db_name = db_name;
        }
        if let Some(v) = admin_user {
            opts.admin.username = v;
        }
        if let Some(v) = admin_email {
            opts.admin.email = v;
        }
        if let Some(v) = admin_password {
            opts.admin.password = v;
        }
        if let Some(v) = port {
            opts.server_port = v;
        }
        opts.requirements_path = requirements.unwrap_or_default();
        opts.pre_install_override = pre_install.unwrap_or_default();
        opts.post_install_override = post_install.unwrap_or_default();
        opts.custom_install_override = install.unwrap_or_default();
        opts.load_demo = load_demo;
        opts.create_superuser = !no_superuser;
        opts.run_server_at_end = !no_run_server;
        opts.init_db = !skip_db_init;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    devsetup_core::util::init_logging();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Command::Serve {
            port,
            exit_with_parent,
        } => {
            let port = port.unwrap_or_else(|| config.effective_port());
            let catalog = config.load_catalog().context("Failed to load catalog")?;
            info!("Starting devsetup server on port {}", port);

            #[cfg(unix)]
            {
                if exit_with_parent {
                    devsetup_core::server::ws::spawn_parent_monitor();
                }
            }
            #[cfg(not(unix))]
            let _ = exit_with_parent;

            let ctx = AppContext::new(catalog, config);
            run_server(port, ctx, async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Interrupt received, shutting down");
            })
            .await
            .context("Server failed")?;
        }

        Command::Catalog { json } => {
            let catalog = config.load_catalog().context("Failed to load catalog")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else {
                for category in &catalog.categories {
                    println!("{}", category.name);
                    for repo in &category.repos {
                        println!("  {:<32} {:<8} {}", repo.display_label(), repo.framework, repo.url);
                    }
                }
            }
        }

        Command::Generate(args) => generate(&config, args)?,

        Command::Save {
            directory,
            filename,
            from,
        } => {
            let content = match from {
                Some(path) => std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buf = Vec::new();
                    io::stdin().read_to_end(&mut buf)?;
                    buf
                }
            };
            let saved = save_file(&directory, &filename, &content, config.save_options())?;
            println!("{}", saved.path.display());
        }

        Command::Delete {
            directory,
            mode,
            venv_name,
        } => {
            let mode = DeleteMode::from(mode.as_str());
            if let DeleteMode::Unrecognized(other) = &mode {
                bail!("Unknown delete mode '{}' (expected repo, env or workspace)", other);
            }
            let dir = require_absolute(&directory, "Directory")?;
            let report = delete_items(&dir, &mode, &venv_name)?;
            println!("Removed {} entries ({} kept)", report.removed, report.skipped);
        }

        Command::Archive {
            source,
            dest,
            venv_name,
        } => {
            let source = require_absolute(&source, "Source directory")?;
            let dest = require_absolute(&dest, "Destination path")?;
            let path = archive_workspace(&source, &dest, venv_name.as_deref()).await?;
            println!("{}", path.display());
        }

        Command::Tree {
            directory,
            venv_name,
        } => {
            let dir = require_absolute(&directory, "Directory")?;
            for file in read_directory_recursive(&dir, venv_name.as_deref())? {
                println!("{:>10}  {}", file.content.len(), file.relative_path);
            }
        }
    }

    Ok(())
}

fn generate(config: &AppConfig, args: GenerateArgs) -> Result<()> {
    let catalog = config.load_catalog().context("Failed to load catalog")?;
    let repo = match catalog.find(&args.repo_url) {
        Some(found) => found.clone(),
        None => {
            let framework = args
                .framework
                .as_deref()
                .map(Framework::from_tag)
                .unwrap_or_default();
            RepositoryDescriptor::custom(&args.repo_url, framework)
        }
    };

    let mut opts = SetupOptions::for_repository(&repo);
    config.apply_defaults(&mut opts);
    args.options.apply(&mut opts);

    let Some(out) = args.out else {
        print!("{}", generate_setup_script(&repo, &opts)?);
        return Ok(());
    };

    let bundle = generate_bundle(&repo, &opts, &DeleteMode::from(args.reset_mode.as_str()))?;
    for (name, content) in bundle.files() {
        let saved = save_file(&out, name, content.as_bytes(), config.save_options())?;
        if name.ends_with(".sh") {
            ensure_executable(&saved.path)?;
        }
        println!("{}", saved.path.display());
    }
    Ok(())
}
