//! Framework default command templates

use crate::catalog::Framework;
use crate::generator::options::SetupOptions;
use crate::generator::shell::quote;

/// Site name used by the frappe templates
pub const FRAPPE_SITE: &str = "mysite.local";

/// Pipeline stages in assembly order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    PreInstall,
    Install,
    PostInstall,
    DemoData,
    AdminCreate,
    RunServer,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::PreInstall,
        Stage::Install,
        Stage::PostInstall,
        Stage::DemoData,
        Stage::AdminCreate,
        Stage::RunServer,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Stage::PreInstall => "Pre-install",
            Stage::Install => "Install dependencies",
            Stage::PostInstall => "Post-install",
            Stage::DemoData => "Demo data",
            Stage::AdminCreate => "Create admin user",
            Stage::RunServer => "Run development server",
        }
    }
}

const MANIFEST_INSTALL: &str = r#"if [ -f requirements.txt ]; then
    pip install -r requirements.txt
elif [ -f pyproject.toml ] || [ -f setup.py ]; then
    echo "Detected buildable project (pyproject.toml/setup.py)"
    pip install -e .
else
    echo "No requirements.txt, pyproject.toml or setup.py found, skipping dependency install"
fi"#;

const DJANGO_ADMIN: &str = "export DJANGO_SUPERUSER_PASSWORD=__PASS__ && python3 manage.py createsuperuser --noinput --username __USER__ --email __EMAIL__ || echo \"Superuser may already exist\"";

/// Default command for a stage, or `None` when the framework has nothing
/// to do there. Admin templates still carry placeholders.
pub fn default_command(framework: Framework, stage: Stage, opts: &SetupOptions) -> Option<String> {
    let port = opts.server_port;
    let cmd = match (framework, stage) {
        (_, Stage::PreInstall) => return None,

        (Framework::Frappe, Stage::Install) => "pip install frappe-bench".to_string(),
        (_, Stage::Install) => MANIFEST_INSTALL.to_string(),

        (Framework::Django, Stage::PostInstall) => "python3 manage.py migrate".to_string(),
        (Framework::Flask, Stage::PostInstall) => {
            "if [ -d migrations ]; then flask db upgrade; fi".to_string()
        }
        (Framework::Fastapi, Stage::PostInstall) => {
            "if [ -f alembic.ini ]; then alembic upgrade head; fi".to_string()
        }
        (Framework::Frappe, Stage::PostInstall) => format!(
            "bench new-site {} --admin-password {} || echo \"Site {} may already exist\"",
            FRAPPE_SITE,
            quote(&opts.admin.password),
            FRAPPE_SITE
        ),

        (Framework::Django, Stage::DemoData) => "python3 manage.py loaddata initial_data".to_string(),

        (Framework::Django, Stage::AdminCreate) => DJANGO_ADMIN.to_string(),
        (Framework::Frappe, Stage::AdminCreate) => {
            format!("bench --site {} set-admin-password __PASS__", FRAPPE_SITE)
        }

        (Framework::Django, Stage::RunServer) => {
            format!("python3 manage.py runserver 0.0.0.0:{}", port)
        }
        (Framework::Flask, Stage::RunServer) => {
            format!("flask run --host 0.0.0.0 --port {}", port)
        }
        (Framework::Fastapi, Stage::RunServer) => {
            format!("uvicorn main:app --host 0.0.0.0 --port {} --reload", port)
        }
        (Framework::Frappe, Stage::RunServer) => "bench start".to_string(),

        _ => return None,
    };
    Some(cmd)
}

/// Whether the framework default for this stage initializes a database
pub fn initializes_database(framework: Framework, stage: Stage) -> bool {
    stage == Stage::PostInstall && framework != Framework::Generic
}
