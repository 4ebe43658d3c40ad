//! Script generation properties over the built-in catalog

use devsetup_core::catalog::{Catalog, Dependencies, Framework, RepositoryDescriptor, SetupCommands};
use devsetup_core::generator::template::leftover_placeholders;
use devsetup_core::generator::{
    generate_bundle, generate_setup_script, AdminAccount, DatabaseBackend, GeneratorError,
    SetupOptions,
};
use devsetup_core::lifecycle::DeleteMode;

fn all_on(repo: &RepositoryDescriptor) -> SetupOptions {
    SetupOptions {
        load_demo: true,
        create_superuser: true,
        run_server_at_end: true,
        ..SetupOptions::for_repository(repo)
    }
}

fn position(script: &str, needle: &str) -> usize {
    script
        .find(needle)
        .unwrap_or_else(|| panic!("missing {:?} in script:\n{}", needle, script))
}

#[test]
fn every_catalog_entry_generates_without_leftover_placeholders() {
    let catalog = Catalog::builtin().unwrap();
    // 74 unique repositories from the curated list plus the Frappe/tooling additions
    assert!(catalog.len() >= 81, "catalog has {} entries", catalog.len());
    assert!(catalog.find("https://github.com/taigaio/taiga-back.git").is_some());
    assert!(catalog.find("https://github.com/falconry/falcon.git").is_some());

    for repo in catalog.iter() {
        let opts = all_on(repo);
        let bundle = generate_bundle(repo, &opts, &DeleteMode::Env)
            .unwrap_or_else(|e| panic!("{} failed: {}", repo.name, e));
        for (name, content) in bundle.files() {
            assert!(
                leftover_placeholders(content).is_empty(),
                "{} / {} kept placeholders",
                repo.name,
                name
            );
        }
        assert!(!bundle.setup.contains("\n\n\n"), "{} has blank runs", repo.name);
        assert!(!bundle.setup.contains("&& \n"), "{} has dangling &&", repo.name);
        assert!(!bundle.setup.contains("pip install -r \"\""), "{} has empty -r", repo.name);
    }
}

#[test]
fn generation_is_deterministic() {
    let catalog = Catalog::builtin().unwrap();
    for repo in catalog.iter().take(10) {
        let opts = all_on(repo);
        let a = generate_setup_script(repo, &opts).unwrap();
        let b = generate_setup_script(&repo.clone(), &opts.clone()).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn stages_follow_fixed_order() {
    let repo = RepositoryDescriptor::custom("https://github.com/acme/shop.git", Framework::Django);
    let opts = SetupOptions {
        pre_install_override: "echo pre".to_string(),
        ..all_on(&repo)
    };
    let script = generate_setup_script(&repo, &opts).unwrap();

    let markers = [
        "#!/usr/bin/env bash",
        "set -e",
        "Error encountered at line $LINENO",
        "git clone \"$REPO_URL\"",
        "cd \"$PROJECT_DIR\"",
        "python3 -m venv \"$VENV_NAME\"",
        "source \"$VENV_NAME/bin/activate\"",
        "echo pre",
        "# --- Install dependencies ---",
        "export DATABASE_URL=",
        "python3 manage.py migrate",
        "python3 manage.py loaddata initial_data",
        "createsuperuser --noinput",
        "python3 manage.py runserver 0.0.0.0:8000",
    ];
    let positions: Vec<usize> = markers.iter().map(|m| position(&script, m)).collect();
    for pair in positions.windows(2) {
        assert!(pair[0] < pair[1], "stages out of order:\n{}", script);
    }
}

#[test]
fn clone_and_venv_are_idempotent() {
    let repo = RepositoryDescriptor::custom("https://github.com/acme/shop.git", Framework::Flask);
    let script = generate_setup_script(&repo, &SetupOptions::for_repository(&repo)).unwrap();
    assert!(script.contains("if [ -d \"$PROJECT_DIR/.git\" ]; then"));
    assert!(script.contains("if [ ! -d \"$VENV_NAME\" ]; then"));
    assert!(script.contains("PROJECT_DIR=\"$HOME/dev/shop\""));
    assert!(script.contains("VENV_NAME=SHOP_VENV"));
}

#[test]
fn disabled_stages_are_omitted() {
    let repo = RepositoryDescriptor::custom("https://github.com/acme/shop.git", Framework::Django);
    let opts = SetupOptions {
        load_demo: false,
        create_superuser: false,
        run_server_at_end: false,
        ..SetupOptions::for_repository(&repo)
    };
    let script = generate_setup_script(&repo, &opts).unwrap();
    assert!(!script.contains("loaddata"));
    assert!(!script.contains("createsuperuser"));
    assert!(!script.contains("runserver"));
    assert!(!script.contains("# --- Demo data ---"));
}

#[test]
fn admin_template_is_fully_substituted() {
    let catalog = Catalog::builtin().unwrap();
    let repo = catalog
        .find("https://github.com/horilla-opensource/horilla.git")
        .unwrap();
    let opts = SetupOptions {
        admin: AdminAccount {
            username: "boss".to_string(),
            email: "boss@corp.test".to_string(),
            password: "hunter2".to_string(),
        },
        ..all_on(repo)
    };
    let script = generate_setup_script(repo, &opts).unwrap();
    assert!(script.contains("--username boss --password hunter2 --email boss@corp.test"));
    assert!(script.contains("python3 manage.py loaddata demo_data.json"));
    assert!(leftover_placeholders(&script).is_empty());
}

#[test]
fn placeholder_in_admin_value_is_rejected() {
    let repo = RepositoryDescriptor::custom("https://github.com/acme/shop.git", Framework::Django);
    let mut opts = SetupOptions::for_repository(&repo);
    opts.admin.username = "__EMAIL__".to_string();
    let err = generate_setup_script(&repo, &opts).unwrap_err();
    assert_eq!(err.code(), "placeholder_in_value");
}

#[test]
fn custom_requirements_path_is_used() {
    let repo = RepositoryDescriptor::custom("https://github.com/acme/api.git", Framework::Fastapi);
    let opts = SetupOptions {
        requirements_path: "requirements/production.txt".to_string(),
        ..SetupOptions::for_repository(&repo)
    };
    let script = generate_setup_script(&repo, &opts).unwrap();
    assert!(script.contains(r#"CUSTOM_REQ_PATH="requirements/production.txt""#));
    assert!(script.contains(r#"pip install -r "$CUSTOM_REQ_PATH""#));
    assert!(!script.contains("Detected buildable project"));
}

#[test]
fn manifest_detection_without_declared_dependencies() {
    let repo = RepositoryDescriptor::custom("https://github.com/acme/lib.git", Framework::Generic);
    let script = generate_setup_script(&repo, &SetupOptions::for_repository(&repo)).unwrap();
    assert!(script.contains("Detected buildable project (pyproject.toml/setup.py)"));
    assert!(script.contains("pip install -e ."));
}

#[test]
fn skip_db_init_prints_notice() {
    let repo = RepositoryDescriptor::custom("https://github.com/acme/shop.git", Framework::Django);
    let opts = SetupOptions {
        init_db: false,
        ..SetupOptions::for_repository(&repo)
    };
    let script = generate_setup_script(&repo, &opts).unwrap();
    assert!(script.contains("Skipping database initialization as requested"));
    assert!(!script.contains("python3 manage.py migrate"));
}

#[test]
fn framework_run_commands() {
    let cases = [
        (Framework::Flask, "flask run"),
        (Framework::Fastapi, "uvicorn main:app"),
        (Framework::Frappe, "bench start"),
    ];
    for (framework, expected) in cases {
        let repo = RepositoryDescriptor::custom("https://github.com/acme/app.git", framework);
        let script = generate_setup_script(&repo, &SetupOptions::for_repository(&repo)).unwrap();
        assert!(script.contains(expected), "{} missing {}", framework, expected);
    }

    let frappe = RepositoryDescriptor::custom("https://github.com/acme/app.git", Framework::Frappe);
    let script = generate_setup_script(&frappe, &SetupOptions::for_repository(&frappe)).unwrap();
    assert!(script.contains("bench --site mysite.local set-admin-password admin"));
}

#[test]
fn unknown_framework_tag_uses_generic_templates() {
    let json = r#"{"name": "x", "url": "https://github.com/acme/x.git", "framework": "rails"}"#;
    let repo: RepositoryDescriptor = serde_json::from_str(json).unwrap();
    assert_eq!(repo.framework, Framework::Generic);
    let script = generate_setup_script(&repo, &SetupOptions::for_repository(&repo)).unwrap();
    assert!(!script.contains("# --- Run development server ---"));
}

#[test]
fn empty_dependency_files_emit_no_install_stage() {
    let mut repo = RepositoryDescriptor::custom("https://github.com/frappe/frappe_docker.git", Framework::Frappe);
    repo.dependencies = Some(Dependencies::default());
    let script = generate_setup_script(&repo, &SetupOptions::for_repository(&repo)).unwrap();
    assert!(!script.contains("# --- Install dependencies ---"));
    assert!(!script.contains("pip install frappe-bench"));
}

#[test]
fn database_only_changes_env_lines() {
    let mut repo = RepositoryDescriptor::custom("https://github.com/acme/shop.git", Framework::Django);
    repo.setup_commands = Some(SetupCommands {
        post_install: Some("python3 manage.py migrate".to_string()),
        ..SetupCommands::default()
    });
    let base = SetupOptions::for_repository(&repo);
    let pg = SetupOptions {
        database: DatabaseBackend::Postgresql,
        ..base.clone()
    };

    let a = generate_setup_script(&repo, &base).unwrap();
    let b = generate_setup_script(&repo, &pg).unwrap();
    let strip = |s: &str| -> Vec<String> {
        s.lines()
            .filter(|l| !l.starts_with("export ") && !l.starts_with("# --- Database"))
            .map(String::from)
            .collect()
    };
    assert_ne!(a, b);
    assert_eq!(strip(&a), strip(&b));
    assert!(b.contains("export DB_ENGINE=django.db.backends.postgresql"));
}

#[test]
fn invalid_inputs_emit_no_text() {
    let repo = RepositoryDescriptor::custom("", Framework::Django);
    assert_eq!(
        generate_setup_script(&repo, &SetupOptions::for_repository(&repo)),
        Err(GeneratorError::MissingUrl)
    );

    let repo = RepositoryDescriptor::custom("https://github.com/acme/shop.git", Framework::Django);
    let opts = SetupOptions {
        project_path: "  ".to_string(),
        ..SetupOptions::for_repository(&repo)
    };
    assert_eq!(generate_setup_script(&repo, &opts), Err(GeneratorError::MissingProjectPath));
}

#[test]
fn open_edx_installs_each_requirements_file() {
    let catalog = Catalog::builtin().unwrap();
    let repo = catalog.find("https://github.com/openedx/edx-platform.git").unwrap();
    let script = generate_setup_script(repo, &SetupOptions::for_repository(repo)).unwrap();
    let pip = position(&script, "pip install -r \"requirements/pip.txt\"");
    let base = position(&script, "pip install -r \"requirements/edx/base.txt\"");
    assert!(pip < base);
}

#[test]
fn override_beats_descriptor_in_generated_script() {
    let mut repo = RepositoryDescriptor::custom("https://github.com/acme/shop.git", Framework::Django);
    repo.setup_commands = Some(SetupCommands {
        post_install: Some("python3 manage.py migrate --database tenants".to_string()),
        ..SetupCommands::default()
    });

    let overridden = SetupOptions {
        post_install_override: "make bootstrap-db".to_string(),
        ..SetupOptions::for_repository(&repo)
    };
    let script = generate_setup_script(&repo, &overridden).unwrap();
    assert!(script.contains("make bootstrap-db"));
    assert!(!script.contains("migrate --database tenants"));

    let blank_override = SetupOptions {
        post_install_override: "   ".to_string(),
        ..SetupOptions::for_repository(&repo)
    };
    let script = generate_setup_script(&repo, &blank_override).unwrap();
    assert!(script.contains("python3 manage.py migrate --database tenants"));
    assert!(!script.contains("make bootstrap-db"));
}

#[test]
fn descriptor_commands_are_emitted_verbatim() {
    let heredoc = "cat > settings.py <<'EOF'\nA = 1\n\nB = 2   \nEOF";
    let mut repo = RepositoryDescriptor::custom("https://github.com/acme/shop.git", Framework::Django);
    repo.setup_commands = Some(SetupCommands {
        post_install: Some(heredoc.to_string()),
        ..SetupCommands::default()
    });
    let script = generate_setup_script(&repo, &SetupOptions::for_repository(&repo)).unwrap();
    assert!(script.contains(heredoc), "heredoc altered:\n{}", script);
}
