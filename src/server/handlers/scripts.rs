use tracing::info;

use crate::generator::generate_bundle;
use crate::lifecycle::{save_file, SavedFile};
use crate::server::context::{AppContext, AppError};
use crate::server::handlers::catalog::{resolve_options, resolve_repository};
use crate::server::handlers::log::audit;
use crate::server::protocol::{ClientMessage, GeneratedFile, SavedFileInfo, ServerMessage};

pub fn saved_info(saved: SavedFile) -> SavedFileInfo {
    SavedFileInfo {
        filename: saved.filename,
        path: saved.path.to_string_lossy().into_owned(),
        sanitized: saved.sanitized,
        executable: saved.executable,
        backup: saved.backup.map(|b| b.to_string_lossy().into_owned()),
    }
}

/// Handle `generate_scripts` and `save_bundle`
pub async fn handle_scripts_message(
    msg: ClientMessage,
    ctx: &AppContext,
) -> Result<ServerMessage, AppError> {
    match msg {
        ClientMessage::GenerateScripts {
            repo_url,
            repo,
            framework,
            options,
            reset_mode,
        } => {
            let repo = resolve_repository(ctx, repo_url, repo, framework)?;
            let opts = resolve_options(ctx, &repo, options);
            let bundle = generate_bundle(&repo, &opts, &reset_mode)?;
            let files = bundle
                .files()
                .into_iter()
                .map(|(filename, content)| GeneratedFile {
                    filename: filename.to_string(),
                    content: content.to_string(),
                })
                .collect();
            info!(repo = %repo.name, framework = %repo.framework, "Scripts generated");
            Ok(ServerMessage::Scripts { repo, files })
        }

        ClientMessage::SaveBundle {
            directory,
            repo_url,
            repo,
            framework,
            options,
            reset_mode,
        } => {
            let repo = resolve_repository(ctx, repo_url, repo, framework)?;
            let opts = resolve_options(ctx, &repo, options);
            let bundle = generate_bundle(&repo, &opts, &reset_mode)?;
            let save_opts = ctx.config.save_options();

            let dir = directory.clone();
            let saved = tokio::task::spawn_blocking(move || {
                bundle
                    .files()
                    .into_iter()
                    .map(|(name, content)| save_file(&dir, name, content.as_bytes(), save_opts))
                    .collect::<Result<Vec<_>, _>>()
            })
            .await??;

            audit(
                "save_bundle",
                &directory,
                &format!("Saved {} files for {}", saved.len(), repo.name),
            );
            Ok(ServerMessage::BundleSaved {
                directory,
                files: saved.into_iter().map(saved_info).collect(),
            })
        }

        other => Err(AppError::Internal(format!(
            "Unexpected message for script handler: {:?}",
            std::mem::discriminant(&other)
        ))),
    }
}
