use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::path::PathBuf;

use crate::lifecycle::{
    archive_workspace, delete_items, read_directory_recursive, require_absolute, save_file,
};
use crate::server::context::{AppContext, AppError};
use crate::server::handlers::log::audit;
use crate::server::handlers::scripts::saved_info;
use crate::server::protocol::{ClientMessage, ContentEncoding, DirectoryFile, ServerMessage};

fn decode_content(content: Option<String>, encoding: ContentEncoding) -> Result<Vec<u8>, AppError> {
    let content = content.ok_or_else(|| AppError::BadRequest("No content provided".to_string()))?;
    match encoding {
        ContentEncoding::Utf8 => Ok(content.into_bytes()),
        ContentEncoding::Base64 => BASE64
            .decode(content.as_bytes())
            .map_err(|e| AppError::BadRequest(format!("Invalid base64 content: {}", e))),
    }
}

/// Handle save, delete, archive and read requests. File system work runs
/// on the blocking pool.
pub async fn handle_workspace_message(
    msg: ClientMessage,
    ctx: &AppContext,
) -> Result<ServerMessage, AppError> {
    match msg {
        ClientMessage::SaveFile {
            directory,
            filename,
            content,
            encoding,
        } => {
            let bytes = decode_content(content, encoding)?;
            let opts = ctx.config.save_options();
            let saved =
                tokio::task::spawn_blocking(move || save_file(&directory, &filename, &bytes, opts))
                    .await??;
            Ok(ServerMessage::FileSaved {
                file: saved_info(saved),
            })
        }

        ClientMessage::DeleteItems {
            directory,
            mode,
            venv_name,
        } => {
            let dir = require_absolute(&directory, "Directory")?;
            let audit_mode = mode.to_string();
            let result =
                tokio::task::spawn_blocking(move || delete_items(&dir, &mode, &venv_name)).await?;
            let summary = match &result {
                Ok(report) => format!("mode={} removed={}", audit_mode, report.removed),
                Err(e) => format!("mode={} error={}", audit_mode, e),
            };
            audit("delete_items", &directory, &summary);
            let report = result?;
            Ok(ServerMessage::ItemsDeleted {
                count: report.removed,
                skipped: report.skipped,
            })
        }

        ClientMessage::ArchiveWorkspace {
            source_dir,
            dest_path,
            venv_name,
        } => {
            let source = require_absolute(&source_dir, "Source directory")?;
            let dest = require_absolute(&dest_path, "Destination path")?;
            let path = archive_workspace(&source, &dest, venv_name.as_deref()).await?;
            let path = path.to_string_lossy().into_owned();
            audit("archive_workspace", &source_dir, &format!("Archived to {}", path));
            Ok(ServerMessage::WorkspaceArchived { path })
        }

        ClientMessage::ReadDirectory {
            directory,
            venv_name,
        } => {
            let dir: PathBuf = require_absolute(&directory, "Directory")?;
            let files = tokio::task::spawn_blocking(move || {
                read_directory_recursive(&dir, venv_name.as_deref())
            })
            .await??;
            Ok(ServerMessage::DirectoryContents {
                directory,
                files: files
                    .into_iter()
                    .map(|f| DirectoryFile {
                        relative_path: f.relative_path,
                        content: BASE64.encode(f.content),
                    })
                    .collect(),
            })
        }

        other => Err(AppError::BadRequest(format!(
            "Unsupported request: {:?}",
            std::mem::discriminant(&other)
        ))),
    }
}
