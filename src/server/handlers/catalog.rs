use tracing::debug;

use crate::catalog::{Framework, RepositoryDescriptor};
use crate::generator::SetupOptions;
use crate::server::context::{AppContext, AppError};
use crate::server::protocol::ServerMessage;

pub fn list_catalog(ctx: &AppContext) -> ServerMessage {
    ServerMessage::Catalog {
        categories: ctx.catalog.categories.clone(),
    }
}

/// Pick the descriptor a request refers to: an inline `repo` wins, then a
/// catalog lookup by URL, then a custom descriptor for an unknown URL.
pub fn resolve_repository(
    ctx: &AppContext,
    repo_url: Option<String>,
    repo: Option<RepositoryDescriptor>,
    framework: Option<Framework>,
) -> Result<RepositoryDescriptor, AppError> {
    if let Some(repo) = repo {
        return Ok(repo);
    }
    let url = repo_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Either repo_url or repo is required".to_string()))?;

    match ctx.catalog.find(&url) {
        Some(found) => Ok(found.clone()),
        None => {
            debug!(url = %url, "Repository not in catalog, using custom descriptor");
            Ok(RepositoryDescriptor::custom(&url, framework.unwrap_or_default()))
        }
    }
}

/// Caller options, or auto-configuration plus configured defaults
pub fn resolve_options(
    ctx: &AppContext,
    repo: &RepositoryDescriptor,
    options: Option<SetupOptions>,
) -> SetupOptions {
    options.unwrap_or_else(|| {
        let mut opts = SetupOptions::for_repository(repo);
        ctx.config.apply_defaults(&mut opts);
        opts
    })
}
