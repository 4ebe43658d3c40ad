//! Protocol message handlers, one module per domain

pub mod catalog;
pub mod log;
pub mod scripts;
pub mod workspace;

use tracing::{debug, warn};

use crate::server::context::{AppContext, AppError};
use crate::server::protocol::{ClientMessage, ServerMessage};

/// Route one request. `None` means the request has no reply.
pub async fn dispatch(msg: ClientMessage, ctx: &AppContext) -> Option<ServerMessage> {
    debug!(request = ?std::mem::discriminant(&msg), "Dispatching request");

    let result: Result<Option<ServerMessage>, AppError> = match msg {
        ClientMessage::Ping => Ok(Some(ServerMessage::Pong)),
        ClientMessage::ListCatalog => Ok(Some(catalog::list_catalog(ctx))),
        ClientMessage::LogEntry {
            level,
            source,
            category,
            msg,
            detail,
        } => {
            log::write_client_log(&level, &source, category.as_deref(), &msg, detail.as_deref());
            Ok(None)
        }
        msg @ (ClientMessage::GenerateScripts { .. } | ClientMessage::SaveBundle { .. }) => {
            scripts::handle_scripts_message(msg, ctx).await.map(Some)
        }
        msg => workspace::handle_workspace_message(msg, ctx).await.map(Some),
    };

    match result {
        Ok(reply) => reply,
        Err(e) => {
            warn!(code = e.code(), error = %e, "Request failed");
            Some(e.to_server_error())
        }
    }
}
