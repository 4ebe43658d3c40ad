use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

#[cfg(unix)]
use std::os::unix::process::parent_id;

use crate::server::context::AppContext;
use crate::server::handlers;
use crate::server::protocol::{capabilities, ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::util::file_logger::FileLogger;

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Bind `127.0.0.1:<port>` and serve until `shutdown` resolves
pub async fn run_server<F>(port: u16, ctx: AppContext, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    FileLogger::global().cleanup_old_logs();
    serve(listener, ctx, shutdown).await
}

/// Serve on an already bound listener
pub async fn serve<F>(listener: TcpListener, ctx: AppContext, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(
        "Listening on ws://{}/ws (protocol v{}, {} catalog entries)",
        addr,
        PROTOCOL_VERSION,
        ctx.catalog.len()
    );

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Exit when the parent process dies (the UI that launched us)
#[cfg(unix)]
pub fn spawn_parent_monitor() {
    let initial_ppid = parent_id();
    if initial_ppid <= 1 {
        info!("Running without parent process, skipping monitor");
        return;
    }
    info!("Parent process monitor started, PPID: {}", initial_ppid);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(1));
        loop {
            interval.tick().await;
            let current_ppid = parent_id();
            if current_ppid != initial_ppid {
                warn!(
                    "Parent process died (PPID changed from {} to {}), shutting down",
                    initial_ppid, current_ppid
                );
                std::process::exit(0);
            }
        }
    });
}

async fn ws_handler(ws: WebSocketUpgrade, State(ctx): State<AppContext>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, ctx))
}

async fn handle_socket(mut socket: WebSocket, ctx: AppContext) {
    info!("New WebSocket connection established");

    let hello = ServerMessage::Hello {
        version: PROTOCOL_VERSION,
        capabilities: capabilities(),
    };
    if let Err(e) = send_message(&mut socket, &hello).await {
        error!("Failed to send Hello message: {}", e);
        return;
    }

    while let Some(msg_result) = socket.recv().await {
        let reply = match msg_result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(request) => handlers::dispatch(request, &ctx).await,
                Err(e) => {
                    warn!("Failed to parse client message: {}", e);
                    Some(ServerMessage::Error {
                        code: "parse_error".to_string(),
                        message: format!("Parse error: {}", e),
                        count: None,
                    })
                }
            },
            Ok(Message::Binary(data)) => {
                debug!("Rejected binary frame of {} bytes", data.len());
                Some(ServerMessage::Error {
                    code: "unsupported_frame".to_string(),
                    message: "JSON text frames expected".to_string(),
                    count: None,
                })
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket connection closed by client");
                break;
            }
            // Handled automatically by axum
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
        };

        if let Some(reply) = reply {
            if let Err(e) = send_message(&mut socket, &reply).await {
                error!("Failed to send reply: {}", e);
                break;
            }
        }
    }
    debug!("WebSocket connection finished");
}

pub async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), String> {
    let text = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    socket
        .send(Message::Text(text))
        .await
        .map_err(|e| e.to_string())
}
