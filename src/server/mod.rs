//! Local control-plane server
//!
//! Exposes the generator and the lifecycle operations to a UI over a
//! JSON WebSocket protocol.

pub mod context;
pub mod handlers;
pub mod protocol;
pub mod ws;

pub use context::{AppContext, AppError};
pub use protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
pub use ws::{router, run_server, serve};
