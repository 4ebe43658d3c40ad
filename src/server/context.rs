//! Shared handler context and error type

use std::sync::Arc;
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::config::AppConfig;
use crate::generator::GeneratorError;
use crate::lifecycle::LifecycleError;
use crate::server::protocol::ServerMessage;

/// Read-only state shared by every connection
#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<Catalog>,
    pub config: Arc<AppConfig>,
}

impl AppContext {
    pub fn new(catalog: Catalog, config: AppConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }
}

/// Unified handler error, turned into `ServerMessage::Error` by the dispatcher
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Generator(e) => e.code(),
            AppError::Lifecycle(e) => e.code(),
            AppError::Catalog(e) => e.code(),
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn to_server_error(&self) -> ServerMessage {
        let count = match self {
            AppError::Lifecycle(e) => e.removed_count(),
            _ => None,
        };
        ServerMessage::Error {
            code: self.code().to_string(),
            message: self.to_string(),
            count,
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Task failed: {}", e))
    }
}
