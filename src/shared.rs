use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::auth::token::TokenConfig;
use crate::note::repository::NoteRepository;
use crate::retreat::repository::RetreatRepository;
use crate::servantee::repository::ServanteeRepository;
use crate::user::repository::UserRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub servantee_repository: Arc<dyn ServanteeRepository + Send + Sync>,
    pub retreat_repository: Arc<dyn RetreatRepository + Send + Sync>,
    pub note_repository: Arc<dyn NoteRepository + Send + Sync>,
    pub tokens: TokenConfig,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        servantee_repository: Arc<dyn ServanteeRepository + Send + Sync>,
        retreat_repository: Arc<dyn RetreatRepository + Send + Sync>,
        note_repository: Arc<dyn NoteRepository + Send + Sync>,
        tokens: TokenConfig,
    ) -> Self {
        Self {
            user_repository,
            servantee_repository,
            retreat_repository,
            note_repository,
            tokens,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Bad email or password. The message is identical for both causes so
    /// callers cannot probe which emails are registered.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password must be at least 8 characters long and contain at least one uppercase letter, one lowercase letter, one number, and one special character")]
    WeakPassword,

    #[error("User with email {0} already exists")]
    EmailExists(String),

    #[error("Servantee with phone {0} already exists")]
    PhoneExists(String),

    /// Signature/expiry failure or stored-hash mismatch on refresh.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Forbidden")]
    Forbidden,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::WeakPassword => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::EmailExists(_) | AppError::PhoneExists(_) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::InvalidRefreshToken | AppError::Forbidden => {
                (StatusCode::FORBIDDEN, self.to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            // Persistence details are logged, never returned to the client.
            AppError::Database(msg) => {
                error!(detail = %msg, "Database failure surfaced at response boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
