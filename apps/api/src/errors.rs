use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant is recoverable: a failed request never takes the service down.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Username already taken")]
    UsernameTaken,

    /// Bad credentials. Unknown usernames and wrong passwords are reported identically.
    #[error("Authentication rejected")]
    AuthRejected,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Roadmap already exists for goal '{0}'")]
    RoadmapAlreadyExists(String),

    #[error("Roadmap not found for goal '{0}'")]
    RoadmapNotFound(String),

    #[error("Roadmap generation failed: {0}")]
    GenerationFailed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                "USERNAME_TAKEN",
                "Username already exists. Please choose another.".to_string(),
            ),
            AppError::AuthRejected => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REJECTED",
                "Incorrect username or password".to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::RoadmapAlreadyExists(goal) => (
                StatusCode::CONFLICT,
                "ROADMAP_ALREADY_EXISTS",
                format!("A roadmap for '{goal}' already exists"),
            ),
            AppError::RoadmapNotFound(goal) => (
                StatusCode::NOT_FOUND,
                "ROADMAP_NOT_FOUND",
                format!("No roadmap found for '{goal}'"),
            ),
            AppError::GenerationFailed(msg) => {
                tracing::error!("Roadmap generation failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_FAILED",
                    "Failed to generate career roadmap. Please try again.".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
