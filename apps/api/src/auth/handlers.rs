//! Axum route handlers for the Authentication view.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::credentials::{register, verify};
use crate::auth::session::SessionContext;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user_id: i64,
    pub username: String,
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = register(&state.db, &req.username, &req.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            username: user.username,
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Returns a bearer token for the authenticated routes.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = verify(&state.db, &req.username, &req.password).await?;
    let session = state.sessions.open(&user);
    info!("User '{}' logged in", session.username);
    Ok(Json(LoginResponse {
        token: session.token,
        user_id: session.user_id,
        username: session.username,
    }))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    session: SessionContext,
) -> StatusCode {
    state.sessions.close(session.token);
    info!("User '{}' logged out", session.username);
    StatusCode::NO_CONTENT
}

/// GET /api/v1/auth/session
pub async fn handle_current_session(session: SessionContext) -> Json<SessionContext> {
    Json(session)
}
