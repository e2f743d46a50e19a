//! Bearer-token sessions.
//!
//! Handlers receive the caller's identity as an explicit `SessionContext`
//! extractor; routes that take one are unreachable without a live token.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

/// Identity of an authenticated caller, valid until logout.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    #[serde(skip)]
    pub token: Uuid,
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, SessionContext>>,
}

impl SessionStore {
    pub fn open(&self, user: &UserRow) -> SessionContext {
        let session = SessionContext {
            token: Uuid::new_v4(),
            user_id: user.id,
            username: user.username.clone(),
            created_at: Utc::now(),
        };
        self.sessions.insert(session.token, session.clone());
        debug!("Opened session for user {}", user.id);
        session
    }

    pub fn resolve(&self, token: Uuid) -> Option<SessionContext> {
        self.sessions.get(&token).map(|entry| entry.value().clone())
    }

    /// Returns false if the token was already gone.
    pub fn close(&self, token: Uuid) -> bool {
        self.sessions.remove(&token).is_some()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers)
            .and_then(|token| state.sessions.resolve(token))
            .ok_or(AppError::Unauthorized)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim()
        .parse()
        .ok()
}
