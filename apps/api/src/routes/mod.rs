pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::roadmap::handlers as roadmap;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Authentication view
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/session", get(auth::handle_current_session))
        // Generate Plan / Monitor Goal views
        .route(
            "/api/v1/roadmaps",
            post(roadmap::handle_generate).get(roadmap::handle_list_goals),
        )
        .route("/api/v1/roadmaps/:career_goal", get(roadmap::handle_get_roadmap))
        .route(
            "/api/v1/roadmaps/:career_goal/progress",
            patch(roadmap::handle_update_progress),
        )
        .with_state(state)
}
