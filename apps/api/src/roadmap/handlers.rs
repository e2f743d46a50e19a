//! Axum route handlers for the Generate Plan and Monitor Goal views.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::session::SessionContext;
use crate::errors::AppError;
use crate::generation::generator::RoadmapRequest;
use crate::roadmap::document::RoadmapDocument;
use crate::roadmap::projector::{project, Checklist, ProgressMap};
use crate::roadmap::store::{
    apply_progress_changes, create_roadmap, fetch_roadmap, list_goals, roadmap_exists,
    StoredRoadmap,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RoadmapResponse {
    pub career_goal: String,
    pub created_at: NaiveDateTime,
    pub roadmap: RoadmapDocument,
    pub checklist: Checklist,
}

impl From<StoredRoadmap> for RoadmapResponse {
    fn from(stored: StoredRoadmap) -> Self {
        let checklist = project(&stored.document, &stored.progress);
        Self {
            career_goal: stored.career_goal,
            created_at: stored.created_at,
            roadmap: stored.document,
            checklist,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GoalListResponse {
    pub goals: Vec<String>,
}

/// Checkbox changes: leaf id → completed. Ids not listed keep their state.
#[derive(Debug, Deserialize)]
pub struct ProgressUpdateRequest {
    pub changes: ProgressMap,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/roadmaps
///
/// Generates, stores and returns a roadmap for a goal the user has no roadmap for yet.
pub async fn handle_generate(
    State(state): State<AppState>,
    session: SessionContext,
    Json(request): Json<RoadmapRequest>,
) -> Result<(StatusCode, Json<RoadmapResponse>), AppError> {
    let request = request.validated()?;
    let goal = request.career_goal.as_str();

    if roadmap_exists(&state.db, session.user_id, goal).await? {
        return Err(AppError::RoadmapAlreadyExists(goal.to_string()));
    }

    info!("Generating roadmap '{goal}' for user {}", session.user_id);
    let document = state.generator.generate(&request).await?;

    create_roadmap(&state.db, session.user_id, goal, &document).await?;
    let stored = fetch_roadmap(&state.db, session.user_id, goal).await?;

    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// GET /api/v1/roadmaps
pub async fn handle_list_goals(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<GoalListResponse>, AppError> {
    let goals = list_goals(&state.db, session.user_id).await?;
    Ok(Json(GoalListResponse { goals }))
}

/// GET /api/v1/roadmaps/:career_goal
pub async fn handle_get_roadmap(
    State(state): State<AppState>,
    session: SessionContext,
    Path(career_goal): Path<String>,
) -> Result<Json<RoadmapResponse>, AppError> {
    let stored = fetch_roadmap(&state.db, session.user_id, &career_goal).await?;
    Ok(Json(stored.into()))
}

/// PATCH /api/v1/roadmaps/:career_goal/progress
///
/// Merges checkbox changes into the stored progress and returns the updated checklist.
pub async fn handle_update_progress(
    State(state): State<AppState>,
    session: SessionContext,
    Path(career_goal): Path<String>,
    Json(request): Json<ProgressUpdateRequest>,
) -> Result<Json<RoadmapResponse>, AppError> {
    if request.changes.is_empty() {
        return Err(AppError::Validation("changes cannot be empty".to_string()));
    }

    let stored = apply_progress_changes(
        &state.db,
        &state.progress_locks,
        session.user_id,
        &career_goal,
        &request.changes,
    )
    .await?;
    Ok(Json(stored.into()))
}
