use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::session::SessionStore;
use crate::generation::generator::RoadmapGenerator;
use crate::roadmap::store::ProgressLocks;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Pluggable roadmap source. Default: LlmRoadmapGenerator.
    pub generator: Arc<dyn RoadmapGenerator>,
    pub sessions: SessionStore,
    /// Serializes progress merges per (user_id, career_goal).
    pub progress_locks: ProgressLocks,
}

impl AppState {
    pub fn new(db: SqlitePool, generator: Arc<dyn RoadmapGenerator>) -> Self {
        Self {
            db,
            generator,
            sessions: SessionStore::default(),
            progress_locks: ProgressLocks::default(),
        }
    }
}
