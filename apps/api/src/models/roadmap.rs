use chrono::NaiveDateTime;
use sqlx::FromRow;

/// Columns of `career_plans` read back by the roadmap store.
/// Both JSON columns are decoded there, not here.
#[derive(Debug, Clone, FromRow)]
pub struct RoadmapRow {
    pub career_goal: String,
    pub roadmap_json: String,
    /// NULL reads as an empty progress map.
    pub checkbox_states: Option<String>,
    pub created_at: NaiveDateTime,
}
