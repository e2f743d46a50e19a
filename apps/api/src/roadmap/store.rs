//! Roadmap Store: one document and one progress map per (user, career goal).
//!
//! Duplicate detection is left to the UNIQUE(user_id, career_goal) constraint.
//! Progress writes go through `apply_progress_changes`, which merges under a
//! per-key lock so concurrent toggles on the same roadmap never drop each other.

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDateTime;
use dashmap::DashMap;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::db::{ensure_career_plans_table, is_unique_violation};
use crate::errors::AppError;
use crate::models::roadmap::RoadmapRow;
use crate::roadmap::document::RoadmapDocument;
use crate::roadmap::projector::{leaf_ids, ProgressMap};

/// A roadmap record as read back from the store.
#[derive(Debug, Clone)]
pub struct StoredRoadmap {
    pub career_goal: String,
    pub document: RoadmapDocument,
    pub progress: ProgressMap,
    pub created_at: NaiveDateTime,
}

impl TryFrom<RoadmapRow> for StoredRoadmap {
    type Error = anyhow::Error;

    fn try_from(row: RoadmapRow) -> Result<Self, Self::Error> {
        let document = RoadmapDocument::from_json_str(&row.roadmap_json)
            .with_context(|| format!("Corrupt roadmap_json for goal '{}'", row.career_goal))?;
        let progress = match row.checkbox_states.as_deref() {
            Some(states) => serde_json::from_str::<ProgressMap>(states).with_context(|| {
                format!("Corrupt checkbox_states for goal '{}'", row.career_goal)
            })?,
            None => ProgressMap::new(),
        };
        Ok(StoredRoadmap {
            career_goal: row.career_goal,
            document,
            progress,
            created_at: row.created_at,
        })
    }
}

/// Per-(user_id, career_goal) locks serializing progress read-modify-write.
#[derive(Clone, Default)]
pub struct ProgressLocks {
    locks: Arc<DashMap<(i64, String), Arc<Mutex<()>>>>,
}

impl ProgressLocks {
    fn lock_for(&self, user_id: i64, career_goal: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry((user_id, career_goal.to_string()))
            .or_default()
            .value()
            .clone()
    }
}

/// Inserts a new roadmap with an empty progress map.
pub async fn create_roadmap(
    pool: &SqlitePool,
    user_id: i64,
    career_goal: &str,
    document: &RoadmapDocument,
) -> Result<(), AppError> {
    ensure_career_plans_table(pool).await?;

    let roadmap_json = document
        .to_json_string()
        .context("Failed to serialize roadmap document")?;
    let checkbox_states = serde_json::to_string(&ProgressMap::new())
        .context("Failed to serialize progress map")?;

    let inserted = sqlx::query(
        "INSERT INTO career_plans (user_id, career_goal, roadmap_json, checkbox_states) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(career_goal)
    .bind(roadmap_json)
    .bind(checkbox_states)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => {
            info!("Stored roadmap '{career_goal}' for user {user_id}");
            Ok(())
        }
        Err(e) if is_unique_violation(&e) => {
            info!("Roadmap '{career_goal}' already exists for user {user_id}");
            Err(AppError::RoadmapAlreadyExists(career_goal.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_roadmap(
    pool: &SqlitePool,
    user_id: i64,
    career_goal: &str,
) -> Result<StoredRoadmap, AppError> {
    let row = sqlx::query_as::<_, RoadmapRow>(
        "SELECT career_goal, roadmap_json, checkbox_states, created_at FROM career_plans WHERE user_id = ? AND career_goal = ?",
    )
    .bind(user_id)
    .bind(career_goal)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::RoadmapNotFound(career_goal.to_string()))?;

    debug!("Fetched roadmap '{career_goal}' for user {user_id}");
    Ok(StoredRoadmap::try_from(row)?)
}

/// Pre-flight check so callers can skip an expensive generation. The INSERT
/// in `create_roadmap` remains the authority on duplicates.
pub async fn roadmap_exists(
    pool: &SqlitePool,
    user_id: i64,
    career_goal: &str,
) -> Result<bool, AppError> {
    let exists: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM career_plans WHERE user_id = ? AND career_goal = ?)",
    )
    .bind(user_id)
    .bind(career_goal)
    .fetch_one(pool)
    .await?;
    Ok(exists != 0)
}

/// Career goals of every roadmap the user owns, oldest first.
pub async fn list_goals(pool: &SqlitePool, user_id: i64) -> Result<Vec<String>, AppError> {
    ensure_career_plans_table(pool).await?;

    let goals = sqlx::query_scalar::<_, String>(
        "SELECT career_goal FROM career_plans WHERE user_id = ? ORDER BY created_at, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(goals)
}

/// Replaces the stored progress map wholesale. Callers outside this module
/// should use `apply_progress_changes`.
pub async fn update_progress(
    pool: &SqlitePool,
    user_id: i64,
    career_goal: &str,
    progress: &ProgressMap,
) -> Result<(), AppError> {
    let checkbox_states =
        serde_json::to_string(progress).context("Failed to serialize progress map")?;

    let result = sqlx::query(
        "UPDATE career_plans SET checkbox_states = ? WHERE user_id = ? AND career_goal = ?",
    )
    .bind(checkbox_states)
    .bind(user_id)
    .bind(career_goal)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::RoadmapNotFound(career_goal.to_string()));
    }
    Ok(())
}

/// Merges `changes` into the stored progress map and persists the result.
///
/// Every id in `changes` must be derivable from the current document. Stored
/// ids that are not in `changes` keep their value, including stale ones.
pub async fn apply_progress_changes(
    pool: &SqlitePool,
    locks: &ProgressLocks,
    user_id: i64,
    career_goal: &str,
    changes: &ProgressMap,
) -> Result<StoredRoadmap, AppError> {
    let lock = locks.lock_for(user_id, career_goal);
    let _guard = lock.lock().await;

    let mut roadmap = fetch_roadmap(pool, user_id, career_goal).await?;

    let known = leaf_ids(&roadmap.document);
    if let Some(unknown) = changes.keys().find(|id| !known.contains(*id)) {
        return Err(AppError::Validation(format!(
            "Unknown checklist item '{}'",
            unknown.as_str()
        )));
    }

    roadmap
        .progress
        .extend(changes.iter().map(|(id, done)| (id.clone(), *done)));
    update_progress(pool, user_id, career_goal, &roadmap.progress).await?;

    info!(
        "Updated {} checklist item(s) on '{career_goal}' for user {user_id}",
        changes.len()
    );
    Ok(roadmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::roadmap::projector::{project, LeafId};
    use serde_json::json;

    fn alice_document() -> RoadmapDocument {
        serde_json::from_value(json!({
            "timeline": {"Month 1": {"Basics": ["A", "B"], "Resources": ["R1"]}}
        }))
        .unwrap()
    }

    fn id_of(document: &RoadmapDocument, text: &str) -> LeafId {
        project(document, &ProgressMap::new())
            .items()
            .find(|item| item.text == text)
            .map(|item| item.id.clone())
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_fetch_round_trips() {
        let pool = memory_pool().await;
        let document: RoadmapDocument = serde_json::from_value(json!({
            "summary": "twelve months",
            "timeline": {
                "Month 1-2": {
                    "Fundamentals": ["Python", "SQL"],
                    "Math": {"Algebra": ["Vectors"]},
                    "Weekly hours": 10,
                    "Resources": {"Books": ["SICP"]}
                }
            }
        }))
        .unwrap();

        create_roadmap(&pool, 1, "Data Scientist", &document).await.unwrap();
        let stored = fetch_roadmap(&pool, 1, "Data Scientist").await.unwrap();

        assert_eq!(stored.document, document);
        assert_eq!(
            serde_json::to_value(&stored.document).unwrap(),
            serde_json::to_value(&document).unwrap()
        );
        assert!(stored.progress.is_empty());
        assert_eq!(stored.career_goal, "Data Scientist");
    }

    #[tokio::test]
    async fn test_second_create_fails_and_keeps_first_record() {
        let pool = memory_pool().await;
        let first = alice_document();
        let second: RoadmapDocument =
            serde_json::from_value(json!({"timeline": {"Month 9": {"Other": ["Z"]}}})).unwrap();

        create_roadmap(&pool, 7, "AI Engineer", &first).await.unwrap();
        let err = create_roadmap(&pool, 7, "AI Engineer", &second).await.unwrap_err();
        assert!(matches!(err, AppError::RoadmapAlreadyExists(ref g) if g == "AI Engineer"));

        let stored = fetch_roadmap(&pool, 7, "AI Engineer").await.unwrap();
        assert_eq!(stored.document, first);
    }

    #[tokio::test]
    async fn test_same_goal_for_different_users_is_allowed() {
        let pool = memory_pool().await;
        create_roadmap(&pool, 1, "Web Developer", &alice_document()).await.unwrap();
        create_roadmap(&pool, 2, "Web Developer", &alice_document()).await.unwrap();

        assert!(roadmap_exists(&pool, 1, "Web Developer").await.unwrap());
        assert!(roadmap_exists(&pool, 2, "Web Developer").await.unwrap());
        assert!(!roadmap_exists(&pool, 3, "Web Developer").await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let pool = memory_pool().await;
        let err = fetch_roadmap(&pool, 1, "Nope").await.unwrap_err();
        assert!(matches!(err, AppError::RoadmapNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_goals() {
        let pool = memory_pool().await;
        assert!(list_goals(&pool, 1).await.unwrap().is_empty());

        create_roadmap(&pool, 1, "AI Engineer", &alice_document()).await.unwrap();
        create_roadmap(&pool, 1, "Data Scientist", &alice_document()).await.unwrap();
        create_roadmap(&pool, 2, "Web Developer", &alice_document()).await.unwrap();

        assert_eq!(
            list_goals(&pool, 1).await.unwrap(),
            vec!["AI Engineer", "Data Scientist"]
        );
        assert_eq!(list_goals(&pool, 2).await.unwrap(), vec!["Web Developer"]);
    }

    #[tokio::test]
    async fn test_update_progress_replaces_and_reports_missing() {
        let pool = memory_pool().await;
        let document = alice_document();
        create_roadmap(&pool, 1, "Goal", &document).await.unwrap();

        let mut progress = ProgressMap::new();
        progress.insert(id_of(&document, "A"), true);
        update_progress(&pool, 1, "Goal", &progress).await.unwrap();
        assert_eq!(fetch_roadmap(&pool, 1, "Goal").await.unwrap().progress, progress);

        let err = update_progress(&pool, 1, "Other", &progress).await.unwrap_err();
        assert!(matches!(err, AppError::RoadmapNotFound(_)));
    }

    #[tokio::test]
    async fn test_null_checkbox_states_reads_as_empty() {
        let pool = memory_pool().await;
        sqlx::query(
            "INSERT INTO career_plans (user_id, career_goal, roadmap_json, checkbox_states) VALUES (1, 'Legacy', ?, NULL)",
        )
        .bind(alice_document().to_json_string().unwrap())
        .execute(&pool)
        .await
        .unwrap();

        let stored = fetch_roadmap(&pool, 1, "Legacy").await.unwrap();
        assert!(stored.progress.is_empty());
    }

    #[tokio::test]
    async fn test_alice_end_to_end_progress() {
        let pool = memory_pool().await;
        let locks = ProgressLocks::default();
        let document = alice_document();
        create_roadmap(&pool, 1, "Goal", &document).await.unwrap();

        let mut changes = ProgressMap::new();
        changes.insert(id_of(&document, "A"), true);
        apply_progress_changes(&pool, &locks, 1, "Goal", &changes).await.unwrap();

        let stored = fetch_roadmap(&pool, 1, "Goal").await.unwrap();
        let checklist = project(&stored.document, &stored.progress);
        assert_eq!(checklist.summary.completed, 1);
        assert_eq!(checklist.summary.total, 2);
        assert_eq!(checklist.summary.percentage, Some(0.5));
        assert!(checklist.items().all(|item| item.text != "R1"));
    }

    #[tokio::test]
    async fn test_merge_keeps_previously_completed_items() {
        let pool = memory_pool().await;
        let locks = ProgressLocks::default();
        let document = alice_document();
        create_roadmap(&pool, 1, "Goal", &document).await.unwrap();

        let a = id_of(&document, "A");
        let b = id_of(&document, "B");
        apply_progress_changes(&pool, &locks, 1, "Goal", &ProgressMap::from([(a.clone(), true)]))
            .await
            .unwrap();
        apply_progress_changes(&pool, &locks, 1, "Goal", &ProgressMap::from([(b.clone(), true)]))
            .await
            .unwrap();

        let progress = fetch_roadmap(&pool, 1, "Goal").await.unwrap().progress;
        assert_eq!(progress.get(&a), Some(&true));
        assert_eq!(progress.get(&b), Some(&true));
    }

    #[tokio::test]
    async fn test_merge_rejects_unknown_ids_and_keeps_stale_ones() {
        let pool = memory_pool().await;
        let locks = ProgressLocks::default();
        let document = alice_document();
        create_roadmap(&pool, 1, "Goal", &document).await.unwrap();

        let stale = LeafId::from("stale-id");
        update_progress(&pool, 1, "Goal", &ProgressMap::from([(stale.clone(), true)]))
            .await
            .unwrap();

        let err = apply_progress_changes(
            &pool,
            &locks,
            1,
            "Goal",
            &ProgressMap::from([(LeafId::from("made-up"), true)]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let a = id_of(&document, "A");
        let updated =
            apply_progress_changes(&pool, &locks, 1, "Goal", &ProgressMap::from([(a, true)]))
                .await
                .unwrap();
        assert_eq!(updated.progress.get(&stale), Some(&true));
        assert_eq!(project(&updated.document, &updated.progress).summary.completed, 1);
    }

    #[tokio::test]
    async fn test_concurrent_merges_lose_nothing() {
        let pool = memory_pool().await;
        let locks = ProgressLocks::default();
        let leaves: Vec<String> = (0..16).map(|i| format!("Item {i}")).collect();
        let document: RoadmapDocument =
            serde_json::from_value(json!({"timeline": {"Month 1": {"Drills": leaves}}})).unwrap();
        create_roadmap(&pool, 1, "Goal", &document).await.unwrap();

        let ids: Vec<LeafId> = project(&document, &ProgressMap::new())
            .items()
            .map(|item| item.id.clone())
            .collect();

        let tasks: Vec<_> = ids
            .iter()
            .cloned()
            .map(|id| {
                let pool = pool.clone();
                let locks = locks.clone();
                tokio::spawn(async move {
                    apply_progress_changes(&pool, &locks, 1, "Goal", &ProgressMap::from([(id, true)]))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = fetch_roadmap(&pool, 1, "Goal").await.unwrap();
        let summary = project(&stored.document, &stored.progress).summary;
        assert_eq!(summary.completed, 16);
        assert_eq!(summary.total, 16);
    }
}
