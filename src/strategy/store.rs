/// Persistent store for generation records
///
/// Records are append-only, scoped to their owning user on every read and
/// write, and mutated only to attach post-hoc feedback.
use crate::{
    error::{ApiError, ApiResult},
    strategy::{StrategyInput, StrategyResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// A persisted generation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub id: String,
    pub user_id: String,
    pub goal: String,
    pub audience: String,
    pub industry: String,
    pub platform: String,
    pub content_type: String,
    pub output_data: StrategyResult,
    pub cache_key: String,
    /// Generation wall-clock time, truncated to whole seconds
    pub generation_secs: i64,
    pub feedback_rating: Option<String>,
    pub feedback_comment: Option<String>,
    pub feedback_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Feedback attached to a record after the fact
#[derive(Debug, Deserialize)]
pub struct StrategyFeedback {
    pub strategy_id: String,
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

pub struct StrategyStore {
    db: SqlitePool,
}

impl StrategyStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Persist a new generation record and return its id
    pub async fn insert(
        &self,
        user_id: &str,
        input: &StrategyInput,
        result: &StrategyResult,
        cache_key: &str,
        generation_secs: i64,
    ) -> ApiResult<String> {
        let id = Uuid::new_v4().to_string();
        let output_json = serde_json::to_string(result)
            .map_err(|e| ApiError::Internal(format!("Result serialization failed: {}", e)))?;

        sqlx::query(
            "INSERT INTO strategies (id, user_id, goal, audience, industry, platform,
                 content_type, output_data, cache_key, generation_secs, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&input.goal)
        .bind(&input.audience)
        .bind(&input.industry)
        .bind(&input.platform)
        .bind(&input.content_type)
        .bind(&output_json)
        .bind(cache_key)
        .bind(generation_secs)
        .bind(Utc::now())
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        Ok(id)
    }

    /// List a user's records, newest first
    pub async fn find_by_user(&self, user_id: &str, limit: i64) -> ApiResult<Vec<StrategyRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM strategies WHERE user_id = ?1
             ORDER BY created_at DESC LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)?;

        rows.iter().map(record_from_row).collect()
    }

    /// Fetch one record, owner-scoped. An absent record and a record owned by
    /// someone else are indistinguishable to the caller.
    pub async fn find_by_id_for_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> ApiResult<StrategyRecord> {
        let row = sqlx::query("SELECT * FROM strategies WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::NotFound("Strategy not found".to_string()))?;

        record_from_row(&row)
    }

    /// Delete one record, owner-scoped. Errors with NotFound when nothing
    /// matched.
    pub async fn delete_by_id_for_user(&self, id: &str, user_id: &str) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM strategies WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::Database)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Strategy not found".to_string()));
        }

        Ok(())
    }

    /// Attach feedback to an owned record
    pub async fn update_feedback(
        &self,
        user_id: &str,
        feedback: &StrategyFeedback,
    ) -> ApiResult<()> {
        let result = sqlx::query(
            "UPDATE strategies
             SET feedback_rating = ?1, feedback_comment = ?2, feedback_at = ?3
             WHERE id = ?4 AND user_id = ?5",
        )
        .bind(&feedback.rating)
        .bind(&feedback.comment)
        .bind(Utc::now())
        .bind(&feedback.strategy_id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Strategy not found".to_string()));
        }

        Ok(())
    }

    /// Total number of records a user owns
    pub async fn count_for_user(&self, user_id: &str) -> ApiResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM strategies WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await
            .map_err(ApiError::Database)?;

        Ok(row.get("n"))
    }
}

fn record_from_row(row: &SqliteRow) -> ApiResult<StrategyRecord> {
    let output_json: String = row.get("output_data");
    let output_data = serde_json::from_str(&output_json)
        .map_err(|e| ApiError::Internal(format!("Stored result corrupted: {}", e)))?;

    Ok(StrategyRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        goal: row.get("goal"),
        audience: row.get("audience"),
        industry: row.get("industry"),
        platform: row.get("platform"),
        content_type: row.get("content_type"),
        output_data,
        cache_key: row.get("cache_key"),
        generation_secs: row.get("generation_secs"),
        feedback_rating: row.get("feedback_rating"),
        feedback_comment: row.get("feedback_comment"),
        feedback_at: row.get::<Option<DateTime<Utc>>, _>("feedback_at"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{fallback, fingerprint};

    async fn test_store() -> StrategyStore {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        // Records reference users
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, tier, referral_count, created_at)
             VALUES ('u1', 'a@b.c', 'x', 'free', 0, ?1),
                    ('u2', 'c@d.e', 'x', 'free', 0, ?1)",
        )
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();

        StrategyStore::new(pool)
    }

    fn input() -> StrategyInput {
        StrategyInput {
            goal: "Grow newsletter subscribers".to_string(),
            audience: "small business owners".to_string(),
            industry: "retail".to_string(),
            platform: "Instagram".to_string(),
            content_type: "Mixed Content".to_string(),
        }
    }

    async fn insert_one(store: &StrategyStore, user_id: &str) -> String {
        let input = input();
        let result = fallback::generate(&input);
        let key = fingerprint::derive(&input);
        store.insert(user_id, &input, &result, &key, 2).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let store = test_store().await;
        let id = insert_one(&store, "u1").await;

        let record = store.find_by_id_for_user(&id, "u1").await.unwrap();
        assert_eq!(record.goal, "Grow newsletter subscribers");
        assert_eq!(record.generation_secs, 2);
        assert_eq!(record.output_data.personas.len(), 3);
        assert!(record.feedback_rating.is_none());
    }

    #[tokio::test]
    async fn test_reads_are_owner_scoped() {
        let store = test_store().await;
        let id = insert_one(&store, "u1").await;

        // Another user sees the same 404 as for a record that does not exist
        let err = store.find_by_id_for_user(&id, "u2").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        let err = store.find_by_id_for_user("missing", "u2").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped() {
        let store = test_store().await;
        let id = insert_one(&store, "u1").await;

        assert!(store.delete_by_id_for_user(&id, "u2").await.is_err());
        assert!(store.delete_by_id_for_user(&id, "u1").await.is_ok());
        assert_eq!(store.count_for_user("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_limited() {
        let store = test_store().await;
        for _ in 0..3 {
            insert_one(&store, "u1").await;
        }
        insert_one(&store, "u2").await;

        let records = store.find_by_user("u1", 2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].created_at >= records[1].created_at);
        assert!(records.iter().all(|r| r.user_id == "u1"));
    }

    #[tokio::test]
    async fn test_feedback_attaches_to_owned_record() {
        let store = test_store().await;
        let id = insert_one(&store, "u1").await;

        let feedback = StrategyFeedback {
            strategy_id: id.clone(),
            rating: "up".to_string(),
            comment: "spot on".to_string(),
        };
        store.update_feedback("u1", &feedback).await.unwrap();

        let record = store.find_by_id_for_user(&id, "u1").await.unwrap();
        assert_eq!(record.feedback_rating.as_deref(), Some("up"));
        assert!(record.feedback_at.is_some());

        // Feedback path is also owner-scoped
        let foreign = StrategyFeedback {
            strategy_id: id,
            rating: "down".to_string(),
            comment: String::new(),
        };
        assert!(store.update_feedback("u2", &foreign).await.is_err());
    }
}
