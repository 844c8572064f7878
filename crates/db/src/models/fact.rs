use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A short note about an experience or insight, the raw material for posts.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Fact {
    pub id: Uuid,
    pub user_id: String,
    pub text: String,
    pub tags: String, // comma-joined
    pub created_at: DateTime<Utc>,
}

impl Fact {
    /// Tags split on commas, trimmed, blanks dropped.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Request body for creating a fact
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFact {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for editing a fact; replaces both text and tags
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateFact {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

impl Fact {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        data: &CreateFact,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Fact>(
            r#"
            INSERT INTO facts (id, user_id, text, tags)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, text, tags, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.text)
        .bind(join_tags(&data.tags))
        .fetch_one(pool)
        .await
    }

    /// Updates the fact only if it belongs to `user_id`.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        data: &UpdateFact,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Fact>(
            r#"
            UPDATE facts
            SET text = $3,
                tags = $4
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, text, tags, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&data.text)
        .bind(join_tags(&data.tags))
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Fact>(
            "SELECT id, user_id, text, tags, created_at FROM facts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Fact>(
            r#"
            SELECT id, user_id, text, tags, created_at
            FROM facts
            WHERE user_id = $1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Deletes the fact only if it belongs to `user_id`.
    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM facts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
