use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Marketing profile a user fills in once; drives every generation prompt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct UserSetting {
    pub id: Uuid,
    pub user_id: String,
    pub activity_type: String,
    pub activity_detail: String,
    pub goal: String,
    pub target_audience: String,
    pub preferred_tone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating or replacing a user's settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpsertUserSetting {
    pub activity_type: String,
    #[serde(default)]
    pub activity_detail: String,
    pub goal: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub preferred_tone: String,
}

impl UpsertUserSetting {
    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.activity_type.trim().is_empty() {
            missing.push("activity_type");
        }
        if self.goal.trim().is_empty() {
            missing.push("goal");
        }
        missing
    }
}

impl UserSetting {
    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserSetting>(
            r#"
            SELECT id, user_id, activity_type, activity_detail, goal,
                   target_audience, preferred_tone, created_at, updated_at
            FROM user_settings
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// One row per user: inserts on first call, replaces the profile afterwards.
    pub async fn upsert(
        pool: &SqlitePool,
        user_id: &str,
        data: &UpsertUserSetting,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserSetting>(
            r#"
            INSERT INTO user_settings
                (id, user_id, activity_type, activity_detail, goal, target_audience, preferred_tone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(user_id) DO UPDATE SET
                activity_type   = excluded.activity_type,
                activity_detail = excluded.activity_detail,
                goal            = excluded.goal,
                target_audience = excluded.target_audience,
                preferred_tone  = excluded.preferred_tone,
                updated_at      = datetime('now', 'subsec')
            RETURNING id, user_id, activity_type, activity_detail, goal,
                      target_audience, preferred_tone, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&data.activity_type)
        .bind(&data.activity_detail)
        .bind(&data.goal)
        .bind(&data.target_audience)
        .bind(&data.preferred_tone)
        .fetch_one(pool)
        .await
    }
}
