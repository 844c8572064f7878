use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Lifecycle of an accepted draft
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Edited,
    Posted,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Post {
    pub id: Uuid,
    pub user_id: String,
    pub fact_id: Uuid, // Foreign key to Fact
    pub content: String,
    pub version: i64,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post together with the fact it was written from
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct PostWithFact {
    #[serde(flatten)]
    #[ts(flatten)]
    #[sqlx(flatten)]
    pub post: Post,
    pub fact_text: String,
    pub fact_tags: String,
}

impl std::ops::Deref for PostWithFact {
    type Target = Post;
    fn deref(&self) -> &Self::Target {
        &self.post
    }
}

/// Request body for saving a post
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePost {
    pub fact_id: Uuid,
    pub content: String,
    /// Next free version for the fact when omitted.
    pub version: Option<i64>,
}

/// Request body for changing a post's status
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdatePostStatus {
    pub status: PostStatus,
}

const POST_COLUMNS: &str = "id, user_id, fact_id, content, version, status, created_at, updated_at";

impl Post {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        data: &CreatePost,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO posts (id, user_id, fact_id, content, version)
            VALUES ($1, $2, $3, $4,
                    COALESCE($5, (SELECT COALESCE(MAX(version), 0) + 1 FROM posts WHERE fact_id = $3)))
            RETURNING {POST_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(data.fact_id)
            .bind(&data.content)
            .bind(data.version)
            .fetch_one(pool)
            .await
    }

    /// Newest first, each joined with its source fact.
    pub async fn find_by_user_id_with_fact(
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Vec<PostWithFact>, sqlx::Error> {
        sqlx::query_as::<_, PostWithFact>(
            r#"
            SELECT p.id, p.user_id, p.fact_id, p.content, p.version, p.status,
                   p.created_at, p.updated_at,
                   f.text AS fact_text,
                   f.tags AS fact_tags
            FROM posts p
            JOIN facts f ON f.id = p.fact_id
            WHERE p.user_id = $1
            ORDER BY p.created_at DESC, p.rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Updates the status only if the post belongs to `user_id`.
    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        status: PostStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE posts
            SET status = $2,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND user_id = $3
            RETURNING {POST_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(status)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DBService,
        models::fact::{CreateFact, Fact},
    };

    async fn seed_fact(db: &DBService) -> Fact {
        Fact::create(
            &db.pool,
            Uuid::new_v4(),
            "user-1",
            &CreateFact {
                text: "朝のタスク整理で気づいた".to_string(),
                tags: vec!["仕事術".to_string()],
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_version_defaults_to_next_per_fact() {
        let db = DBService::new_in_memory().await.unwrap();
        let fact = seed_fact(&db).await;

        let draft = |version| CreatePost {
            fact_id: fact.id,
            content: "本文".to_string(),
            version,
        };

        let first = Post::create(&db.pool, Uuid::new_v4(), "user-1", &draft(None))
            .await
            .unwrap();
        let second = Post::create(&db.pool, Uuid::new_v4(), "user-1", &draft(None))
            .await
            .unwrap();
        let explicit = Post::create(&db.pool, Uuid::new_v4(), "user-1", &draft(Some(10)))
            .await
            .unwrap();

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(explicit.version, 10);
        assert_eq!(first.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn test_duplicate_version_is_rejected() {
        let db = DBService::new_in_memory().await.unwrap();
        let fact = seed_fact(&db).await;
        let data = CreatePost {
            fact_id: fact.id,
            content: "本文".to_string(),
            version: Some(1),
        };

        Post::create(&db.pool, Uuid::new_v4(), "user-1", &data).await.unwrap();
        assert!(Post::create(&db.pool, Uuid::new_v4(), "user-1", &data).await.is_err());
    }

    #[tokio::test]
    async fn test_update_status() {
        let db = DBService::new_in_memory().await.unwrap();
        let fact = seed_fact(&db).await;
        let post = Post::create(
            &db.pool,
            Uuid::new_v4(),
            "user-1",
            &CreatePost {
                fact_id: fact.id,
                content: "本文".to_string(),
                version: None,
            },
        )
        .await
        .unwrap();

        let foreign = Post::update_status(&db.pool, post.id, "user-2", PostStatus::Posted)
            .await
            .unwrap();
        assert!(foreign.is_none());

        let updated = Post::update_status(&db.pool, post.id, "user-1", PostStatus::Posted)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, PostStatus::Posted);

        let missing = Post::update_status(&db.pool, Uuid::new_v4(), "user-1", PostStatus::Edited)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_joins_source_fact() {
        let db = DBService::new_in_memory().await.unwrap();
        let fact = seed_fact(&db).await;
        let post = Post::create(
            &db.pool,
            Uuid::new_v4(),
            "user-1",
            &CreatePost {
                fact_id: fact.id,
                content: "本文".to_string(),
                version: None,
            },
        )
        .await
        .unwrap();

        let listed = Post::find_by_user_id_with_fact(&db.pool, "user-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, post.id);
        assert_eq!(listed[0].content, "本文");
        assert_eq!(listed[0].fact_text, "朝のタスク整理で気づいた");
        assert_eq!(listed[0].fact_tags, "仕事術");

        assert!(
            Post::find_by_user_id_with_fact(&db.pool, "user-2")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_status_parses_from_lowercase() {
        assert_eq!("posted".parse::<PostStatus>().unwrap(), PostStatus::Posted);
        assert_eq!(PostStatus::Edited.to_string(), "edited");
    }
}
