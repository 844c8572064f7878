//! Service tying stored settings and facts to the post generator, and saving the results.

use std::sync::Arc;

use db::models::{
    fact::Fact,
    post::{CreatePost, Post},
    user_setting::UserSetting,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    post_generator::generate_with_history,
    prompt_builder::GenerationInput,
    text_generation::{GenerationServiceError, TextGenerationClient},
};

#[derive(Debug, Error)]
pub enum PostGenerationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Generation(#[from] GenerationServiceError),
    #[error("fact not found")]
    FactNotFound,
    #[error("user settings not found")]
    SettingsNotFound,
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("post_count must be at least 1")]
    InvalidPostCount,
    #[error("post version already exists for this fact")]
    VersionConflict,
}

/// Draft returned to the caller; saving it is a separate step.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GeneratedPost {
    pub fact_id: Uuid,
    pub content: String,
    /// Calls made to the generation service, including the initial one.
    pub attempts: u32,
    /// False when the regeneration budget ran out before the rules were met.
    pub passed: bool,
}

pub fn generation_input(setting: &UserSetting, fact: &Fact, post_count: u32) -> GenerationInput {
    GenerationInput {
        activity_type: setting.activity_type.clone(),
        activity_detail: setting.activity_detail.clone(),
        goal: setting.goal.clone(),
        target_audience: setting.target_audience.clone(),
        preferred_tone: setting.preferred_tone.clone(),
        post_idea: fact.text.clone(),
        tags: fact.tag_list(),
        post_count,
    }
}

#[derive(Clone)]
pub struct PostGenerationService {
    pool: SqlitePool,
    client: Arc<dyn TextGenerationClient>,
}

impl PostGenerationService {
    pub fn new(pool: SqlitePool, client: Arc<dyn TextGenerationClient>) -> Self {
        Self { pool, client }
    }

    /// Generate a draft for one of the user's facts using their saved settings.
    pub async fn generate_for_fact(
        &self,
        user_id: &str,
        fact_id: Uuid,
        post_count: u32,
    ) -> Result<GeneratedPost, PostGenerationError> {
        if post_count == 0 {
            return Err(PostGenerationError::InvalidPostCount);
        }

        let fact = self.owned_fact(user_id, fact_id).await?;
        let setting = UserSetting::find_by_user_id(&self.pool, user_id)
            .await?
            .ok_or(PostGenerationError::SettingsNotFound)?;

        let input = generation_input(&setting, &fact, post_count);
        let missing = input.missing_required_fields();
        if !missing.is_empty() {
            return Err(PostGenerationError::MissingFields(missing));
        }

        let outcome = generate_with_history(&input, self.client.as_ref())
            .await
            .inspect_err(|e| {
                error!(user_id = %user_id, fact_id = %fact_id, error = %e, "Post generation failed")
            })?;

        info!(
            user_id = %user_id,
            fact_id = %fact_id,
            attempts = outcome.call_count(),
            passed = outcome.passed(),
            "Generated post draft"
        );

        Ok(GeneratedPost {
            fact_id,
            attempts: outcome.call_count() as u32,
            passed: outcome.passed(),
            content: outcome.into_text(),
        })
    }

    /// Record an accepted draft against the fact it came from.
    pub async fn save_post(
        &self,
        user_id: &str,
        data: &CreatePost,
    ) -> Result<Post, PostGenerationError> {
        if data.content.trim().is_empty() {
            return Err(PostGenerationError::MissingFields(vec!["content"]));
        }
        self.owned_fact(user_id, data.fact_id).await?;

        let post = match Post::create(&self.pool, Uuid::new_v4(), user_id, data).await {
            // A concurrent save took the computed next version; compute it once more.
            Err(e) if is_unique_violation(&e) && data.version.is_none() => {
                warn!(fact_id = %data.fact_id, error = %e, "Version taken concurrently, retrying save");
                Post::create(&self.pool, Uuid::new_v4(), user_id, data).await
            }
            other => other,
        }
        .map_err(|e| {
            if is_unique_violation(&e) {
                PostGenerationError::VersionConflict
            } else {
                PostGenerationError::Database(e)
            }
        })?;
        info!(
            post_id = %post.id,
            fact_id = %post.fact_id,
            version = post.version,
            "Saved post"
        );
        Ok(post)
    }

    async fn owned_fact(&self, user_id: &str, fact_id: Uuid) -> Result<Fact, PostGenerationError> {
        Fact::find_by_id(&self.pool, fact_id)
            .await?
            .filter(|fact| fact.user_id == user_id)
            .ok_or(PostGenerationError::FactNotFound)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use db::{
        DBService,
        models::{fact::CreateFact, post::PostStatus, user_setting::UpsertUserSetting},
    };

    use super::*;
    use crate::services::{post_generator::MAX_REGENERATIONS, testing::ScriptedClient};

    async fn seeded() -> (DBService, Fact) {
        let db = DBService::new_in_memory().await.unwrap();
        UserSetting::upsert(
            &db.pool,
            "user-1",
            &UpsertUserSetting {
                activity_type: "フリーランス事業者".to_string(),
                activity_detail: "Webデザイン".to_string(),
                goal: "顧客を獲得したい".to_string(),
                target_audience: "個人事業主".to_string(),
                preferred_tone: "professional".to_string(),
            },
        )
        .await
        .unwrap();
        let fact = Fact::create(
            &db.pool,
            Uuid::new_v4(),
            "user-1",
            &CreateFact {
                text: "朝のタスク整理で気づいた".to_string(),
                tags: vec!["仕事術".to_string(), "朝活".to_string()],
            },
        )
        .await
        .unwrap();
        (db, fact)
    }

    #[tokio::test]
    async fn test_generate_uses_settings_and_fact() {
        let (db, fact) = seeded().await;
        let client = Arc::new(ScriptedClient::new(vec![Ok("あ".repeat(130))]));
        let service = PostGenerationService::new(db.pool.clone(), client.clone());

        let generated = service.generate_for_fact("user-1", fact.id, 1).await.unwrap();

        assert!(generated.passed);
        assert_eq!(generated.attempts, 1);
        let prompt = &client.prompts()[0];
        assert!(prompt.contains("顧客を獲得したい"));
        assert!(prompt.contains("仕事術, 朝活"));
    }

    #[tokio::test]
    async fn test_generate_reports_exhausted_budget() {
        let (db, fact) = seeded().await;
        let client = Arc::new(ScriptedClient::repeating("短すぎる"));
        let service = PostGenerationService::new(db.pool.clone(), client);

        let generated = service.generate_for_fact("user-1", fact.id, 1).await.unwrap();

        assert!(!generated.passed);
        assert_eq!(generated.attempts as usize, 1 + MAX_REGENERATIONS);
        assert_eq!(generated.content, "短すぎる");
    }

    #[tokio::test]
    async fn test_generate_rejects_foreign_fact_and_missing_settings() {
        let (db, fact) = seeded().await;
        let client = Arc::new(ScriptedClient::repeating("unused"));
        let service = PostGenerationService::new(db.pool.clone(), client.clone());

        let err = service.generate_for_fact("user-2", fact.id, 1).await.unwrap_err();
        assert!(matches!(err, PostGenerationError::FactNotFound));

        let other = Fact::create(
            &db.pool,
            Uuid::new_v4(),
            "user-2",
            &CreateFact {
                text: "note".to_string(),
                tags: vec![],
            },
        )
        .await
        .unwrap();
        let err = service.generate_for_fact("user-2", other.id, 1).await.unwrap_err();
        assert!(matches!(err, PostGenerationError::SettingsNotFound));

        let err = service.generate_for_fact("user-1", fact.id, 0).await.unwrap_err();
        assert!(matches!(err, PostGenerationError::InvalidPostCount));

        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_generation_service_error_propagates() {
        let (db, fact) = seeded().await;
        let client = Arc::new(ScriptedClient::new(vec![Err(GenerationServiceError::new(
            Some(503),
            "unavailable",
        ))]));
        let service = PostGenerationService::new(db.pool.clone(), client);

        let err = service.generate_for_fact("user-1", fact.id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            PostGenerationError::Generation(GenerationServiceError { status: Some(503), .. })
        ));
    }

    #[tokio::test]
    async fn test_save_post_versions_per_fact() {
        let (db, fact) = seeded().await;
        let service =
            PostGenerationService::new(db.pool.clone(), Arc::new(ScriptedClient::new(vec![])));
        let data = CreatePost {
            fact_id: fact.id,
            content: "本文".to_string(),
            version: None,
        };

        let first = service.save_post("user-1", &data).await.unwrap();
        let second = service.save_post("user-1", &data).await.unwrap();
        assert_eq!((first.version, second.version), (1, 2));
        assert_eq!(second.status, PostStatus::Draft);

        let err = service.save_post("user-2", &data).await.unwrap_err();
        assert!(matches!(err, PostGenerationError::FactNotFound));

        let blank = CreatePost {
            content: "  ".to_string(),
            ..data
        };
        let err = service.save_post("user-1", &blank).await.unwrap_err();
        assert!(matches!(err, PostGenerationError::MissingFields(_)));
    }

    #[tokio::test]
    async fn test_save_post_reports_taken_version() {
        let (db, fact) = seeded().await;
        let service =
            PostGenerationService::new(db.pool.clone(), Arc::new(ScriptedClient::new(vec![])));
        let data = CreatePost {
            fact_id: fact.id,
            content: "本文".to_string(),
            version: Some(3),
        };

        service.save_post("user-1", &data).await.unwrap();
        let err = service.save_post("user-1", &data).await.unwrap_err();
        assert!(matches!(err, PostGenerationError::VersionConflict));

        let next = service
            .save_post("user-1", &CreatePost { version: None, ..data })
            .await
            .unwrap();
        assert_eq!(next.version, 4);
    }
}
