use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, patch, post},
};
use db::models::post::{CreatePost, Post, PostWithFact, UpdatePostStatus};
use serde::{Deserialize, Serialize};
use services::services::{post_generation::GeneratedPost, prompt_builder::GenerationInput};
use tracing::info;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Request body for generating a draft
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct GeneratePostRequest {
    pub post_count: Option<u32>,
}

/// POST /api/users/{user_id}/facts/{fact_id}/generate
/// Generate a draft from the fact using the user's settings; nothing is saved
pub async fn generate_post(
    State(state): State<AppState>,
    Path((user_id, fact_id)): Path<(String, Uuid)>,
    axum::Json(payload): axum::Json<GeneratePostRequest>,
) -> Result<ResponseJson<ApiResponse<GeneratedPost>>, ApiError> {
    let post_count = payload
        .post_count
        .unwrap_or(GenerationInput::DEFAULT_POST_COUNT);
    let generated = state
        .generator()
        .generate_for_fact(&user_id, fact_id, post_count)
        .await?;
    Ok(ResponseJson(ApiResponse::success(generated)))
}

/// GET /api/users/{user_id}/posts
/// Newest first, each with its source fact's text and tags
pub async fn list_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<PostWithFact>>>, ApiError> {
    let posts = Post::find_by_user_id_with_fact(&state.db().pool, &user_id).await?;
    Ok(ResponseJson(ApiResponse::success(posts)))
}

/// POST /api/users/{user_id}/posts
/// Save an accepted draft
pub async fn save_post(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    axum::Json(payload): axum::Json<CreatePost>,
) -> Result<ResponseJson<ApiResponse<Post>>, ApiError> {
    let post = state.generator().save_post(&user_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(post)))
}

/// PATCH /api/users/{user_id}/posts/{post_id}
pub async fn update_post_status(
    State(state): State<AppState>,
    Path((user_id, post_id)): Path<(String, Uuid)>,
    axum::Json(payload): axum::Json<UpdatePostStatus>,
) -> Result<ResponseJson<ApiResponse<Post>>, ApiError> {
    let post = Post::update_status(&state.db().pool, post_id, &user_id, payload.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("post not found".to_string()))?;
    info!(post_id = %post_id, status = %post.status, "Updated post status");
    Ok(ResponseJson(ApiResponse::success(post)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/facts/{fact_id}/generate", post(generate_post))
        .route("/users/{user_id}/posts", get(list_posts).post(save_post))
        .route("/users/{user_id}/posts/{post_id}", patch(update_post_status))
}
