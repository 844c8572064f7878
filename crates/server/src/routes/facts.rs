use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, patch},
};
use db::models::fact::{CreateFact, Fact, UpdateFact};
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// GET /api/users/{user_id}/facts
/// Newest first
pub async fn list_facts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<Fact>>>, ApiError> {
    let facts = Fact::find_by_user_id(&state.db().pool, &user_id).await?;
    Ok(ResponseJson(ApiResponse::success(facts)))
}

/// POST /api/users/{user_id}/facts
pub async fn create_fact(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    axum::Json(payload): axum::Json<CreateFact>,
) -> Result<ResponseJson<ApiResponse<Fact>>, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is required".to_string()));
    }

    let fact = Fact::create(&state.db().pool, Uuid::new_v4(), &user_id, &payload).await?;
    info!(user_id = %user_id, fact_id = %fact.id, "Created fact");
    Ok(ResponseJson(ApiResponse::success(fact)))
}

/// PATCH /api/users/{user_id}/facts/{fact_id}
pub async fn update_fact(
    State(state): State<AppState>,
    Path((user_id, fact_id)): Path<(String, Uuid)>,
    axum::Json(payload): axum::Json<UpdateFact>,
) -> Result<ResponseJson<ApiResponse<Fact>>, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is required".to_string()));
    }

    let fact = Fact::update(&state.db().pool, fact_id, &user_id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("fact not found".to_string()))?;
    info!(user_id = %user_id, fact_id = %fact.id, "Updated fact");
    Ok(ResponseJson(ApiResponse::success(fact)))
}

/// DELETE /api/users/{user_id}/facts/{fact_id}
pub async fn delete_fact(
    State(state): State<AppState>,
    Path((user_id, fact_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Fact::delete(&state.db().pool, fact_id, &user_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("fact not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/facts", get(list_facts).post(create_fact))
        .route(
            "/users/{user_id}/facts/{fact_id}",
            patch(update_fact).delete(delete_fact),
        )
}
