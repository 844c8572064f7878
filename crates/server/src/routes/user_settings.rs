use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::user_setting::{UpsertUserSetting, UserSetting};
use tracing::info;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// GET /api/users/{user_id}/settings
pub async fn get_settings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<UserSetting>>, ApiError> {
    let setting = UserSetting::find_by_user_id(&state.db().pool, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user settings not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(setting)))
}

/// PUT /api/users/{user_id}/settings
/// Create or replace the user's marketing profile
pub async fn upsert_settings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    axum::Json(payload): axum::Json<UpsertUserSetting>,
) -> Result<ResponseJson<ApiResponse<UserSetting>>, ApiError> {
    let missing = payload.missing_fields();
    if !missing.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    let setting = UserSetting::upsert(&state.db().pool, &user_id, &payload).await?;
    info!(user_id = %user_id, "Saved user settings");
    Ok(ResponseJson(ApiResponse::success(setting)))
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/users/{user_id}/settings",
        get(get_settings).put(upsert_settings),
    )
}
