use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::post_generation::PostGenerationError;
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    PostGeneration(#[from] PostGenerationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::PostGeneration(err) => match err {
                PostGenerationError::FactNotFound | PostGenerationError::SettingsNotFound => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                PostGenerationError::MissingFields(_) | PostGenerationError::InvalidPostCount => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                PostGenerationError::VersionConflict => (StatusCode::CONFLICT, err.to_string()),
                // Upstream details stay in the logs.
                PostGenerationError::Generation(_) => {
                    (StatusCode::BAD_GATEWAY, "post generation failed".to_string())
                }
                PostGenerationError::Database(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database error".to_string(),
                ),
            },
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database error".to_string(),
            ),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(ApiResponse::<()>::error(&message))).into_response()
    }
}
