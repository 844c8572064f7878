use axum::{Router, response::Json as ResponseJson, routing::get};
use tower_http::trace::TraceLayer;
use utils::response::ApiResponse;

use crate::AppState;

pub mod facts;
pub mod posts;
pub mod user_settings;

pub async fn health() -> ResponseJson<ApiResponse<&'static str>> {
    ResponseJson(ApiResponse::success("ok"))
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(user_settings::router())
        .merge(facts::router())
        .merge(posts::router());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
