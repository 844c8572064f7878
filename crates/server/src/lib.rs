use std::sync::Arc;

use db::DBService;
use services::services::{
    post_generation::PostGenerationService, text_generation::TextGenerationClient,
};

pub mod config;
pub mod error;
pub mod routes;

/// Shared handles every route needs.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    generator: PostGenerationService,
}

impl AppState {
    pub fn new(db: DBService, client: Arc<dyn TextGenerationClient>) -> Self {
        let generator = PostGenerationService::new(db.pool.clone(), client);
        Self { db, generator }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn generator(&self) -> &PostGenerationService {
        &self.generator
    }
}
