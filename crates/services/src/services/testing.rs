//! Test doubles for the generation service.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;

use super::text_generation::{GenerationServiceError, TextGenerationClient};

/// Replays canned responses in order and records every prompt it receives.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, GenerationServiceError>>>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<String, GenerationServiceError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answers every prompt with the same text.
    pub fn repeating(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Self::new(Vec::new())
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerationClient for ScriptedClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationServiceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.responses.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(response), _) => response,
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(GenerationServiceError::new(None, "script exhausted")),
        }
    }
}
