//! OpenAI chat completions client backing post generation.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::text_generation::{GenerationServiceError, TextGenerationClient};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Error)]
pub enum OpenAiApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("missing api key: OPENAI_API_KEY environment variable not set")]
    MissingApiKey,
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

impl OpenAiApiError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }

    fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            Self::InvalidApiKey => Some(StatusCode::UNAUTHORIZED.as_u16()),
            _ => None,
        }
    }
}

impl From<OpenAiApiError> for GenerationServiceError {
    fn from(err: OpenAiApiError) -> Self {
        GenerationServiceError::new(err.status(), err.to_string())
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if the model produced any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
    }
}

/// Connection settings, usually read from the environment.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Reads `OPENAI_API_KEY`, and optionally `OPENAI_MODEL` and `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, OpenAiApiError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(OpenAiApiError::MissingApiKey)?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

/// OpenAI API client
#[derive(Debug, Clone)]
pub struct OpenAiApiClient {
    http: Client,
    api_key: SecretString,
    model: String,
    temperature: f32,
    completions_url: Url,
}

impl OpenAiApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// Create a new client from `OPENAI_*` environment variables
    pub fn from_env() -> Result<Self, OpenAiApiError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    pub fn new(config: OpenAiConfig) -> Result<Self, OpenAiApiError> {
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let completions_url = Url::parse(&base)
            .and_then(|base| base.join("chat/completions"))
            .map_err(|e| OpenAiApiError::InvalidBaseUrl(format!("{}: {}", config.base_url, e)))?;

        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("post-drafter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OpenAiApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key,
            model: config.model,
            temperature: config.temperature,
            completions_url,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat completion request, retrying transient failures
    pub async fn chat(&self, messages: Vec<Message>) -> Result<ChatCompletionResponse, OpenAiApiError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        (|| async { self.send_request(&request).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(1))
                    .with_max_delay(Duration::from_secs(30))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &OpenAiApiError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "OpenAI API call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    async fn send_request(
        &self,
        request: &ChatCompletionRequest<'_>,
    ) -> Result<ChatCompletionResponse, OpenAiApiError> {
        let res = self
            .http
            .post(self.completions_url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<ChatCompletionResponse>()
                .await
                .map_err(|e| OpenAiApiError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(OpenAiApiError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(OpenAiApiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(OpenAiApiError::Http { status, body })
            }
        }
    }

    /// Send a single user message and return the reply text.
    ///
    /// A reply without content yields an empty string; judging it is the caller's job.
    /// Surrounding whitespace is trimmed so it never counts toward a draft's length.
    pub async fn ask(&self, prompt: &str) -> Result<String, OpenAiApiError> {
        let response = self.chat(vec![Message::user(prompt)]).await?;

        debug!(
            model = response.model.as_deref().unwrap_or(&self.model),
            finish_reason = response.finish_reason().unwrap_or("unknown"),
            prompt_tokens = response.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens = response.usage.as_ref().map(|u| u.completion_tokens),
            "OpenAI completion received"
        );

        Ok(response.text().unwrap_or_default().trim().to_string())
    }
}

#[async_trait]
impl TextGenerationClient for OpenAiApiClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationServiceError> {
        Ok(self.ask(prompt).await?)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> OpenAiApiError {
    if e.is_timeout() {
        OpenAiApiError::Timeout
    } else {
        OpenAiApiError::Transport(e.to_string())
    }
}
