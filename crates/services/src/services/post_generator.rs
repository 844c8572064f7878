//! Generate, validate and, when needed, regenerate a post draft.
//!
//! One initial call plus at most [`MAX_REGENERATIONS`] corrective calls, run
//! strictly in sequence. The last draft is returned whether or not it passed;
//! only a failing client call aborts the run.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{
    content_validator::{ValidationResult, validate},
    prompt_builder::{GenerationInput, build_prompt},
    regenerate_prompt::build_regenerate_prompt,
    text_generation::{GenerationServiceError, TextGenerationClient},
};

pub const MAX_REGENERATIONS: usize = 2;

/// One round: the draft the service returned and how it fared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationAttempt {
    /// 0 for the initial call, 1.. for regenerations.
    pub index: usize,
    pub text: String,
    pub validation: ValidationResult,
}

/// Every attempt of a run, in order. Never empty.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    earlier: Vec<GenerationAttempt>,
    last: GenerationAttempt,
}

impl GenerationOutcome {
    pub fn attempts(&self) -> impl Iterator<Item = &GenerationAttempt> {
        self.earlier.iter().chain(std::iter::once(&self.last))
    }

    pub fn final_attempt(&self) -> &GenerationAttempt {
        &self.last
    }

    pub fn text(&self) -> &str {
        &self.last.text
    }

    /// Whether the returned draft satisfies every rule.
    pub fn passed(&self) -> bool {
        self.last.validation.passed()
    }

    /// Number of calls made to the generation service.
    pub fn call_count(&self) -> usize {
        self.earlier.len() + 1
    }

    pub fn into_text(self) -> String {
        self.last.text
    }
}

enum State {
    Initial,
    Validating { index: usize, text: String },
    Regenerating { index: usize, prompt: String },
    Done(GenerationAttempt),
}

/// Runs the loop and returns the final draft.
pub async fn generate<C>(input: &GenerationInput, client: &C) -> Result<String, GenerationServiceError>
where
    C: TextGenerationClient + ?Sized,
{
    Ok(generate_with_history(input, client).await?.into_text())
}

/// Runs the loop and keeps every attempt.
pub async fn generate_with_history<C>(
    input: &GenerationInput,
    client: &C,
) -> Result<GenerationOutcome, GenerationServiceError>
where
    C: TextGenerationClient + ?Sized,
{
    let mut earlier = Vec::new();
    let mut state = State::Initial;

    let last = loop {
        state = match state {
            State::Initial => {
                let prompt = build_prompt(input);
                debug!(prompt = %prompt, "Built generation prompt");
                let text = client.complete(&prompt).await?;
                State::Validating { index: 0, text }
            }
            State::Regenerating { index, prompt } => {
                debug!(attempt = index, prompt = %prompt, "Built regeneration prompt");
                let text = client.complete(&prompt).await?;
                State::Validating { index, text }
            }
            State::Validating { index, text } => {
                let validation = validate(&text);
                debug!(attempt = index, text = %text, "Generated draft");

                let next = if validation.passed() {
                    info!(attempt = index, "Draft passed validation");
                    None
                } else if index >= MAX_REGENERATIONS {
                    warn!(
                        attempt = index,
                        errors = ?validation.errors,
                        "Regeneration budget exhausted, returning last draft"
                    );
                    None
                } else {
                    info!(
                        attempt = index,
                        errors = ?validation.errors,
                        "Draft failed validation, regenerating"
                    );
                    Some(build_regenerate_prompt(&text, &validation.suggestions))
                };

                let attempt = GenerationAttempt {
                    index,
                    text,
                    validation,
                };
                match next {
                    Some(prompt) => {
                        earlier.push(attempt);
                        State::Regenerating {
                            index: index + 1,
                            prompt,
                        }
                    }
                    None => State::Done(attempt),
                }
            }
            State::Done(attempt) => break attempt,
        };
    };

    Ok(GenerationOutcome { earlier, last })
}
