pub mod content_validator;
pub mod openai_api;
pub mod post_generation;
pub mod post_generator;
pub mod prompt_builder;
pub mod regenerate_prompt;
pub mod text_generation;

#[cfg(test)]
pub(crate) mod testing;
