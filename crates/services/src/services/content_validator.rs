//! Hard constraints every generated post is checked against.
//!
//! Length is counted in UTF-16 code units, the unit the browser-side counter
//! reports, so the number shown to the user and the number checked here agree.
//! For the Japanese text this service produces it equals the code point count.

use serde::{Deserialize, Serialize};

/// Window the prompt asks the model to hit.
pub const TARGET_MIN_CHARS: usize = 120;
pub const TARGET_MAX_CHARS: usize = 140;
/// Window actually enforced. Looser on the low end than the advertised target.
pub const ACCEPTED_MIN_CHARS: usize = 100;
pub const ACCEPTED_MAX_CHARS: usize = TARGET_MAX_CHARS;
pub const MAX_HASHTAGS: usize = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    /// One per error, fed back to the model on regeneration.
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    fn reject(&mut self, error: String, suggestion: String) {
        self.errors.push(error);
        self.suggestions.push(suggestion);
    }
}

/// Length as the user-facing counter shows it.
pub fn display_length(text: &str) -> usize {
    text.encode_utf16().count()
}

pub fn hashtag_count(text: &str) -> usize {
    text.matches('#').count()
}

/// Runs every rule, in order: length, then hashtags.
pub fn validate(text: &str) -> ValidationResult {
    let mut result = ValidationResult::default();

    let length = display_length(text);
    if !(ACCEPTED_MIN_CHARS..=ACCEPTED_MAX_CHARS).contains(&length) {
        result.reject(
            format!("文字数が不正です。現在の文字数: {length}"),
            format!(
                "この投稿内容の文字数は{length}です。文字数が必ず全角{TARGET_MIN_CHARS}~{TARGET_MAX_CHARS}文字になるよう文章量を調整してください"
            ),
        );
    }

    let hashtags = hashtag_count(text);
    if hashtags > MAX_HASHTAGS {
        result.reject(
            format!("タグは最大{MAX_HASHTAGS}つにしてください。現在のタグ数: {hashtags}"),
            format!("ハッシュタグの数を{MAX_HASHTAGS}つに修正してください"),
        );
    }

    result
}
