//! Builds the initial generation prompt from a user's marketing profile and a fact.

use serde::{Deserialize, Serialize};

use super::content_validator::{MAX_HASHTAGS, TARGET_MAX_CHARS, TARGET_MIN_CHARS};

/// Placeholder written in place of the tag list when a fact has no tags.
pub const NO_TAGS_PLACEHOLDER: &str = "なし";

/// Everything the prompt needs for one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationInput {
    pub activity_type: String,
    pub activity_detail: String,
    pub goal: String,
    pub target_audience: String,
    pub preferred_tone: String,
    pub post_idea: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_post_count")]
    pub post_count: u32,
}

fn default_post_count() -> u32 {
    GenerationInput::DEFAULT_POST_COUNT
}

impl GenerationInput {
    pub const DEFAULT_POST_COUNT: u32 = 1;

    /// Required fields that are blank. Checked by callers, never by [`build_prompt`].
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        [
            ("activity_type", &self.activity_type),
            ("goal", &self.goal),
            ("post_idea", &self.post_idea),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Writing tone a user can pick in their settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Casual,
    Professional,
    Humorous,
}

impl Tone {
    /// Exact match on the stored preference; both the keys and the form labels are accepted.
    pub fn from_preference(value: &str) -> Option<Self> {
        match value {
            "casual" | "カジュアル" => Some(Self::Casual),
            "professional" | "プロフェッショナル" => Some(Self::Professional),
            "humorous" | "ユーモアあり" => Some(Self::Humorous),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Casual => "カジュアル",
            Self::Professional => "プロフェッショナル",
            Self::Humorous => "ユーモア",
        }
    }

    pub fn directive(self) -> &'static str {
        match self {
            Self::Casual => "親しみやすい語り口にする。ただしフランクすぎる表現や絵文字の多用はしない",
            Self::Professional => "誠実・簡潔な説明にする",
            Self::Humorous => "軽快で、くすっと笑える表現にする。ただし情報の核心は必ず含める",
        }
    }
}

pub fn build_prompt(input: &GenerationInput) -> String {
    let tags = if input.tags.is_empty() {
        NO_TAGS_PLACEHOLDER.to_string()
    } else {
        input.tags.join(", ")
    };

    let mut prompt = format!(
        r#"あなたは日本語X向け投稿を専門とするSNSライターです。SNSマーケティングで効果的な投稿を作成するのが責務です。

以下の情報をもとに、{count}件のSNSマーケティングを考慮した戦略的で効果的な投稿を作成してください。
この投稿は「{detail}」に取り組む「{activity}」が得た経験・気づき「{idea}」をもとにしています。
投稿の目的は「{goal}」です。
ターゲットとなる読者は「{audience}」です。

【投稿文作成の絶対条件（厳守）】
- 投稿1件で得られる情報密度が高くなるよう、必ず全角{min}~{max}文字の投稿を作成すること
- ハッシュタグは最大{hashtags}つまでとすること
- 投稿本文に「以下の分類タグ」は絶対に含めない：{tags}
- 投稿1件につき本文のみをプレーンテキストで出力すること（タイトルは不要）
- 書き出しは毎回変えること
- 抽象的な内容や、テンプレ的な構成、低密度な文章は禁止
- 投稿者の立場や想定読者の説明は不要

【評価基準（Output Check）】
- 上記条件のうち1つでも違反していれば出力は不合格。"#,
        count = input.post_count,
        detail = input.activity_detail,
        activity = input.activity_type,
        idea = input.post_idea,
        goal = input.goal,
        audience = input.target_audience,
        min = TARGET_MIN_CHARS,
        max = TARGET_MAX_CHARS,
        hashtags = MAX_HASHTAGS,
        tags = tags,
    );

    if let Some(tone) = Tone::from_preference(&input.preferred_tone) {
        prompt.push_str(&format!(
            "\n\n【トーン指定：{}】\n- {}",
            tone.label(),
            tone.directive()
        ));
    }

    prompt
}
