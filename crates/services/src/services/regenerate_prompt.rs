/// Corrective prompt asking the model to fix only the cited issues in `previous_text`.
pub fn build_regenerate_prompt(previous_text: &str, suggestions: &[String]) -> String {
    let instruction = if suggestions.is_empty() {
        "以下の文章を修正してください。".to_string()
    } else {
        format!(
            "以下の文章を、次の指摘に沿って修正してください：{}",
            suggestions.join(", ")
        )
    };

    format!(
        r#"{instruction}

{previous_text}

【条件】
- 文章の内容とトーンは踏襲し、指摘された点のみを修正すること
- 本文のみをプレーンテキストで出力し、余計な文章は付け加えないこと
  例：
  - 文字数の説明
  - 修正の説明
  - タイトル"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embeds_previous_text_and_suggestions_verbatim() {
        let suggestions = vec![
            "この投稿内容の文字数は90です。".to_string(),
            "ハッシュタグの数を1つに修正してください".to_string(),
        ];
        let prompt = build_regenerate_prompt("前回の投稿 #a #b", &suggestions);

        assert!(prompt.contains("前回の投稿 #a #b"));
        assert!(prompt.contains(
            "この投稿内容の文字数は90です。, ハッシュタグの数を1つに修正してください"
        ));
        assert!(prompt.contains("踏襲"));
        assert!(prompt.contains("タイトル"));
    }

    #[test]
    fn test_empty_suggestions_still_well_formed() {
        let prompt = build_regenerate_prompt("本文", &[]);
        assert!(prompt.starts_with("以下の文章を修正してください。"));
        assert!(prompt.contains("本文"));
        assert!(prompt.contains("【条件】"));
    }

    #[test]
    fn test_deterministic() {
        let suggestions = vec!["短くしてください".to_string()];
        assert_eq!(
            build_regenerate_prompt("text", &suggestions),
            build_regenerate_prompt("text", &suggestions)
        );
    }
}
