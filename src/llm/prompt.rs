//! Prompt builder for the tutoring requests.
//!
//! [`PromptBuilder`] produces `(system_msg, user_msg)` pairs for the four
//! language-model calls.  Every explanation is written in the voice of the
//! "younger sister" tutor persona, addressing the learner as お兄ちゃん.

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

/// Used for the two vision calls (structuring and snapshot analysis).
const SYSTEM_INSTRUCTION_ANALYST: &str = "\
あなたは数学の宿題を読み取るアシスタントです。
画像と抽出テキストから問題を正確に読み取り、指示された形式だけで答えてください。";

/// Used for the two explanation calls.
const SYSTEM_INSTRUCTION_TUTOR: &str = "\
あなたは妹キャラの家庭教師です。
ルール:
1. 妹口調で親しみやすく話す
2. ユーザーを「お兄ちゃん」と呼ぶ
3. ステップバイステップで丁寧に説明する
4. 途中式も含める
5. 励ましの言葉を忘れない";

// ---------------------------------------------------------------------------
// Task templates
// ---------------------------------------------------------------------------

const STRUCTURE_TEMPLATE: &str = "\
この画像と抽出されたテキストから、数学の問題を正確に理解して構造化してください。

抽出テキスト:
{text}

以下の形式でJSONで返してください:
{
    \"problems\": [
        {
            \"problem_number\": \"問題番号\",
            \"problem_text\": \"問題文\",
            \"problem_type\": \"問題の種類\",
            \"difficulty\": \"難易度\"
        }
    ]
}";

const EXPLAIN_TEMPLATE: &str = "\
以下の数学問題について、分かりやすく解説を作成してください。

問題情報:
{problems}

解説形式 (段落ごとに空行で区切ること):
ステップ1: 問題の確認
ステップ2: 解法の説明
ステップ3: 計算過程
ステップ4: 答えの確認
ステップ5: まとめ";

const SNAPSHOT_TEMPLATE: &str = "\
この画像の「Pkaisetu」と書かれた付近にある数学の問題を特定してください。
生徒の途中式や答えが書かれていれば、その正しさも評価してください。

日本語で次の項目を答えてください:
1. 特定した問題
2. 生徒の解答 (あれば)
3. 正誤の評価
4. 詳細な解説が必要な点 (必要なら「詳細解説が必要」と明記)";

const DETAIL_TEMPLATE: &str = "\
次の分析をもとに、詳しい解説を作成してください。

{analysis}

要求:
- 生徒の解答が部分的に正しければ、正しい部分をほめる
- 間違えている箇所を指摘する
- 一歩ずつ導く";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the chat messages for each tutoring request.
///
/// # Example
/// ```rust
/// use vr_sensei::llm::PromptBuilder;
///
/// let (system, user) = PromptBuilder::new().explain("{\"problems\": []}");
/// assert!(system.contains("お兄ちゃん"));
/// assert!(user.contains("{\"problems\": []}"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Structuring request for a homework artifact's extracted text.
    pub fn structure(&self, text: &str) -> (String, String) {
        let text = if text.trim().is_empty() {
            "(テキストを抽出できませんでした。画像から読み取ってください)"
        } else {
            text
        };
        (
            SYSTEM_INSTRUCTION_ANALYST.to_string(),
            STRUCTURE_TEMPLATE.replace("{text}", text),
        )
    }

    /// Explanation request for the structured problems.
    pub fn explain(&self, problems: &str) -> (String, String) {
        (
            SYSTEM_INSTRUCTION_TUTOR.to_string(),
            EXPLAIN_TEMPLATE.replace("{problems}", problems),
        )
    }

    /// Vision request for a Pkaisetu snapshot.
    pub fn snapshot(&self) -> (String, String) {
        (
            SYSTEM_INSTRUCTION_ANALYST.to_string(),
            SNAPSHOT_TEMPLATE.to_string(),
        )
    }

    /// Detailed explanation built on a snapshot analysis.
    pub fn detail(&self, analysis: &str) -> (String, String) {
        (
            SYSTEM_INSTRUCTION_TUTOR.to_string(),
            DETAIL_TEMPLATE.replace("{analysis}", analysis),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_prompt_embeds_text_and_schema() {
        let (system, user) = PromptBuilder::new().structure("x^2 - 4 = 0 を解け");

        assert!(system.contains("数学"));
        assert!(user.contains("x^2 - 4 = 0 を解け"));
        assert!(user.contains("\"problems\""), "user msg must carry the JSON schema");
    }

    #[test]
    fn empty_extraction_asks_for_image_reading() {
        let (_, user) = PromptBuilder::new().structure("   ");
        assert!(user.contains("画像から読み取って"));
    }

    #[test]
    fn explanation_prompts_use_tutor_persona() {
        let builder = PromptBuilder::new();
        let (explain_system, explain_user) = builder.explain("問題A");
        let (detail_system, detail_user) = builder.detail("分析B");

        assert!(explain_system.contains("お兄ちゃん"));
        assert_eq!(explain_system, detail_system);
        assert!(explain_user.contains("問題A"));
        assert!(explain_user.contains("空行"));
        assert!(detail_user.contains("分析B"));
    }

    #[test]
    fn snapshot_prompt_names_the_detail_marker() {
        let (_, user) = PromptBuilder::new().snapshot();
        assert!(user.contains("Pkaisetu"));
        assert!(user.contains("詳細解説が必要"));
    }
}
