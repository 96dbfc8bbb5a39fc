//! Text heuristics used to lay out the slide deck.

use std::sync::OnceLock;

use regex::Regex;

/// Upper bound on step slides per deck.
pub const MAX_STEPS: usize = 5;

/// A line containing any of these is a step line.
pub const STEP_MARKERS: &[&str] = &["ステップ", "Step", "手順", "①", "②", "③", "④", "⑤"];

/// Used when the explanation has no step lines.
pub const DEFAULT_STEPS: [&str; MAX_STEPS] = [
    "問題を確認しよう",
    "解法を考えよう",
    "計算を実行しよう",
    "答えを確認しよう",
    "まとめよう",
];

/// Presence of any of these adds a graph slide.
pub const MATH_KEYWORDS: &[&str] = &["方程式", "関数", "グラフ", "x²", "x^2", "微分", "積分", "三角関数"];

/// Step lines of `explanation`, in order, at most [`MAX_STEPS`].
///
/// ```
/// use vr_sensei::pipeline::steps::extract_steps;
///
/// let steps = extract_steps("ステップ1: 式を整理\n計算する\n手順2: 解く");
/// assert_eq!(steps, ["ステップ1: 式を整理", "手順2: 解く"]);
/// ```
pub fn extract_steps(explanation: &str) -> Vec<String> {
    let steps: Vec<String> = explanation
        .lines()
        .filter(|line| STEP_MARKERS.iter().any(|m| line.contains(m)))
        .map(|line| line.trim().to_string())
        .take(MAX_STEPS)
        .collect();

    if steps.is_empty() {
        return DEFAULT_STEPS.iter().map(|s| s.to_string()).collect();
    }
    steps
}

pub fn mentions_math(explanation: &str) -> bool {
    MATH_KEYWORDS.iter().any(|k| explanation.contains(k))
}

fn equation_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[0-9xyz²³^+\-*/(). ]*[0-9xyz²³)]\s*=\s*[0-9xyz(\-][0-9xyz²³^+\-*/(). ]*").ok()
    })
    .as_ref()
}

/// First equation over `x`, `y` or `z` in `text`, e.g. `x² - 5x + 6 = 0`.
pub fn find_equation(text: &str) -> Option<String> {
    equation_regex()?
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .find(|eq| eq.contains(['x', 'y', 'z']))
}
