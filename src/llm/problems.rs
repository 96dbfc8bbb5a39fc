//! Typed view of the structuring response.

use serde::{Deserialize, Serialize};

/// One homework problem as structured by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Problem {
    pub problem_number: String,
    pub problem_text: String,
    pub problem_type: String,
    pub difficulty: String,
}

/// `{"problems": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemSet {
    pub problems: Vec<Problem>,
}

impl ProblemSet {
    /// Parse the JSON object embedded in a model answer.
    ///
    /// Models wrap the object in code fences or prose, so the text between the
    /// first `{` and the last `}` is parsed.  `None` when there is no such
    /// object or it does not match the schema.
    ///
    /// ```
    /// use vr_sensei::llm::ProblemSet;
    ///
    /// let raw = "```json\n{\"problems\": [{\"problem_text\": \"2x = 6\"}]}\n```";
    /// let set = ProblemSet::parse(raw).unwrap();
    /// assert_eq!(set.first_problem_text(), Some("2x = 6"));
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        if end < start {
            return None;
        }
        serde_json::from_str(&raw[start..=end]).ok()
    }

    pub fn first_problem_text(&self) -> Option<&str> {
        self.problems
            .iter()
            .map(|p| p.problem_text.trim())
            .find(|t| !t.is_empty())
    }
}
