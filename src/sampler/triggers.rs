//! Phrase triggers over recognized frame text.

/// Fires when the text contains any of its phrases (case-insensitive).
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    phrases: Vec<String>,
}

impl TriggerDetector {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Self {
        Self {
            phrases: phrases
                .iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// `lowered` must already be lowercase.
    pub fn matches_lowered(&self, lowered: &str) -> bool {
        self.phrases.iter().any(|p| lowered.contains(p.as_str()))
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matches_lowered(&text.to_lowercase())
    }
}
