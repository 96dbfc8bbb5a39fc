//! Token-table command matching.

use super::Command;

/// Fixed token table, in match priority order.
pub const COMMAND_TOKENS: &[(&str, Command)] = &[
    ("restart", Command::Restart),
    ("skip", Command::Skip),
    ("repeat", Command::Repeat),
    ("faster", Command::Faster),
    ("slower", Command::Slower),
    ("stop", Command::Stop),
];

/// Case-insensitive substring matcher over [`COMMAND_TOKENS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRecognizer;

impl CommandRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// First table entry whose token occurs in `text`.
    ///
    /// ```
    /// use vr_sensei::command::{Command, CommandRecognizer};
    ///
    /// let rec = CommandRecognizer::new();
    /// assert_eq!(rec.match_text("please STOP now"), Some(Command::Stop));
    /// assert_eq!(rec.match_text("おしえて"), None);
    /// ```
    pub fn match_text(&self, text: &str) -> Option<Command> {
        if text.is_empty() {
            return None;
        }
        let lowered = text.to_lowercase();
        COMMAND_TOKENS
            .iter()
            .find(|(token, _)| lowered.contains(token))
            .map(|(_, command)| *command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_ignores_case() {
        let rec = CommandRecognizer::new();
        assert_eq!(rec.match_text("ReStArT"), Some(Command::Restart));
        assert_eq!(rec.match_text("go Faster!"), Some(Command::Faster));
    }

    #[test]
    fn table_order_wins_over_text_order() {
        let rec = CommandRecognizer::new();
        // "stop" appears first in the text but "skip" precedes it in the table.
        assert_eq!(rec.match_text("stop, no wait, skip"), Some(Command::Skip));
    }

    #[test]
    fn substring_inside_a_word_matches() {
        let rec = CommandRecognizer::new();
        assert_eq!(rec.match_text("nonstop"), Some(Command::Stop));
    }

    #[test]
    fn empty_or_unrelated_text_matches_nothing() {
        let rec = CommandRecognizer::new();
        assert_eq!(rec.match_text(""), None);
        assert_eq!(rec.match_text("x² - 5x + 6 = 0"), None);
    }
}
