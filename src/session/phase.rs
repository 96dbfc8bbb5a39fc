//! Session phase state machine.
//!
//! ```text
//! Waiting ──try_enter_processing──▶ Processing
//!          ──pipeline ok──────────▶ TeachingReady
//!          ──trigger / restart────▶ Teaching ──restart──▶ Teaching
//!          ──playback finished────▶ Waiting
//! any phase ──reset (stop)──▶ Waiting
//! Processing ──pipeline failed──▶ Waiting
//! ```

/// The session's current stage.  Exactly one value holds at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No homework in flight; new submissions are admitted.
    #[default]
    Waiting,
    /// One homework job is running through the pipeline.
    Processing,
    /// A lesson is prepared and waits for the teaching trigger.
    TeachingReady,
    /// Slides are being presented.
    Teaching,
}

impl SessionPhase {
    /// Returns `true` while a new homework submission would be rejected.
    ///
    /// ```
    /// use vr_sensei::session::SessionPhase;
    ///
    /// assert!(!SessionPhase::Waiting.is_busy());
    /// assert!(SessionPhase::Processing.is_busy());
    /// assert!(SessionPhase::TeachingReady.is_busy());
    /// assert!(SessionPhase::Teaching.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        !matches!(self, SessionPhase::Waiting)
    }

    /// Whether playback may (re)start from this phase.
    pub fn can_teach(&self) -> bool {
        matches!(self, SessionPhase::TeachingReady | SessionPhase::Teaching)
    }

    /// A short human-readable label for status lines.
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Waiting => "Waiting",
            SessionPhase::Processing => "Processing",
            SessionPhase::TeachingReady => "Ready to teach",
            SessionPhase::Teaching => "Teaching",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            SessionPhase::Waiting => 0,
            SessionPhase::Processing => 1,
            SessionPhase::TeachingReady => 2,
            SessionPhase::Teaching => 3,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SessionPhase::Processing,
            2 => SessionPhase::TeachingReady,
            3 => SessionPhase::Teaching,
            _ => SessionPhase::Waiting,
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phase_is_waiting() {
        assert_eq!(SessionPhase::default(), SessionPhase::Waiting);
    }

    #[test]
    fn only_ready_and_teaching_can_teach() {
        assert!(!SessionPhase::Waiting.can_teach());
        assert!(!SessionPhase::Processing.can_teach());
        assert!(SessionPhase::TeachingReady.can_teach());
        assert!(SessionPhase::Teaching.can_teach());
    }

    #[test]
    fn unknown_raw_value_reads_as_waiting() {
        assert_eq!(SessionPhase::from_u8(200), SessionPhase::Waiting);
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(SessionPhase::TeachingReady.to_string(), "Ready to teach");
    }
}
