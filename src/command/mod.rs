//! Handwritten playback commands.
//!
//! [`CommandRecognizer`] maps recognized frame text to a [`Command`].  The
//! set is closed: dispatch sites match exhaustively, so adding a variant is
//! a compile error everywhere it is not handled.

pub mod recognizer;

pub use recognizer::{CommandRecognizer, COMMAND_TOKENS};

/// Playback commands the learner can write in front of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Replay the lesson from the first slide.
    Restart,
    Skip,
    Repeat,
    Faster,
    Slower,
    /// Abort whatever the session is doing and return to `Waiting`.
    Stop,
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::Restart => "restart",
            Command::Skip => "skip",
            Command::Repeat => "repeat",
            Command::Faster => "faster",
            Command::Slower => "slower",
            Command::Stop => "stop",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
