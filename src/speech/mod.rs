//! Speech synthesis and narration.
//!
//! * [`SpeechSynthesizer`] — text → WAV bytes.
//! * [`VoicevoxSynthesizer`] — VOICEVOX engine backend.
//! * [`Narrator`] — synthesizes, stores the WAV and cues it on the device.

pub mod narrator;
pub mod voicevox;

use async_trait::async_trait;
use thiserror::Error;

pub use narrator::Narrator;
pub use voicevox::VoicevoxSynthesizer;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech request failed: {0}")]
    Request(String),

    #[error("speech request timed out")]
    Timeout,

    #[error("speech engine returned status {0}")]
    Status(u16),

    #[error("speech engine returned no audio")]
    EmptyAudio,
}

impl From<reqwest::Error> for SpeechError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SpeechError::Timeout
        } else {
            SpeechError::Request(e.to_string())
        }
    }
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`, returning a complete WAV file.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}
