//! Text → voice file → device cue.

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use super::SpeechSynthesizer;
use crate::transport::DeviceLink;

/// Narration for the tutoring flows.
///
/// Each line is synthesized, stored as `voice_<uuid>.wav` in `audio_dir`
/// and announced to the device by path.  Failures are logged and reported
/// as `false`; narration never aborts a flow.
pub struct Narrator {
    speech: Arc<dyn SpeechSynthesizer>,
    link: DeviceLink,
    audio_dir: PathBuf,
}

impl Narrator {
    pub fn new(speech: Arc<dyn SpeechSynthesizer>, link: DeviceLink, audio_dir: PathBuf) -> Self {
        Self {
            speech,
            link,
            audio_dir,
        }
    }

    /// Speak `text`; returns whether the audio cue was sent.
    pub async fn speak(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        let wav = match self.speech.synthesize(text).await {
            Ok(wav) => wav,
            Err(e) => {
                log::warn!("speech: synthesis failed: {e}");
                return false;
            }
        };

        let path = self.audio_dir.join(format!("voice_{}.wav", Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&path, &wav).await {
            log::warn!("speech: cannot store {}: {e}", path.display());
            return false;
        }

        match self.link.cue_audio(&path.to_string_lossy()).await {
            Ok(()) => {
                log::debug!("speech: cued {} ({} bytes)", path.display(), wav.len());
                true
            }
            Err(e) => {
                log::warn!("speech: audio cue failed: {e}");
                false
            }
        }
    }
}
