//! VOICEVOX engine client.
//!
//! Synthesis is two requests:
//!
//! ```text
//! POST {base}/audio_query?text=…&speaker=N   → query JSON
//! POST {base}/synthesis?speaker=N  (query)   → audio/wav
//! ```

use async_trait::async_trait;

use super::{SpeechError, SpeechSynthesizer};
use crate::config::SpeechConfig;

pub struct VoicevoxSynthesizer {
    client: reqwest::Client,
    base_url: String,
    speaker_id: u32,
}

impl VoicevoxSynthesizer {
    pub fn from_config(config: &SpeechConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            speaker_id: config.speaker_id,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }
}

#[async_trait]
impl SpeechSynthesizer for VoicevoxSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let speaker = self.speaker_id.to_string();

        let response = self
            .client
            .post(self.url("audio_query"))
            .query(&[("text", text), ("speaker", speaker.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SpeechError::Status(response.status().as_u16()));
        }
        let query: serde_json::Value = response.json().await?;

        let response = self
            .client
            .post(self.url("synthesis"))
            .query(&[("speaker", speaker.as_str())])
            .json(&query)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SpeechError::Status(response.status().as_u16()));
        }

        let wav = response.bytes().await?;
        if wav.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        Ok(wav.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slash() {
        let config = SpeechConfig {
            base_url: "http://localhost:50021/".into(),
            ..SpeechConfig::default()
        };
        let synth = VoicevoxSynthesizer::from_config(&config);
        assert_eq!(synth.url("audio_query"), "http://localhost:50021/audio_query");
        assert_eq!(synth.speaker_id, 58);
    }

    #[tokio::test]
    async fn unreachable_engine_is_a_request_error() {
        let config = SpeechConfig {
            // Port 9 (discard) is closed on test hosts.
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            ..SpeechConfig::default()
        };
        let synth = VoicevoxSynthesizer::from_config(&config);
        assert!(synth.synthesize("テスト").await.is_err());
    }
}
