//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Defaults mirror the classroom deployment: a headset on the local network,
//! LM Studio and VOICEVOX on the tutoring PC.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// DeviceConfig
// ---------------------------------------------------------------------------

/// Remote wearable display endpoint.
///
/// Slides go to `base_port`; narration cues go to `base_port + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Host name or IP address of the headset.
    pub host: String,
    /// Image channel port.  The control/audio channel is `base_port + 1`.
    pub base_port: u16,
    /// Starting JPEG quality for slide frames (1 – 100).
    pub jpeg_quality: u8,
    /// Largest payload placed in one datagram.
    pub max_datagram_bytes: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".into(),
            base_port: 12346,
            jpeg_quality: 90,
            max_datagram_bytes: 65_507,
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the OpenAI-compatible chat endpoint (LM Studio by default).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the API endpoint; `/v1/chat/completions` is appended.
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Multimodal model used when an image is attached.
    pub vision_model: String,
    /// Text-only model used for the narrated explanations.
    pub text_model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens per call.
    pub max_tokens: u32,
    /// Maximum seconds to wait for one completion.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".into(),
            api_key: None,
            vision_model: "gemma-3-12b-it".into(),
            text_model: "japanese-starling-chatv-7b".into(),
            temperature: 0.7,
            max_tokens: 2048,
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// VOICEVOX engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Base URL of the VOICEVOX engine.
    pub base_url: String,
    /// Speaker (voice) id.
    pub speaker_id: u32,
    /// Maximum seconds for each of the two synthesis requests.
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:50021".into(),
            speaker_id: 58,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// SamplerConfig
// ---------------------------------------------------------------------------

/// Camera sampling loop and trigger phrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Milliseconds between two captured frames.
    pub interval_ms: u64,
    /// Recognition calls slower than this count as "no text this tick".
    pub recognition_timeout_ms: u64,
    /// Handwritten phrases that start the lesson once it is ready.
    pub teaching_phrases: Vec<String>,
    /// Handwritten phrases that request a Pkaisetu deep explanation.
    pub interrupt_phrases: Vec<String>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            recognition_timeout_ms: 5_000,
            teaching_phrases: vec!["おしえて".into(), "教えて".into()],
            interrupt_phrases: vec!["pkaisetu".into(), "ピカイセツ".into()],
        }
    }
}

impl SamplerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_millis(self.recognition_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// TeachingConfig
// ---------------------------------------------------------------------------

/// Slide playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeachingConfig {
    /// Pause after each slide's narration before the next slide.
    pub slide_delay_ms: u64,
    /// Spoken once before the first slide.
    pub opening_line: String,
    /// Narration for slides that have no matching explanation segment.
    pub filler_line: String,
}

impl Default for TeachingConfig {
    fn default() -> Self {
        Self {
            slide_delay_ms: 3_000,
            opening_line: "お兄ちゃん、一緒に勉強しよう！".into(),
            filler_line: "次のステップに進むよ！".into(),
        }
    }
}

impl TeachingConfig {
    pub fn slide_delay(&self) -> Duration {
        Duration::from_millis(self.slide_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// InterruptConfig
// ---------------------------------------------------------------------------

/// Pkaisetu (deep re-explain) flow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptConfig {
    /// Minimum seconds between two admitted triggers.
    pub cooldown_secs: f64,
    /// Spoken immediately after a trigger is admitted.
    pub acknowledgement: String,
    /// Spoken when any stage of the flow fails.
    pub apology: String,
}

impl Default for InterruptConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 5.0,
            acknowledgement: "わかった！考えるからPkaisetuを消して待っててね～".into(),
            apology: "ごめんね、うまく認識できなかったよ".into(),
        }
    }
}

impl InterruptConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.cooldown_secs).unwrap_or(Duration::ZERO)
    }
}

// ---------------------------------------------------------------------------
// IngestConfig
// ---------------------------------------------------------------------------

/// Homework intake: inbox polling and artifact validation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Watch the inbox directory at all.
    pub enabled: bool,
    /// Override for the inbox directory; `None` uses [`AppPaths::inbox_dir`].
    pub inbox_dir: Option<PathBuf>,
    /// Milliseconds between two inbox scans.
    pub poll_interval_ms: u64,
    /// Artifacts larger than this are rejected.
    pub max_file_bytes: u64,
    /// Images wider than this are scaled down (aspect preserved).
    pub max_width: u32,
    /// Images taller than this are scaled down (aspect preserved).
    pub max_height: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            inbox_dir: None,
            poll_interval_ms: 1_000,
            max_file_bytes: 10 * 1024 * 1024,
            max_width: 1920,
            max_height: 1080,
        }
    }
}

// ---------------------------------------------------------------------------
// ToolsConfig
// ---------------------------------------------------------------------------

/// External programs backing OCR, PDF extraction, camera capture and slide
/// rendering.
///
/// Each command is an argv list; `{input}`, `{output}`, `{kind}` and
/// `{payload}` are substituted before spawning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Prints recognized text of `{input}` on stdout.
    pub ocr_command: Vec<String>,
    /// Prints the text layer of the PDF `{input}` on stdout.
    pub pdf_command: Vec<String>,
    /// Writes one camera frame as JPEG to `{output}`.
    pub camera_command: Vec<String>,
    /// Renders a slide of `{kind}` from the JSON `{payload}` into `{output}`.
    pub render_command: Vec<String>,
    /// A tool still running after this many seconds is killed.
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        let argv = |args: &[&str]| args.iter().map(|a| a.to_string()).collect::<Vec<_>>();
        Self {
            ocr_command: argv(&["tesseract", "{input}", "stdout", "-l", "jpn+eng"]),
            pdf_command: argv(&["pdftotext", "-layout", "{input}", "-"]),
            camera_command: argv(&[
                "ffmpeg", "-loglevel", "error", "-y", "-f", "v4l2", "-i", "/dev/video0",
                "-frames:v", "1", "{output}",
            ]),
            render_command: argv(&["python3", "render_slide.py", "{kind}", "{payload}", "{output}"]),
            timeout_secs: 60,
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use vr_sensei::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let mut config = AppConfig::load().unwrap();
/// config.apply_env_overrides();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Seconds to wait for in-flight flows on shutdown.
    pub shutdown_grace_secs: u64,
    pub device: DeviceConfig,
    pub llm: LlmConfig,
    pub speech: SpeechConfig,
    pub sampler: SamplerConfig,
    pub teaching: TeachingConfig,
    pub interrupt: InterruptConfig,
    pub ingest: IngestConfig,
    pub tools: ToolsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: 10,
            device: DeviceConfig::default(),
            llm: LlmConfig::default(),
            speech: SpeechConfig::default(),
            sampler: SamplerConfig::default(),
            teaching: TeachingConfig::default(),
            interrupt: InterruptConfig::default(),
            ingest: IngestConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `QUEST_IP`, `QUEST_PORT`, `LMSTUDIO_URL`, `VOICEVOX_URL` and
    /// `VOICEVOX_SPEAKER_ID` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup.  Unparseable numbers are
    /// logged and ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("QUEST_IP") {
            self.device.host = host;
        }
        if let Some(port) = lookup("QUEST_PORT") {
            match port.parse() {
                Ok(port) => self.device.base_port = port,
                Err(e) => log::warn!("config: ignoring QUEST_PORT={port:?}: {e}"),
            }
        }
        if let Some(url) = lookup("LMSTUDIO_URL") {
            // Accept the full completions URL as well as the bare base URL.
            let base = url
                .trim_end_matches('/')
                .trim_end_matches("/v1/chat/completions")
                .to_string();
            self.llm.base_url = base;
        }
        if let Some(url) = lookup("VOICEVOX_URL") {
            self.speech.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(id) = lookup("VOICEVOX_SPEAKER_ID") {
            match id.parse() {
                Ok(id) => self.speech.speaker_id = id,
                Err(e) => log::warn!("config: ignoring VOICEVOX_SPEAKER_ID={id:?}: {e}"),
            }
        }
    }

    /// Inbox directory after applying the optional override.
    pub fn inbox_dir(&self, paths: &AppPaths) -> PathBuf {
        self.ingest
            .inbox_dir
            .clone()
            .unwrap_or_else(|| paths.inbox_dir.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.device.host, default.device.host);
        assert_eq!(config.llm.vision_model, default.llm.vision_model);
        assert_eq!(config.sampler.interval_ms, default.sampler.interval_ms);
    }

    #[test]
    fn default_values_match_deployment() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.device.host, "192.168.1.100");
        assert_eq!(cfg.device.base_port, 12346);
        assert_eq!(cfg.device.jpeg_quality, 90);
        assert_eq!(cfg.llm.base_url, "http://localhost:1234");
        assert_eq!(cfg.llm.vision_model, "gemma-3-12b-it");
        assert_eq!(cfg.speech.base_url, "http://localhost:50021");
        assert_eq!(cfg.speech.speaker_id, 58);
        assert_eq!(cfg.sampler.interval(), Duration::from_millis(100));
        assert_eq!(cfg.teaching.slide_delay(), Duration::from_secs(3));
        assert_eq!(cfg.interrupt.cooldown(), Duration::from_secs(5));
        assert_eq!(cfg.ingest.max_file_bytes, 10 * 1024 * 1024);
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.device.host = "10.0.0.7".into();
        cfg.device.base_port = 40000;
        cfg.llm.api_key = Some("sk-test".into());
        cfg.interrupt.cooldown_secs = 2.5;
        cfg.sampler.interrupt_phrases = vec!["help".into()];
        cfg.ingest.inbox_dir = Some(PathBuf::from("/srv/homework"));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.device.host, "10.0.0.7");
        assert_eq!(loaded.device.base_port, 40000);
        assert_eq!(loaded.llm.api_key, Some("sk-test".into()));
        assert_eq!(loaded.interrupt.cooldown(), Duration::from_millis(2500));
        assert_eq!(loaded.sampler.interrupt_phrases, vec!["help".to_string()]);
        assert_eq!(loaded.ingest.inbox_dir, Some(PathBuf::from("/srv/homework")));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "shutdown_grace_secs = 3\n").expect("write");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.shutdown_grace_secs, 3);
        assert_eq!(loaded.device.base_port, 12346);
    }

    #[test]
    fn env_overrides_replace_endpoints() {
        let env: HashMap<&str, &str> = [
            ("QUEST_IP", "192.168.0.42"),
            ("QUEST_PORT", "5000"),
            ("LMSTUDIO_URL", "http://studio:1234/v1/chat/completions"),
            ("VOICEVOX_URL", "http://tts:50021/"),
            ("VOICEVOX_SPEAKER_ID", "3"),
        ]
        .into_iter()
        .collect();

        let mut cfg = AppConfig::default();
        cfg.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.device.host, "192.168.0.42");
        assert_eq!(cfg.device.base_port, 5000);
        assert_eq!(cfg.llm.base_url, "http://studio:1234");
        assert_eq!(cfg.speech.base_url, "http://tts:50021");
        assert_eq!(cfg.speech.speaker_id, 3);
    }

    #[test]
    fn bad_numeric_override_is_ignored() {
        let mut cfg = AppConfig::default();
        cfg.apply_overrides_from(|k| (k == "QUEST_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(cfg.device.base_port, 12346);
    }
}
