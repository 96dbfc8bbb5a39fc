//! Recording test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use crate::collab::{CollabError, Frame, FrameSource, SlideRenderer, SlideSpec, TextExtractor, TextRecognizer};
use crate::llm::{LanguageModel, LlmError};
use crate::speech::{SpeechError, SpeechSynthesizer};
use crate::transport::{DeviceTransport, TransportError};

/// Write a `width`×8 PNG; the width identifies the slide after transport.
pub fn write_png(path: &Path, width: u32) {
    RgbImage::from_pixel(width, 8, Rgb([30, 144, 255]))
        .save(path)
        .expect("write test png");
}

/// Poll `condition` until it holds, failing the test after five seconds.
pub async fn wait_for(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    /// Width of the delivered JPEG.
    Slide(u32),
    Audio(String),
}

type Hook = Box<dyn Fn(&Sent) + Send + Sync>;

#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    hook: Option<Hook>,
}

impl RecordingTransport {
    /// `hook` runs after each delivery is recorded.
    pub fn with_hook(hook: impl Fn(&Sent) + Send + Sync + 'static) -> Self {
        Self {
            sent: Mutex::default(),
            hook: Some(Box::new(hook)),
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn slides(&self) -> Vec<u32> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Slide(width) => Some(width),
                Sent::Audio(_) => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent.clone());
        if let Some(hook) = &self.hook {
            hook(&sent);
        }
    }
}

#[async_trait]
impl DeviceTransport for RecordingTransport {
    async fn send_image(&self, jpeg: &[u8]) -> Result<(), TransportError> {
        let width = image::load_from_memory(jpeg).map(|i| i.width()).unwrap_or(0);
        self.record(Sent::Slide(width));
        Ok(())
    }

    async fn send_audio_ref(&self, reference: &str) -> Result<(), TransportError> {
        self.record(Sent::Audio(reference.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Speech
// ---------------------------------------------------------------------------

/// "Synthesizes" the UTF-8 bytes of the text and records every line.
#[derive(Default)]
pub struct RecordingSpeech {
    spoken: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSpeech {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        if self.fail {
            return Err(SpeechError::Status(500));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(text.as_bytes().to_vec())
    }
}

// ---------------------------------------------------------------------------
// Language model
// ---------------------------------------------------------------------------

/// Fixed answers per request; an unset answer fails with `EmptyResponse`.
#[derive(Default)]
pub struct ScriptedModel {
    structure: Option<String>,
    explanation: Option<String>,
    analysis: Option<String>,
    detail: Option<String>,
    delay: Duration,
    structure_images: Mutex<Vec<bool>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_structure(mut self, answer: &str) -> Self {
        self.structure = Some(answer.to_string());
        self
    }

    pub fn with_explanation(mut self, answer: &str) -> Self {
        self.explanation = Some(answer.to_string());
        self
    }

    pub fn with_analysis(mut self, answer: &str) -> Self {
        self.analysis = Some(answer.to_string());
        self
    }

    pub fn with_detail(mut self, answer: &str) -> Self {
        self.detail = Some(answer.to_string());
        self
    }

    /// Every request sleeps for `delay` first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// For each structuring call, whether an image was attached.
    pub fn structure_images(&self) -> Vec<bool> {
        self.structure_images.lock().unwrap().clone()
    }

    async fn answer(&self, answer: &Option<String>) -> Result<String, LlmError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        answer.clone().ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn structure_problems(&self, _text: &str, image: Option<&[u8]>) -> Result<String, LlmError> {
        self.structure_images.lock().unwrap().push(image.is_some());
        self.answer(&self.structure).await
    }

    async fn explain(&self, _problems: &str) -> Result<String, LlmError> {
        self.answer(&self.explanation).await
    }

    async fn analyze_snapshot(&self, _image: &[u8]) -> Result<String, LlmError> {
        self.answer(&self.analysis).await
    }

    async fn explain_in_detail(&self, _analysis: &str) -> Result<String, LlmError> {
        self.answer(&self.detail).await
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Writes one PNG per slide, widths 10, 11, 12, ... in render order.
pub struct TestRenderer {
    dir: PathBuf,
    skip: Vec<&'static str>,
    next_width: AtomicUsize,
    rendered: Mutex<Vec<SlideSpec>>,
}

impl TestRenderer {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            skip: Vec::new(),
            next_width: AtomicUsize::new(10),
            rendered: Mutex::default(),
        }
    }

    /// Slides of these kinds produce no file.
    pub fn skipping(mut self, kinds: &[&'static str]) -> Self {
        self.skip = kinds.to_vec();
        self
    }

    pub fn rendered(&self) -> Vec<SlideSpec> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl SlideRenderer for TestRenderer {
    async fn render(&self, slide: &SlideSpec) -> Result<Option<PathBuf>, CollabError> {
        self.rendered.lock().unwrap().push(slide.clone());
        if self.skip.contains(&slide.kind()) {
            return Ok(None);
        }
        let width = self.next_width.fetch_add(1, Ordering::SeqCst) as u32;
        let path = self.dir.join(format!("{}_{width}.png", slide.file_stem()));
        write_png(&path, width);
        Ok(Some(path))
    }
}

// ---------------------------------------------------------------------------
// Camera, recognition, extraction
// ---------------------------------------------------------------------------

pub struct StaticCamera {
    fail: bool,
}

impl StaticCamera {
    pub fn ok() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl FrameSource for StaticCamera {
    async fn capture(&self) -> Result<Frame, CollabError> {
        if self.fail {
            return Err(CollabError::NoOutput("camera offline".into()));
        }
        Ok(Frame::new(vec![0xFF, 0xD8, 0xFF]))
    }
}

/// Returns the scripted texts in order, then empty text.
pub struct ScriptedRecognizer {
    texts: Mutex<VecDeque<String>>,
}

impl ScriptedRecognizer {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            texts: Mutex::new(texts.iter().map(|t| t.to_string()).collect()),
        }
    }
}

#[async_trait]
impl TextRecognizer for ScriptedRecognizer {
    async fn recognize(&self, _image: &[u8]) -> Result<String, CollabError> {
        Ok(self.texts.lock().unwrap().pop_front().unwrap_or_default())
    }
}

pub struct StaticExtractor {
    text: Option<String>,
}

impl StaticExtractor {
    pub fn ok(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl TextExtractor for StaticExtractor {
    async fn extract(&self, _artifact: &Path) -> Result<String, CollabError> {
        self.text
            .clone()
            .ok_or_else(|| CollabError::NoOutput("no text".into()))
    }
}
