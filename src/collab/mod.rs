//! External collaborators consumed by the session core.
//!
//! The core only sees the traits below.  The concrete types here shell out to
//! configurable command-line tools ([`ToolsConfig`](crate::config::ToolsConfig)),
//! which keeps OCR engines, camera drivers and slide layout out of the crate.
//!
//! | Trait             | Process-backed impl      | Default tool      |
//! |-------------------|--------------------------|-------------------|
//! | [`FrameSource`]   | [`CommandCamera`]        | `ffmpeg` (v4l2)   |
//! | [`TextRecognizer`]| [`CommandOcr`]           | `tesseract`       |
//! | [`TextExtractor`] | [`CommandOcr`]           | `tesseract` / `pdftotext` |
//! | [`SlideRenderer`] | [`CommandSlideRenderer`] | `render_slide.py` |
//!
//! Language-model and speech collaborators live in [`crate::llm`] and
//! [`crate::speech`].

pub mod camera;
pub mod ocr;
pub mod process;
pub mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;

pub use camera::CommandCamera;
pub use ocr::CommandOcr;
pub use render::{CommandSlideRenderer, SlideSpec};

// ---------------------------------------------------------------------------
// CollabError
// ---------------------------------------------------------------------------

/// Failures of the process-backed collaborators.
#[derive(Debug, Error)]
pub enum CollabError {
    #[error("tool not configured: {0}")]
    NotConfigured(String),

    #[error("cannot run {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{0} timed out")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The tool finished but produced nothing usable.
    #[error("no output produced: {0}")]
    NoOutput(String),
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One captured camera frame (encoded image bytes, usually JPEG).
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: data.into(),
            captured_at: Instant::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Camera pointed at the learner's desk.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> Result<Frame, CollabError>;
}

/// Text recognition over an in-memory image (a camera frame).
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<String, CollabError>;
}

/// Text extraction from a homework artifact on disk (image or PDF).
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, artifact: &Path) -> Result<String, CollabError>;
}

/// Slide image producer.
///
/// `Ok(None)` means the renderer ran but no slide file appeared; callers
/// treat it as "no slide", not as an error.
#[async_trait]
pub trait SlideRenderer: Send + Sync {
    async fn render(&self, slide: &SlideSpec) -> Result<Option<PathBuf>, CollabError>;
}
