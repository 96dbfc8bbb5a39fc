//! Homework jobs and the lesson material they produce.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// JobId
// ---------------------------------------------------------------------------

/// Identifies one homework job.  A replay of an earlier submission gets a
/// fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form is enough to tell jobs apart in the log.
        let full = self.0.simple().to_string();
        f.write_str(&full[..8])
    }
}

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

/// What kind of homework artifact was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A photo or scan (`.png`, `.jpg`, `.jpeg`).
    Image,
    /// A PDF document.
    Document,
}

impl ArtifactKind {
    /// Classify by file extension (case-insensitive).  `None` for anything
    /// the pipeline cannot read.
    ///
    /// ```
    /// use std::path::Path;
    /// use vr_sensei::session::ArtifactKind;
    ///
    /// assert_eq!(ArtifactKind::from_path(Path::new("hw.JPG")), Some(ArtifactKind::Image));
    /// assert_eq!(ArtifactKind::from_path(Path::new("hw.pdf")), Some(ArtifactKind::Document));
    /// assert_eq!(ArtifactKind::from_path(Path::new("hw.docx")), None);
    /// ```
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" => Some(ArtifactKind::Image),
            "pdf" => Some(ArtifactKind::Document),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Submission / HomeworkJob
// ---------------------------------------------------------------------------

/// A validated artifact handed over by the ingestion gateway.
#[derive(Debug, Clone)]
pub struct Submission {
    pub artifact: PathBuf,
    pub kind: ArtifactKind,
    pub submitted_at: DateTime<Local>,
    /// Who or what delivered the artifact (inbox file name, operator, …).
    pub source_id: String,
}

/// Where a job came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOrigin {
    Ingested { source_id: String },
    Replay { of: JobId },
}

/// One request to analyse and explain a submitted problem image/document.
#[derive(Debug, Clone)]
pub struct HomeworkJob {
    pub id: JobId,
    pub artifact: PathBuf,
    pub kind: ArtifactKind,
    pub submitted_at: DateTime<Local>,
    pub origin: JobOrigin,
    /// Filled in once the pipeline has produced the lesson.
    pub lesson: Option<Arc<Lesson>>,
}

impl HomeworkJob {
    pub fn from_submission(submission: &Submission) -> Self {
        Self {
            id: JobId::new(),
            artifact: submission.artifact.clone(),
            kind: submission.kind,
            submitted_at: submission.submitted_at,
            origin: JobOrigin::Ingested {
                source_id: submission.source_id.clone(),
            },
            lesson: None,
        }
    }

    /// A new job over the same artifact as `previous`.
    pub fn replay_of(previous: &HomeworkJob) -> Self {
        Self {
            id: JobId::new(),
            artifact: previous.artifact.clone(),
            kind: previous.kind,
            submitted_at: Local::now(),
            origin: JobOrigin::Replay { of: previous.id },
            lesson: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SlideDeck
// ---------------------------------------------------------------------------

/// Ordered slide images; insertion order is presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideDeck {
    slides: Vec<PathBuf>,
}

impl SlideDeck {
    pub fn new(slides: Vec<PathBuf>) -> Self {
        Self { slides }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.slides.get(index).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.slides.iter().map(PathBuf::as_path)
    }
}

// ---------------------------------------------------------------------------
// ExplanationDocument
// ---------------------------------------------------------------------------

/// Narrated explanation, split into segments aligned 1:1 with slides.
///
/// Segments are the blank-line separated paragraphs of the text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplanationDocument {
    text: String,
    segments: Vec<String>,
}

impl ExplanationDocument {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let segments = text
            .split("\n\n")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { text, segments }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Narration for slide `index`, `None` once the segments run out.
    pub fn narration_for(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Lesson
// ---------------------------------------------------------------------------

/// Everything one successful pipeline run produces.
#[derive(Debug, Clone)]
pub struct Lesson {
    pub job: JobId,
    pub deck: SlideDeck,
    pub document: ExplanationDocument,
    /// Short statement of the main problem, used as Pkaisetu slide context.
    pub problem_summary: String,
}
