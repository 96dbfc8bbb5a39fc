//! Homework pipeline — turns one admitted job into a [`Lesson`].
//!
//! # Pipeline flow
//!
//! ```text
//! HomeworkJob (phase = Processing)
//!   └─▶ extract text   (pdf → document extractor, image → OCR)   failure → ""
//!         └─▶ structure problems (vision, image bytes attached)  failure → abort
//!               └─▶ explain                                      failure → abort
//!                     └─▶ render deck: title, steps ≤ 5, [graph], celebration
//!                           ├─ Ok  → mark_teaching_ready       [TeachingReady]
//!                           └─ Err → abandon                   [Waiting]
//! ```
//!
//! A job is never retried or queued; a new submission must be made.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::collab::{SlideRenderer, SlideSpec, TextExtractor};
use crate::llm::{LanguageModel, ProblemSet};
use crate::session::{ArtifactKind, ExplanationDocument, HomeworkJob, Lesson, PhaseController, SlideDeck};

use super::steps::{extract_steps, find_equation, mentions_math};

/// Problem statement used when the model did not name one.
pub const DEFAULT_PROBLEM: &str = "数学問題";

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A language-model stage failed or answered with nothing.
    #[error("{stage} failed: {reason}")]
    GenerationFailed { stage: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// HomeworkPipeline
// ---------------------------------------------------------------------------

pub struct HomeworkPipeline {
    extractor: Arc<dyn TextExtractor>,
    model: Arc<dyn LanguageModel>,
    renderer: Arc<dyn SlideRenderer>,
    controller: Arc<PhaseController>,
}

impl HomeworkPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        model: Arc<dyn LanguageModel>,
        renderer: Arc<dyn SlideRenderer>,
        controller: Arc<PhaseController>,
    ) -> Self {
        Self {
            extractor,
            model,
            renderer,
            controller,
        }
    }

    /// Run `job` and publish the outcome to the controller.
    ///
    /// Returns the lesson when it was published (phase `TeachingReady`).
    /// A lesson for a job that was reset away in the meantime is dropped.
    pub async fn execute(&self, job: HomeworkJob) -> Option<Arc<Lesson>> {
        let id = job.id;
        match self.run(&job).await {
            Ok(lesson) => {
                let lesson = Arc::new(lesson);
                if self.controller.mark_teaching_ready(id, Arc::clone(&lesson)) {
                    log::info!("pipeline: job {id} ready with {} slides", lesson.deck.len());
                    Some(lesson)
                } else {
                    log::info!("pipeline: job {id} finished after a reset, lesson dropped");
                    None
                }
            }
            Err(e) => {
                log::error!("pipeline: job {id} aborted: {e}");
                self.controller.abandon(id);
                None
            }
        }
    }

    /// The four stages, without touching the session phase.
    pub async fn run(&self, job: &HomeworkJob) -> Result<Lesson, PipelineError> {
        log::info!("pipeline: job {} started ({})", job.id, job.artifact.display());

        // ── 1. Text extraction (soft failure) ──────────────────────────────
        let text = match self.extractor.extract(&job.artifact).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("pipeline: text extraction failed, continuing without text: {e}");
                String::new()
            }
        };

        // ── 2. Problem structuring ─────────────────────────────────────────
        let image = match job.kind {
            ArtifactKind::Image => match tokio::fs::read(&job.artifact).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    log::warn!("pipeline: cannot read artifact image: {e}");
                    None
                }
            },
            ArtifactKind::Document => None,
        };
        let structured = self
            .model
            .structure_problems(&text, image.as_deref())
            .await
            .map_err(|e| PipelineError::GenerationFailed {
                stage: "problem structuring",
                reason: e.to_string(),
            })?;
        let problems = ProblemSet::parse(&structured);
        if problems.is_none() {
            log::warn!("pipeline: structuring answer is not a problem list, using it verbatim");
        }

        // ── 3. Explanation ─────────────────────────────────────────────────
        let explanation = self
            .model
            .explain(&structured)
            .await
            .map_err(|e| PipelineError::GenerationFailed {
                stage: "explanation",
                reason: e.to_string(),
            })?;

        // ── 4. Deck ────────────────────────────────────────────────────────
        let problem_summary = problems
            .as_ref()
            .and_then(|set| set.first_problem_text())
            .unwrap_or(DEFAULT_PROBLEM)
            .to_string();
        let deck = self.build_deck(&explanation, &problem_summary).await;

        Ok(Lesson {
            job: job.id,
            deck,
            document: ExplanationDocument::from_text(explanation),
            problem_summary,
        })
    }

    async fn build_deck(&self, explanation: &str, problem: &str) -> SlideDeck {
        let steps = extract_steps(explanation);
        let total = steps.len();

        let mut specs = Vec::with_capacity(total + 3);
        specs.push(SlideSpec::Title {
            problem: problem.to_string(),
        });
        specs.extend(steps.into_iter().enumerate().map(|(i, content)| SlideSpec::Step {
            number: i + 1,
            total,
            content,
        }));
        if mentions_math(explanation) {
            let equation = find_equation(explanation).unwrap_or_else(|| problem.to_string());
            specs.push(SlideSpec::Graph { equation });
        }
        specs.push(SlideSpec::Celebration);

        let mut slides: Vec<PathBuf> = Vec::with_capacity(specs.len());
        for spec in &specs {
            match self.renderer.render(spec).await {
                Ok(Some(path)) => slides.push(path),
                Ok(None) => log::warn!("pipeline: {} slide omitted (no output)", spec.kind()),
                Err(e) => log::warn!("pipeline: {} slide omitted: {e}", spec.kind()),
            }
        }
        SlideDeck::new(slides)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
