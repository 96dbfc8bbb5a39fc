//! Homework pipeline module.
//!
//! This module turns a submitted homework artifact into a [`Lesson`]
//! (slide deck + narrated explanation) and publishes it to the
//! [`PhaseController`].
//!
//! # Architecture
//!
//! ```text
//! Coordinator::submit ── try_enter_processing ──▶ TaskSupervisor::spawn(Homework)
//!                                                        │
//!                                                        ▼
//!                                          HomeworkPipeline::execute(job)
//!                                                        │
//!            TextExtractor ◀── extract ──────────────────┤
//!            LanguageModel ◀── structure, explain ───────┤
//!            SlideRenderer ◀── title/steps/graph/end ────┤
//!                                                        ▼
//!                                  mark_teaching_ready  |  abandon
//! ```
//!
//! [`Lesson`]: crate::session::Lesson
//! [`PhaseController`]: crate::session::PhaseController

pub mod runner;
pub mod steps;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{HomeworkPipeline, PipelineError, DEFAULT_PROBLEM};
pub use steps::{extract_steps, MAX_STEPS};
