//! Language-model access for the tutoring flows.
//!
//! This module provides:
//! * [`LanguageModel`] — async trait for the four tutoring requests.
//! * [`ApiLanguageModel`] — OpenAI-compatible REST backend (LM Studio).
//! * [`PromptBuilder`] — builds the persona prompts.
//! * [`ProblemSet`] / [`Problem`] — typed structuring response.
//! * [`LlmError`] — error variants for model requests.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use vr_sensei::config::AppConfig;
//! use vr_sensei::llm::{ApiLanguageModel, LanguageModel, ProblemSet};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let model = ApiLanguageModel::from_config(&config.llm);
//!
//!     let raw = model.structure_problems("2x + 3 = 7 を解け", None).await.unwrap();
//!     let problems = ProblemSet::parse(&raw);
//!     let explanation = model.explain(&raw).await.unwrap();
//!     println!("{problems:?}\n{explanation}");
//! }
//! ```

pub mod client;
pub mod problems;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ApiLanguageModel, LanguageModel, LlmError};
pub use problems::{Problem, ProblemSet};
pub use prompt::PromptBuilder;
