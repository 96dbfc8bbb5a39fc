//! Slide descriptions and the process-backed renderer.
//!
//! A [`SlideSpec`] is passed to `render_command` as `{kind}` plus a JSON
//! `{payload}`; the tool writes a PNG to `{output}`.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::process::{expand_args, run_tool};
use super::{CollabError, SlideRenderer};

/// One slide to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlideSpec {
    /// Opening slide with the problem statement.
    Title { problem: String },
    /// "Step n of total".
    Step {
        number: usize,
        total: usize,
        content: String,
    },
    /// Plot of an equation found in the explanation.
    Graph { equation: String },
    /// Closing slide.
    Celebration,
    /// Single Pkaisetu slide for a snapshot.
    Detail { problem: String, explanation: String },
    /// Plain text fallback.
    Text { title: String, lines: Vec<String> },
}

impl SlideSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            SlideSpec::Title { .. } => "title",
            SlideSpec::Step { .. } => "step",
            SlideSpec::Graph { .. } => "graph",
            SlideSpec::Celebration => "celebration",
            SlideSpec::Detail { .. } => "detail",
            SlideSpec::Text { .. } => "text",
        }
    }

    /// File stem for the rendered image, e.g. `step_2`.
    pub fn file_stem(&self) -> String {
        match self {
            SlideSpec::Step { number, .. } => format!("step_{number}"),
            other => other.kind().to_string(),
        }
    }
}

/// Renders slides with `render_command` into `slides_dir`.
pub struct CommandSlideRenderer {
    argv: Vec<String>,
    slides_dir: PathBuf,
    timeout: Duration,
}

impl CommandSlideRenderer {
    pub fn new(argv: Vec<String>, slides_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            argv,
            slides_dir,
            timeout,
        }
    }
}

#[async_trait]
impl SlideRenderer for CommandSlideRenderer {
    async fn render(&self, slide: &SlideSpec) -> Result<Option<PathBuf>, CollabError> {
        let output = self.slides_dir.join(format!(
            "{}_{}.png",
            slide.file_stem(),
            Uuid::new_v4().simple()
        ));
        let payload = serde_json::to_string(slide)
            .map_err(|e| CollabError::NoOutput(format!("slide payload: {e}")))?;
        let output_str = output.to_string_lossy().into_owned();
        let argv = expand_args(
            &self.argv,
            &[
                ("kind", slide.kind()),
                ("payload", payload.as_str()),
                ("output", output_str.as_str()),
            ],
        );

        run_tool(&argv, self.timeout).await?;

        if tokio::fs::try_exists(&output).await.unwrap_or(false) {
            Ok(Some(output))
        } else {
            log::warn!("renderer produced no {} slide", slide.kind());
            Ok(None)
        }
    }
}
