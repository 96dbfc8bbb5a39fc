//! OCR and document text extraction through external tools.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use super::process::{expand_args, run_tool, ScratchFile};
use super::{CollabError, TextExtractor, TextRecognizer};
use crate::session::ArtifactKind;

/// `ocr_command` for images and frames, `pdf_command` for PDF documents.
///
/// Both tools print plain text on stdout; whitespace runs are collapsed so
/// trigger and command matching see one line of words.
pub struct CommandOcr {
    ocr_argv: Vec<String>,
    pdf_argv: Vec<String>,
    work_dir: PathBuf,
    timeout: Duration,
}

impl CommandOcr {
    pub fn new(
        ocr_argv: Vec<String>,
        pdf_argv: Vec<String>,
        work_dir: PathBuf,
        timeout: Duration,
    ) -> Self {
        Self {
            ocr_argv,
            pdf_argv,
            work_dir,
            timeout,
        }
    }

    async fn run_on(&self, template: &[String], input: &Path) -> Result<String, CollabError> {
        let input = input.to_string_lossy();
        let argv = expand_args(template, &[("input", input.as_ref())]);
        run_tool(&argv, self.timeout).await
    }
}

#[async_trait]
impl TextRecognizer for CommandOcr {
    async fn recognize(&self, image: &[u8]) -> Result<String, CollabError> {
        let scratch = ScratchFile::new(&self.work_dir, "ocr", "jpg");
        tokio::fs::write(scratch.path(), image).await?;

        let text = self.run_on(&self.ocr_argv, scratch.path()).await?;
        Ok(normalize_whitespace(&text))
    }
}

#[async_trait]
impl TextExtractor for CommandOcr {
    async fn extract(&self, artifact: &Path) -> Result<String, CollabError> {
        let template = match ArtifactKind::from_path(artifact) {
            Some(ArtifactKind::Document) => &self.pdf_argv,
            _ => &self.ocr_argv,
        };
        let text = self.run_on(template, artifact).await?;
        Ok(text.trim().to_string())
    }
}

/// Collapse every whitespace run (including newlines) into one space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
