//! [`IngestionGateway`] — validates and stages inbound artifacts.

use std::path::{Path, PathBuf};

use chrono::Local;
use uuid::Uuid;

use super::validate::{check_size, clean_filename, prepare_image, IngestError};
use crate::config::IngestConfig;
use crate::session::{ArtifactKind, Submission};

/// Copies accepted files into the work directory as
/// `inbox_<uuid>_<clean name>`, so the source can be removed or replaced.
pub struct IngestionGateway {
    staging_dir: PathBuf,
    max_file_bytes: u64,
    max_width: u32,
    max_height: u32,
}

impl IngestionGateway {
    pub fn new(staging_dir: PathBuf, config: &IngestConfig) -> Self {
        Self {
            staging_dir,
            max_file_bytes: config.max_file_bytes,
            max_width: config.max_width,
            max_height: config.max_height,
        }
    }

    /// Validate `source` and stage a copy; nothing is staged on error.
    pub async fn accept(&self, source: &Path, source_id: &str) -> Result<Submission, IngestError> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = ArtifactKind::from_path(source).ok_or_else(|| IngestError::UnsupportedType(name.clone()))?;

        let size = tokio::fs::metadata(source).await?.len();
        check_size(size, self.max_file_bytes)?;

        let staged = self
            .staging_dir
            .join(format!("inbox_{}_{}", Uuid::new_v4(), clean_filename(&name)));
        tokio::fs::copy(source, &staged).await?;

        if kind == ArtifactKind::Image {
            let path = staged.clone();
            let (w, h) = (self.max_width, self.max_height);
            let prepared = tokio::task::spawn_blocking(move || prepare_image(&path, w, h))
                .await
                .map_err(|e| IngestError::Undecodable(format!("image task failed: {e}")))
                .and_then(|r| r);
            if let Err(e) = prepared {
                let _ = tokio::fs::remove_file(&staged).await;
                return Err(e);
            }
        }

        log::info!("ingest: accepted {name} from {source_id} as {}", staged.display());
        Ok(Submission {
            artifact: staged,
            kind,
            submitted_at: Local::now(),
            source_id: source_id.to_string(),
        })
    }
}
