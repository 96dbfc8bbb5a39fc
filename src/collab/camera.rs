//! Frame capture through an external grabber command.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use super::process::{expand_args, run_tool, ScratchFile};
use super::{CollabError, Frame, FrameSource};

/// Runs `camera_command` with `{output}` set to a scratch file and returns
/// the bytes it wrote.
pub struct CommandCamera {
    argv: Vec<String>,
    work_dir: PathBuf,
    timeout: Duration,
}

impl CommandCamera {
    pub fn new(argv: Vec<String>, work_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            argv,
            work_dir,
            timeout,
        }
    }
}

#[async_trait]
impl FrameSource for CommandCamera {
    async fn capture(&self) -> Result<Frame, CollabError> {
        // Unique name: a manual Pkaisetu capture can overlap the sampler's.
        let output = ScratchFile::new(&self.work_dir, "frame", "jpg");
        let output_str = output.path().to_string_lossy().into_owned();
        let argv = expand_args(&self.argv, &[("output", output_str.as_str())]);

        run_tool(&argv, self.timeout).await?;
        let data = tokio::fs::read(output.path())
            .await
            .map_err(|_| CollabError::NoOutput(output_str))?;
        if data.is_empty() {
            return Err(CollabError::NoOutput("empty frame".into()));
        }
        Ok(Frame::new(data))
    }
}
