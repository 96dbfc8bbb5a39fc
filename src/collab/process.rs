//! Argv templates and child-process execution for the external tools.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use uuid::Uuid;

use super::CollabError;

/// Substitute `{name}` placeholders in every argument.
///
/// ```
/// use vr_sensei::collab::process::expand_args;
///
/// let argv = vec!["ocr".to_string(), "{input}".to_string(), "--out={output}".to_string()];
/// let expanded = expand_args(&argv, &[("input", "a.jpg"), ("output", "b.txt")]);
/// assert_eq!(expanded, ["ocr", "a.jpg", "--out=b.txt"]);
/// ```
pub fn expand_args(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (name, value)| {
                acc.replace(&format!("{{{name}}}"), value)
            })
        })
        .collect()
}

/// A scratch file path that is removed when the guard is dropped,
/// including when the owning future is cancelled mid-run.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// `<dir>/<prefix>_<uuid>.<ext>`; nothing is created on disk.
    pub fn new(dir: &Path, prefix: &str, ext: &str) -> Self {
        Self {
            path: dir.join(format!("{prefix}_{}.{ext}", Uuid::new_v4().simple())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::debug!("scratch: cannot remove {}: {e}", self.path.display()),
        }
    }
}

/// Run `argv` to completion and return its stdout as (lossy) UTF-8.
///
/// A non-zero exit status is an error carrying the trimmed stderr.  The child
/// is killed if it outlives `timeout`.
pub async fn run_tool(argv: &[String], timeout: Duration) -> Result<String, CollabError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| CollabError::NotConfigured("empty command".into()))?;

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CollabError::Spawn {
            program: program.clone(),
            reason: e.to_string(),
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| CollabError::Timeout(program.clone()))?
        .map_err(|e| CollabError::Spawn {
            program: program.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(CollabError::Failed {
            program: program.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
