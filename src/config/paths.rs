//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\vr-sensei\
//!   macOS:   ~/Library/Application Support/vr-sensei/
//!   Linux:   ~/.config/vr-sensei/
//!
//! Data dir (work files, slides, narration audio, inbox):
//!   Windows: %LOCALAPPDATA%\vr-sensei\
//!   macOS:   ~/Library/Application Support/vr-sensei/
//!   Linux:   ~/.local/share/vr-sensei/

use std::path::{Path, PathBuf};

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Scratch directory for captured frames and staged uploads.
    pub work_dir: PathBuf,
    /// Directory the slide renderer writes into.
    pub slides_dir: PathBuf,
    /// Directory for synthesized narration (`voice_<uuid>.wav`).
    pub audio_dir: PathBuf,
    /// Drop folder watched for new homework artifacts.
    pub inbox_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "vr-sensei";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self::with_roots(config_dir, &data_dir)
    }

    /// Build the layout under explicit roots (used by tests).
    pub fn with_roots(config_dir: PathBuf, data_dir: &Path) -> Self {
        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
            work_dir: data_dir.join("tmp"),
            slides_dir: data_dir.join("slides"),
            audio_dir: data_dir.join("audio"),
            inbox_dir: data_dir.join("inbox"),
        }
    }

    /// Create every data directory that does not exist yet.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            &self.work_dir,
            &self.slides_dir,
            &self.audio_dir,
            &self.inbox_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
