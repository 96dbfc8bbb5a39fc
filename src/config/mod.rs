//! Configuration module for VR Sensei.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform data directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, DeviceConfig, IngestConfig, InterruptConfig, LlmConfig, SamplerConfig,
    SpeechConfig, TeachingConfig, ToolsConfig,
};
