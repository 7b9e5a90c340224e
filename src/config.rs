//! Application configuration, loaded from JSON.
//!
//! Every section has a default, so a config file only needs the fields it changes.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::export::batch::BatchOptions;
use crate::export::video::ExportConfig;
use crate::foundation::error::{StudioError, StudioResult};
use crate::pdf::worksheet::PdfOptions;
use crate::render::stage::StageParams;

pub const DEFAULT_REMOTE_BASE_URL: &str = "https://cdn.jsdelivr.net/npm/hanzi-writer-data@latest";
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 8000;

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub glyphs: GlyphSourceConfig,
    pub stage: StageParams,
    pub export: ExportConfig,
    pub batch: BatchOptions,
    pub pdf: PdfOptions,
    pub logging: LoggingConfig,
}

/// Where glyph records are looked up, in order: bundle file, static directory, remote URL.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GlyphSourceConfig {
    /// JSON file mapping characters to records.
    pub bundle_path: Option<PathBuf>,
    /// Directory of `<char>.json` files.
    pub static_dir: Option<PathBuf>,
    /// Base URL serving `<char>.json`; `None` disables the remote tier.
    pub remote_base_url: Option<String>,
    pub remote_timeout_ms: u64,
}

impl Default for GlyphSourceConfig {
    fn default() -> Self {
        Self {
            bundle_path: None,
            static_dir: None,
            remote_base_url: Some(DEFAULT_REMOTE_BASE_URL.to_string()),
            remote_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `hanzi_studio=debug,warn`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl StudioConfig {
    pub fn from_json_str(s: &str) -> StudioResult<Self> {
        serde_json::from_str(s).map_err(|e| StudioError::serde(format!("config parse failed: {e}")))
    }

    pub fn from_path(path: &Path) -> StudioResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    /// Reads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> StudioResult<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_json_pretty(&self) -> StudioResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StudioError::serde(format!("config serialize failed: {e}")))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
