//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! sub-configs for tool paths, the scratch directory, and encoding defaults.
//! Every section defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub scratch: ScratchConfig,
    pub encode: EncodeConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    ///
    /// This is intentionally string-based so the caller can read the file
    /// however it sees fit (async, embedded, etc.).
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(ref p) = self.tools.ffmpeg_path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.ffmpeg_path {} does not exist; falling back to PATH lookup",
                    p.display()
                ));
            }
        }
        if let Some(ref p) = self.tools.ffprobe_path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.ffprobe_path {} does not exist; falling back to PATH lookup",
                    p.display()
                ));
            }
        }

        if let Some(ref dir) = self.scratch.dir {
            if dir.exists() && !dir.is_dir() {
                warnings.push(format!(
                    "scratch.dir {} exists but is not a directory",
                    dir.display()
                ));
            }
        }

        if self.encode.video_crf > 51 {
            warnings.push(format!(
                "encode.video_crf {} is outside the usual 0-51 range",
                self.encode.video_crf
            ));
        }

        let known_presets = [
            "ultrafast", "superfast", "veryfast", "faster", "fast", "medium", "slow", "slower",
            "veryslow",
        ];
        if !known_presets.contains(&self.encode.video_preset.as_str()) {
            warnings.push(format!(
                "encode.video_preset '{}' is not a recognized x264 preset (valid: {})",
                self.encode.video_preset,
                known_presets.join(", ")
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Scratch directory settings.
///
/// Default outputs (when the caller did not request a path) and staging files
/// land here. Concurrent operations write distinct, timestamp/PID-suffixed
/// names, so the directory needs no locking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    pub dir: Option<PathBuf>,
}

impl ScratchConfig {
    /// The effective scratch directory: the configured one, or the system
    /// temp directory when unset.
    pub fn resolve(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Encoding defaults used whenever an operation re-encodes a stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    #[serde(default = "default_video_crf")]
    pub video_crf: u32,
    #[serde(default = "default_video_preset")]
    pub video_preset: String,
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
    /// Sample rate audio streams are normalized to when a filter graph needs
    /// uniform inputs (merges, insertions).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_video_codec() -> String {
    "libx264".into()
}
fn default_video_crf() -> u32 {
    18
}
fn default_video_preset() -> String {
    "veryfast".into()
}
fn default_audio_codec() -> String {
    "aac".into()
}
fn default_audio_bitrate() -> String {
    "192k".into()
}
fn default_sample_rate() -> u32 {
    44100
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            video_crf: default_video_crf(),
            video_preset: default_video_preset(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            sample_rate: default_sample_rate(),
        }
    }
}
