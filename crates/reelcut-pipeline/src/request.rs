//! The operation request surface consumed from the UI layer.
//!
//! One variant per operation, each carrying only the parameters that
//! operation needs. Requests are immutable once constructed and consumed
//! once by the [`Orchestrator`](crate::Orchestrator). [`validate`] runs the
//! parameter checks that need no probe, so bad requests fail before any
//! subprocess is spawned.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use reelcut_av::ops::{InsertMode, TransitionSpec};
use reelcut_core::{Error, Result};

fn default_waveform_width() -> u32 {
    800
}
fn default_waveform_height() -> u32 {
    240
}

/// A single edit operation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OperationRequest {
    /// Keep `[start, start + duration)`, drop the rest.
    Trim {
        input: PathBuf,
        start: f64,
        duration: f64,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Delete an interior range from the video track.
    TrimVideoOnly {
        input: PathBuf,
        start: f64,
        duration: f64,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Delete an interior range from the audio track, keeping video.
    TrimAudioOnly {
        input: PathBuf,
        start: f64,
        duration: f64,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Re-encode into the container implied by the output extension.
    ReEncode {
        input: PathBuf,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Apply caller-supplied video/audio filter expressions.
    ApplyFilter {
        input: PathBuf,
        #[serde(default)]
        video_filter: Option<String>,
        #[serde(default)]
        audio_filter: Option<String>,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Insert audio from another file at an offset.
    AddAudio {
        input: PathBuf,
        audio: PathBuf,
        #[serde(default)]
        offset: f64,
        #[serde(default)]
        mode: InsertMode,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Overlay text on the video, optionally only within a time window.
    AddText {
        input: PathBuf,
        text: String,
        #[serde(default)]
        start: Option<f64>,
        #[serde(default)]
        end: Option<f64>,
        #[serde(default)]
        font_size: Option<u32>,
        #[serde(default)]
        font_color: Option<String>,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Concatenate video clips, optionally crossfading between them.
    MergeVideos {
        inputs: Vec<PathBuf>,
        #[serde(default)]
        transition: Option<TransitionSpec>,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Concatenate audio files into one track.
    MergeAudios {
        inputs: Vec<PathBuf>,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Extract the audio track into its own file.
    ExtractAudio {
        input: PathBuf,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Scale audio volume by a factor.
    AdjustVolume {
        input: PathBuf,
        factor: f64,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Change playback speed.
    AdjustSpeed {
        input: PathBuf,
        speed: f64,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Insert near-silence into a file, or generate a standalone silent track
    /// when `input` is absent.
    GenerateSilence {
        #[serde(default)]
        input: Option<PathBuf>,
        #[serde(default)]
        offset: f64,
        duration: f64,
        #[serde(default)]
        mode: InsertMode,
        #[serde(default)]
        output: Option<PathBuf>,
    },
    /// Render the audio track's waveform to an image.
    GenerateWaveform {
        input: PathBuf,
        #[serde(default = "default_waveform_width")]
        width: u32,
        #[serde(default = "default_waveform_height")]
        height: u32,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        output: Option<PathBuf>,
    },
}

fn require_non_negative(value: f64, name: &str) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "{name} must be a non-negative number"
        )))
    }
}

fn require_positive(value: f64, name: &str) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::validation(format!("{name} must be a positive number")))
    }
}

impl OperationRequest {
    /// Check the parameters that need no media probe.
    ///
    /// Probe-dependent checks (range vs. duration, stream presence) happen in
    /// the command builders.
    pub fn validate(&self) -> Result<()> {
        match self {
            OperationRequest::Trim {
                start, duration, ..
            }
            | OperationRequest::TrimVideoOnly {
                start, duration, ..
            }
            | OperationRequest::TrimAudioOnly {
                start, duration, ..
            } => {
                require_non_negative(*start, "start")?;
                require_positive(*duration, "duration")
            }
            OperationRequest::ReEncode { .. } | OperationRequest::ExtractAudio { .. } => Ok(()),
            OperationRequest::ApplyFilter {
                video_filter,
                audio_filter,
                ..
            } => {
                let has_vf = video_filter
                    .as_deref()
                    .is_some_and(|s| !s.trim().is_empty());
                let has_af = audio_filter
                    .as_deref()
                    .is_some_and(|s| !s.trim().is_empty());
                if has_vf || has_af {
                    Ok(())
                } else {
                    Err(Error::validation("no filter specified"))
                }
            }
            OperationRequest::AddAudio { audio, offset, .. } => {
                if audio.as_os_str().is_empty() {
                    return Err(Error::validation("audio source path must not be empty"));
                }
                require_non_negative(*offset, "offset")
            }
            OperationRequest::AddText {
                text,
                start,
                end,
                font_size,
                ..
            } => {
                if text.trim().is_empty() {
                    return Err(Error::validation("overlay text must not be empty"));
                }
                if let Some(s) = start {
                    require_non_negative(*s, "start")?;
                }
                if let Some(e) = end {
                    require_non_negative(*e, "end")?;
                }
                if let (Some(s), Some(e)) = (start, end) {
                    if e <= s {
                        return Err(Error::validation("end must be greater than start"));
                    }
                }
                if font_size == &Some(0) {
                    return Err(Error::validation("font size must be non-zero"));
                }
                Ok(())
            }
            OperationRequest::MergeVideos {
                inputs, transition, ..
            } => {
                if inputs.len() < 2 {
                    return Err(Error::validation("merging requires at least two clips"));
                }
                if let Some(t) = transition {
                    require_positive(t.duration, "transition duration")?;
                    if t.kind.trim().is_empty() {
                        return Err(Error::validation("transition kind must not be empty"));
                    }
                }
                Ok(())
            }
            OperationRequest::MergeAudios { inputs, .. } => {
                if inputs.len() < 2 {
                    return Err(Error::validation("merging requires at least two clips"));
                }
                Ok(())
            }
            OperationRequest::AdjustVolume { factor, .. } => {
                require_positive(*factor, "volume factor")
            }
            OperationRequest::AdjustSpeed { speed, .. } => require_positive(*speed, "speed"),
            OperationRequest::GenerateSilence {
                offset, duration, ..
            } => {
                require_non_negative(*offset, "offset")?;
                require_positive(*duration, "duration")
            }
            OperationRequest::GenerateWaveform { width, height, .. } => {
                if *width == 0 || *height == 0 {
                    return Err(Error::validation("waveform dimensions must be non-zero"));
                }
                Ok(())
            }
        }
    }

    /// The file the operation primarily reads, used for probing and for
    /// deriving default output names. `None` only for standalone generation.
    pub fn primary_input(&self) -> Option<&Path> {
        match self {
            OperationRequest::Trim { input, .. }
            | OperationRequest::TrimVideoOnly { input, .. }
            | OperationRequest::TrimAudioOnly { input, .. }
            | OperationRequest::ReEncode { input, .. }
            | OperationRequest::ApplyFilter { input, .. }
            | OperationRequest::AddAudio { input, .. }
            | OperationRequest::AddText { input, .. }
            | OperationRequest::ExtractAudio { input, .. }
            | OperationRequest::AdjustVolume { input, .. }
            | OperationRequest::AdjustSpeed { input, .. }
            | OperationRequest::GenerateWaveform { input, .. } => Some(input),
            OperationRequest::MergeVideos { inputs, .. }
            | OperationRequest::MergeAudios { inputs, .. } => inputs.first().map(PathBuf::as_path),
            OperationRequest::GenerateSilence { input, .. } => input.as_deref(),
        }
    }

    /// The output path the caller asked for, if any.
    pub fn requested_output(&self) -> Option<&Path> {
        match self {
            OperationRequest::Trim { output, .. }
            | OperationRequest::TrimVideoOnly { output, .. }
            | OperationRequest::TrimAudioOnly { output, .. }
            | OperationRequest::ReEncode { output, .. }
            | OperationRequest::ApplyFilter { output, .. }
            | OperationRequest::AddAudio { output, .. }
            | OperationRequest::AddText { output, .. }
            | OperationRequest::MergeVideos { output, .. }
            | OperationRequest::MergeAudios { output, .. }
            | OperationRequest::ExtractAudio { output, .. }
            | OperationRequest::AdjustVolume { output, .. }
            | OperationRequest::AdjustSpeed { output, .. }
            | OperationRequest::GenerateSilence { output, .. }
            | OperationRequest::GenerateWaveform { output, .. } => output.as_deref(),
        }
    }

    /// Extension for synthesized output names when no path was requested.
    pub fn default_ext(&self) -> String {
        fn inherit(input: &Path) -> String {
            input
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "mp4".to_string())
        }

        match self {
            OperationRequest::ExtractAudio { .. } | OperationRequest::MergeAudios { .. } => {
                "m4a".to_string()
            }
            OperationRequest::GenerateWaveform { .. } => "png".to_string(),
            OperationRequest::GenerateSilence { input: None, .. } => "m4a".to_string(),
            OperationRequest::GenerateSilence {
                input: Some(input), ..
            } => inherit(input),
            OperationRequest::ReEncode { .. } | OperationRequest::MergeVideos { .. } => {
                "mp4".to_string()
            }
            _ => self
                .primary_input()
                .map(inherit)
                .unwrap_or_else(|| "mp4".to_string()),
        }
    }

    /// Short name used in logs and progress reporting.
    pub fn label(&self) -> &'static str {
        match self {
            OperationRequest::Trim { .. } => "trim",
            OperationRequest::TrimVideoOnly { .. } => "cut-video",
            OperationRequest::TrimAudioOnly { .. } => "cut-audio",
            OperationRequest::ReEncode { .. } => "re-encode",
            OperationRequest::ApplyFilter { .. } => "apply-filter",
            OperationRequest::AddAudio { .. } => "add-audio",
            OperationRequest::AddText { .. } => "add-text",
            OperationRequest::MergeVideos { .. } => "merge-videos",
            OperationRequest::MergeAudios { .. } => "merge-audios",
            OperationRequest::ExtractAudio { .. } => "extract-audio",
            OperationRequest::AdjustVolume { .. } => "adjust-volume",
            OperationRequest::AdjustSpeed { .. } => "adjust-speed",
            OperationRequest::GenerateSilence { .. } => "generate-silence",
            OperationRequest::GenerateWaveform { .. } => "waveform",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_validation() {
        let ok = OperationRequest::Trim {
            input: PathBuf::from("/a.mp4"),
            start: 2.0,
            duration: 3.0,
            output: None,
        };
        assert!(ok.validate().is_ok());

        let bad = OperationRequest::Trim {
            input: PathBuf::from("/a.mp4"),
            start: -1.0,
            duration: 3.0,
            output: None,
        };
        assert!(matches!(bad.validate(), Err(Error::Validation(_))));

        let bad = OperationRequest::Trim {
            input: PathBuf::from("/a.mp4"),
            start: 0.0,
            duration: 0.0,
            output: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn apply_filter_needs_at_least_one_filter() {
        let bad = OperationRequest::ApplyFilter {
            input: PathBuf::from("/a.mp4"),
            video_filter: None,
            audio_filter: Some("  ".into()),
            output: None,
        };
        assert!(bad.validate().is_err());

        let ok = OperationRequest::ApplyFilter {
            input: PathBuf::from("/a.mp4"),
            video_filter: Some("hue=s=0".into()),
            audio_filter: None,
            output: None,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn add_text_window_ordering() {
        let bad = OperationRequest::AddText {
            input: PathBuf::from("/a.mp4"),
            text: "hi".into(),
            start: Some(5.0),
            end: Some(5.0),
            font_size: None,
            font_color: None,
            output: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn merge_needs_two_clips() {
        let bad = OperationRequest::MergeVideos {
            inputs: vec![PathBuf::from("/a.mp4")],
            transition: None,
            output: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn speed_and_volume_must_be_positive() {
        let bad = OperationRequest::AdjustSpeed {
            input: PathBuf::from("/a.mp4"),
            speed: 0.0,
            output: None,
        };
        assert!(bad.validate().is_err());

        let bad = OperationRequest::AdjustVolume {
            input: PathBuf::from("/a.mp4"),
            factor: f64::NAN,
            output: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn default_extensions() {
        let req = OperationRequest::ExtractAudio {
            input: PathBuf::from("/a.mp4"),
            output: None,
        };
        assert_eq!(req.default_ext(), "m4a");

        let req = OperationRequest::GenerateWaveform {
            input: PathBuf::from("/a.mp4"),
            width: 800,
            height: 240,
            color: None,
            output: None,
        };
        assert_eq!(req.default_ext(), "png");

        let req = OperationRequest::AdjustVolume {
            input: PathBuf::from("/music.flac"),
            factor: 0.5,
            output: None,
        };
        assert_eq!(req.default_ext(), "flac");
    }

    #[test]
    fn requests_deserialize_with_defaults() {
        let json = r#"{"op": "add_audio", "input": "/a.mp4", "audio": "/voice.wav"}"#;
        let req: OperationRequest = serde_json::from_str(json).unwrap();
        match req {
            OperationRequest::AddAudio { offset, mode, .. } => {
                assert_eq!(offset, 0.0);
                assert_eq!(mode, InsertMode::Mix);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn primary_input_for_merge_is_first_clip() {
        let req = OperationRequest::MergeVideos {
            inputs: vec![PathBuf::from("/a.mp4"), PathBuf::from("/b.mp4")],
            transition: None,
            output: None,
        };
        assert_eq!(req.primary_input(), Some(Path::new("/a.mp4")));
    }

    #[test]
    fn standalone_silence_has_no_primary_input() {
        let req = OperationRequest::GenerateSilence {
            input: None,
            offset: 0.0,
            duration: 2.0,
            mode: InsertMode::Mix,
            output: None,
        };
        assert_eq!(req.primary_input(), None);
        assert_eq!(req.default_ext(), "m4a");
    }
}
