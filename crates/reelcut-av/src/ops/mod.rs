//! Per-operation FFmpeg command builders.
//!
//! Builders are pure: the same request parameters and probe results always
//! yield the same [`BuildPlan`]. No builder performs I/O -- existence checks
//! belong to output planning, and support files are written by the
//! orchestrator just before the passes run.
//!
//! Every builder that maps an audio stream checks the probe's `has_audio`
//! first; when the stream is absent, the audio-mapping arguments are omitted
//! entirely rather than referencing a stream that does not exist.

mod audio;
mod convert;
mod merge;
mod speed;
mod text;
mod trim;

pub use audio::{
    add_audio, adjust_volume, extract_audio, generate_silence, insert_silence, InsertMode,
};
pub use convert::{apply_filter, reencode, waveform};
pub use merge::{merge_audios, merge_videos, TransitionSpec};
pub use speed::{adjust_speed, atempo_stages};
pub use text::{add_text, TextStyle};
pub use trim::{delete_audio_range, delete_video_range, trim};

use std::path::{Path, PathBuf};

use reelcut_core::config::EncodeConfig;

use crate::command::CommandSpec;

/// A file the orchestrator must write before the passes run (e.g. a concat
/// demuxer list).
#[derive(Debug, Clone)]
pub struct SupportFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Ordered subprocess passes implementing one operation.
///
/// Multi-pass plans are strictly linear chains: pass *i + 1* consumes files
/// pass *i* produced, and the first failure aborts the whole plan.
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    pub passes: Vec<CommandSpec>,
    pub support_files: Vec<SupportFile>,
}

impl BuildPlan {
    /// Plan consisting of a single pass.
    pub fn single(spec: CommandSpec) -> Self {
        Self {
            passes: vec![spec],
            support_files: Vec::new(),
        }
    }

    pub fn push(&mut self, spec: CommandSpec) {
        self.passes.push(spec);
    }
}

/// Tolerance for comparing second-denominated positions against a probed
/// duration (well under one frame at any common rate).
pub(crate) const TIME_EPSILON: f64 = 1e-3;

pub(crate) fn path_arg(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

/// Format a second count for a filter argument or `-ss`/`-t` value:
/// fixed precision with trailing zeros trimmed, so output is deterministic
/// and free of float-formatting noise.
pub(crate) fn fmt_secs(value: f64) -> String {
    let mut s = format!("{value:.6}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

pub(crate) fn video_encode_args(enc: &EncodeConfig) -> Vec<String> {
    vec![
        "-c:v".into(),
        enc.video_codec.clone(),
        "-preset".into(),
        enc.video_preset.clone(),
        "-crf".into(),
        enc.video_crf.to_string(),
    ]
}

pub(crate) fn audio_encode_args(enc: &EncodeConfig) -> Vec<String> {
    vec![
        "-c:a".into(),
        enc.audio_codec.clone(),
        "-b:a".into(),
        enc.audio_bitrate.clone(),
    ]
}

/// Lavfi source description for the near-silent backfill/silence tone.
///
/// A 440 Hz sine at amplitude 0.001 rather than digital silence: quiet enough
/// to be inaudible, non-zero so the track stays visible on logarithmic
/// waveform displays.
pub(crate) fn near_silent_source(sample_rate: u32) -> String {
    format!("sine=frequency=440:sample_rate={sample_rate}")
}

pub(crate) const NEAR_SILENT_VOLUME: f64 = 0.001;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_secs_trims_trailing_zeros() {
        assert_eq!(fmt_secs(2.0), "2");
        assert_eq!(fmt_secs(2.5), "2.5");
        assert_eq!(fmt_secs(0.125), "0.125");
        assert_eq!(fmt_secs(10.000001), "10.000001");
        assert_eq!(fmt_secs(0.0), "0");
    }

    #[test]
    fn encode_args_follow_config() {
        let enc = EncodeConfig::default();
        let v = video_encode_args(&enc);
        assert_eq!(v[0], "-c:v");
        assert_eq!(v[1], "libx264");
        assert!(v.contains(&"-crf".to_string()));

        let a = audio_encode_args(&enc);
        assert_eq!(a, vec!["-c:a", "aac", "-b:a", "192k"]);
    }

    #[test]
    fn near_silent_source_embeds_sample_rate() {
        assert_eq!(
            near_silent_source(48000),
            "sine=frequency=440:sample_rate=48000"
        );
    }
}
