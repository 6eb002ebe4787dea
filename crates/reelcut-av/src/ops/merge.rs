//! Merge builders: plain concatenation and crossfade transitions, with
//! silent-track backfill for audio-less inputs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use reelcut_core::config::EncodeConfig;
use reelcut_core::{Error, Result};

use crate::command::{CommandSpec, ToolKind};
use crate::filter::{Filter, FilterChain, FilterGraph};
use crate::probe::MediaProbeResult;

use super::audio::audio_codec_for_ext;
use super::{
    audio_encode_args, fmt_secs, near_silent_source, path_arg, video_encode_args, BuildPlan,
    NEAR_SILENT_VOLUME,
};

/// A crossfade transition between consecutive clips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionSpec {
    /// xfade transition name (e.g. "fade", "wipeleft", "dissolve").
    pub kind: String,
    /// Overlap duration in seconds.
    pub duration: f64,
}

/// Merge video clips into one file, optionally crossfading between them.
///
/// Heterogeneous inputs are normalized (common resolution, frame rate, and
/// audio format) inside the graph before any transition filter runs; feeding
/// mismatched streams to `concat`/`xfade` would produce an invalid graph.
///
/// Clips lacking an audio stream first get a near-silent track muxed in as a
/// prerequisite pass, so the merge graph can wire audio for every input.
pub fn merge_videos(
    clips: &[MediaProbeResult],
    transition: Option<&TransitionSpec>,
    staging_dir: &Path,
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    if clips.len() < 2 {
        return Err(Error::validation("merging requires at least two clips"));
    }
    for clip in clips {
        if !clip.has_video() {
            return Err(Error::validation(format!(
                "{} has no video stream",
                clip.path.display()
            )));
        }
    }
    if let Some(t) = transition {
        if !(t.duration.is_finite() && t.duration > 0.0) {
            return Err(Error::validation(
                "transition duration must be a positive number",
            ));
        }
        let shortest = clips
            .iter()
            .map(|c| c.duration_secs)
            .fold(f64::INFINITY, f64::min);
        if t.duration >= shortest {
            return Err(Error::validation(format!(
                "transition duration {} must be shorter than the shortest clip ({})",
                fmt_secs(t.duration),
                fmt_secs(shortest)
            )));
        }
    }

    let mut plan = BuildPlan::default();

    // Prerequisite passes: give every audio-less clip a synthetic track.
    let mut effective_inputs: Vec<PathBuf> = Vec::with_capacity(clips.len());
    for (i, clip) in clips.iter().enumerate() {
        if clip.has_audio() {
            effective_inputs.push(clip.path.clone());
            continue;
        }
        let backfilled = staging_dir.join(format!("backfill_{i}.mp4"));
        let mut graph = FilterGraph::new();
        graph.add(
            FilterChain::new()
                .input("1:a")
                .filter(Filter::new("volume").arg(NEAR_SILENT_VOLUME))
                .output("pad"),
        );
        let spec = CommandSpec::new(
            ToolKind::Ffmpeg,
            format!("backfill audio: {}", clip.path.display()),
        )
        .args(["-y", "-i", path_arg(&clip.path).as_str()])
        .args(["-f", "lavfi", "-t", fmt_secs(clip.duration_secs).as_str(), "-i"])
        .arg(near_silent_source(enc.sample_rate))
        .args(["-filter_complex", graph.render().as_str()])
        .args(["-map", "0:v:0", "-map", "[pad]"])
        .args(["-c:v", "copy"])
        .args(audio_encode_args(enc))
        .arg("-shortest")
        .arg(path_arg(&backfilled));
        plan.push(spec);
        effective_inputs.push(backfilled);
    }

    // Normalization target: the first clip's geometry and frame rate.
    let Some(first) = clips[0].video.as_ref() else {
        return Err(Error::Internal("merge input lost its video stream".into()));
    };
    let width = if first.width > 0 { first.width } else { 1280 };
    let height = if first.height > 0 { first.height } else { 720 };
    let fps = first.frame_rate.unwrap_or(30.0);

    let mut graph = FilterGraph::new();
    for i in 0..clips.len() {
        graph.add(
            FilterChain::new()
                .input(format!("{i}:v"))
                .filter(
                    Filter::new("scale")
                        .arg(width)
                        .arg(height)
                        .named("force_original_aspect_ratio", "decrease"),
                )
                .filter(
                    Filter::new("pad")
                        .arg(width)
                        .arg(height)
                        .arg("(ow-iw)/2")
                        .arg("(oh-ih)/2"),
                )
                .filter(Filter::new("setsar").arg(1))
                .filter(Filter::new("fps").arg(fmt_secs(fps)))
                .output(format!("v{i}")),
        );
        graph.add(
            FilterChain::new()
                .input(format!("{i}:a"))
                .filter(Filter::new("aresample").arg(enc.sample_rate))
                .filter(
                    Filter::new("aformat")
                        .named("sample_fmts", "fltp")
                        .named("channel_layouts", "stereo"),
                )
                .output(format!("a{i}")),
        );
    }

    match transition {
        None => {
            let mut tail = FilterChain::new();
            for i in 0..clips.len() {
                tail = tail.input(format!("v{i}")).input(format!("a{i}"));
            }
            tail = tail.filter(
                Filter::new("concat")
                    .named("n", clips.len())
                    .named("v", 1)
                    .named("a", 1),
            );
            graph.add(tail.output("vout").output("aout"));
        }
        Some(t) => {
            // Chained pairwise transitions. The offset for joining clip i is
            // the sum of all previous clip durations minus i overlaps,
            // clamped non-negative.
            let mut cumulative = 0.0;
            let mut vprev = "v0".to_string();
            let mut aprev = "a0".to_string();
            for i in 1..clips.len() {
                cumulative += clips[i - 1].duration_secs;
                let offset = (cumulative - t.duration * i as f64).max(0.0);

                let vnext = if i == clips.len() - 1 {
                    "vout".to_string()
                } else {
                    format!("vx{i}")
                };
                graph.add(
                    FilterChain::new()
                        .input(vprev)
                        .input(format!("v{i}"))
                        .filter(
                            Filter::new("xfade")
                                .named("transition", &t.kind)
                                .named("duration", fmt_secs(t.duration))
                                .named("offset", fmt_secs(offset)),
                        )
                        .output(vnext.clone()),
                );
                vprev = vnext;

                let anext = if i == clips.len() - 1 {
                    "aout".to_string()
                } else {
                    format!("ax{i}")
                };
                graph.add(
                    FilterChain::new()
                        .input(aprev)
                        .input(format!("a{i}"))
                        .filter(Filter::new("acrossfade").named("d", fmt_secs(t.duration)))
                        .output(anext.clone()),
                );
                aprev = anext;
            }
        }
    }

    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "merge clips").arg("-y");
    for input in &effective_inputs {
        spec = spec.args(["-i", path_arg(input).as_str()]);
    }
    spec = spec
        .args(["-filter_complex", graph.render().as_str()])
        .args(["-map", "[vout]"])
        .args(video_encode_args(enc))
        .args(["-map", "[aout]"])
        .args(audio_encode_args(enc))
        .arg(path_arg(output));
    plan.push(spec);

    Ok(plan)
}

/// Concatenate audio files into one track.
pub fn merge_audios(
    clips: &[MediaProbeResult],
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    if clips.len() < 2 {
        return Err(Error::validation("merging requires at least two clips"));
    }
    for clip in clips {
        if !clip.has_audio() {
            return Err(Error::validation(format!(
                "{} has no audio stream",
                clip.path.display()
            )));
        }
    }

    let mut graph = FilterGraph::new();
    for i in 0..clips.len() {
        graph.add(
            FilterChain::new()
                .input(format!("{i}:a"))
                .filter(Filter::new("aresample").arg(enc.sample_rate))
                .filter(
                    Filter::new("aformat")
                        .named("sample_fmts", "fltp")
                        .named("channel_layouts", "stereo"),
                )
                .output(format!("a{i}")),
        );
    }
    let mut tail = FilterChain::new();
    for i in 0..clips.len() {
        tail = tail.input(format!("a{i}"));
    }
    tail = tail.filter(
        Filter::new("concat")
            .named("n", clips.len())
            .named("v", 0)
            .named("a", 1),
    );
    graph.add(tail.output("aout"));

    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let (codec, lossy) = audio_codec_for_ext(&ext);

    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "merge audio tracks")
        .arg("-y");
    for clip in clips {
        spec = spec.args(["-i", path_arg(&clip.path).as_str()]);
    }
    spec = spec
        .args(["-filter_complex", graph.render().as_str()])
        .args(["-map", "[aout]", "-c:a", codec]);
    if lossy {
        spec = spec.args(["-b:a", enc.audio_bitrate.as_str()]);
    }
    spec = spec.arg(path_arg(output));

    Ok(BuildPlan::single(spec))
}
