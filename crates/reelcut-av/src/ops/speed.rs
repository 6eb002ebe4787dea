//! Playback speed adjustment.

use std::path::Path;

use reelcut_core::config::EncodeConfig;
use reelcut_core::{Error, Result};

use crate::command::{CommandSpec, ToolKind};
use crate::filter::{Filter, FilterChain, FilterGraph};
use crate::probe::MediaProbeResult;

use super::{audio_encode_args, fmt_secs, path_arg, video_encode_args, BuildPlan};

/// The `atempo` filter accepts 0.5..2.0 per stage; speeds outside that range
/// are reached by chaining stages multiplicatively.
const ATEMPO_MIN: f64 = 0.5;
const ATEMPO_MAX: f64 = 2.0;

/// Decompose a speed factor into a chain of `atempo` stages, each within
/// the filter's accepted range, whose product equals the requested speed.
pub fn atempo_stages(speed: f64) -> Vec<f64> {
    let mut stages = Vec::new();
    let mut remaining = speed;
    while remaining > ATEMPO_MAX {
        stages.push(ATEMPO_MAX);
        remaining /= ATEMPO_MAX;
    }
    while remaining < ATEMPO_MIN {
        stages.push(ATEMPO_MIN);
        remaining /= ATEMPO_MIN;
    }
    stages.push(remaining);
    stages
}

/// Change playback speed by `speed` (2.0 = twice as fast).
pub fn adjust_speed(
    probe: &MediaProbeResult,
    speed: f64,
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(Error::validation("speed must be a positive number"));
    }
    if !probe.has_video() && !probe.has_audio() {
        return Err(Error::validation("input has neither video nor audio"));
    }

    let mut graph = FilterGraph::new();
    if probe.has_video() {
        graph.add(
            FilterChain::new()
                .input("0:v")
                .filter(Filter::new("setpts").arg(format!("PTS/{}", fmt_secs(speed))))
                .output("vout"),
        );
    }
    if probe.has_audio() {
        let mut chain = FilterChain::new().input("0:a");
        for stage in atempo_stages(speed) {
            chain = chain.filter(Filter::new("atempo").arg(fmt_secs(stage)));
        }
        graph.add(chain.output("aout"));
    }

    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "adjust speed")
        .args(["-y", "-i", path_arg(&probe.path).as_str()])
        .args(["-filter_complex", graph.render().as_str()]);
    if probe.has_video() {
        spec = spec.args(["-map", "[vout]"]).args(video_encode_args(enc));
    }
    if probe.has_audio() {
        spec = spec.args(["-map", "[aout]"]).args(audio_encode_args(enc));
    }
    spec = spec.arg(path_arg(output));
    Ok(BuildPlan::single(spec))
}
