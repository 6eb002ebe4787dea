//! Audio builders: track insertion (file audio or generated silence),
//! extraction, and volume adjustment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use reelcut_core::config::EncodeConfig;
use reelcut_core::{Error, Result};

use crate::command::{CommandSpec, ToolKind};
use crate::filter::{Filter, FilterChain, FilterGraph};
use crate::probe::MediaProbeResult;

use super::{
    audio_encode_args, fmt_secs, near_silent_source, path_arg, BuildPlan, NEAR_SILENT_VOLUME,
    TIME_EPSILON,
};

/// How inserted audio interacts with the existing track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    /// Overlay at the offset, summed with the existing audio; total duration
    /// is padded/clipped to the video duration.
    #[default]
    Mix,
    /// Excise the targeted range from the existing audio and splice the
    /// insert in; total duration is padded/clipped to the video duration.
    Overwrite,
    /// Split the existing audio at the offset and push the tail back; no
    /// padding, so the total duration grows by the inserted length.
    Push,
}

impl std::str::FromStr for InsertMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mix" => Ok(InsertMode::Mix),
            "overwrite" => Ok(InsertMode::Overwrite),
            "push" => Ok(InsertMode::Push),
            other => Err(format!(
                "unknown insert mode '{other}' (expected mix, overwrite, or push)"
            )),
        }
    }
}

impl std::fmt::Display for InsertMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InsertMode::Mix => "mix",
            InsertMode::Overwrite => "overwrite",
            InsertMode::Push => "push",
        };
        f.write_str(s)
    }
}

/// Map an output extension to an ffmpeg audio encoder. The bool marks lossy
/// codecs that take a bitrate.
pub(crate) fn audio_codec_for_ext(ext: &str) -> (&'static str, bool) {
    match ext {
        "mp3" => ("libmp3lame", true),
        "wav" => ("pcm_s16le", false),
        "flac" => ("flac", false),
        "ogg" | "opus" => ("libopus", true),
        _ => ("aac", true),
    }
}

fn check_insert_params(base: &MediaProbeResult, offset: f64, duration: f64) -> Result<()> {
    if !(offset.is_finite() && offset >= 0.0) {
        return Err(Error::validation("offset must be a non-negative number"));
    }
    if !(duration.is_finite() && duration > 0.0) {
        return Err(Error::validation(
            "inserted audio must have a positive duration",
        ));
    }
    if offset > base.duration_secs + TIME_EPSILON {
        return Err(Error::validation(format!(
            "offset {} is past the end of the file ({})",
            fmt_secs(offset),
            fmt_secs(base.duration_secs)
        )));
    }
    Ok(())
}

/// Build the insertion graph shared by [`add_audio`] and [`insert_silence`].
///
/// Input 0 is the base file, input 1 the inserted audio; `source_filters`
/// are applied to the insert before normalization (e.g. the near-silent
/// volume drop for generated tones).
fn insertion_graph(
    base: &MediaProbeResult,
    source_filters: Vec<Filter>,
    offset: f64,
    duration: f64,
    mode: InsertMode,
    enc: &EncodeConfig,
) -> FilterGraph {
    let total = base.duration_secs;
    let delay_ms = (offset * 1000.0).round() as i64;
    let pad_to_video = base.has_video() && mode != InsertMode::Push;

    let mut graph = FilterGraph::new();

    // Normalized insert chain.
    let mut ins = FilterChain::new().input("1:a");
    for f in source_filters {
        ins = ins.filter(f);
    }
    ins = ins
        .filter(Filter::new("aresample").arg(enc.sample_rate))
        .filter(
            Filter::new("aformat")
                .named("sample_fmts", "fltp")
                .named("channel_layouts", "stereo"),
        );

    if !base.has_audio() {
        // Nothing to combine with: the delayed insert becomes the track.
        let mut chain = ins.filter(Filter::new("adelay").named("delays", delay_ms).named("all", 1));
        if pad_to_video {
            chain = chain
                .filter(Filter::new("apad").named("whole_dur", fmt_secs(total)))
                .filter(Filter::new("atrim").named("end", fmt_secs(total)));
        }
        graph.add(chain.output("aout"));
        return graph;
    }

    match mode {
        InsertMode::Mix => {
            graph.add(
                ins.filter(Filter::new("adelay").named("delays", delay_ms).named("all", 1))
                    .output("ins"),
            );
            graph.add(
                FilterChain::new()
                    .input("0:a")
                    .filter(Filter::new("aresample").arg(enc.sample_rate))
                    .filter(
                        Filter::new("aformat")
                            .named("sample_fmts", "fltp")
                            .named("channel_layouts", "stereo"),
                    )
                    .output("base"),
            );
            let mut chain = FilterChain::new().input("base").input("ins").filter(
                Filter::new("amix")
                    .named("inputs", 2)
                    .named("duration", "longest")
                    .named("normalize", 0),
            );
            if pad_to_video {
                chain = chain
                    .filter(Filter::new("apad").named("whole_dur", fmt_secs(total)))
                    .filter(Filter::new("atrim").named("end", fmt_secs(total)));
            }
            graph.add(chain.output("aout"));
        }
        InsertMode::Overwrite | InsertMode::Push => {
            graph.add(ins.output("ins"));

            // For overwrite the tail resumes after the excised range; for
            // push it resumes at the offset itself, shifted back.
            let tail_start = match mode {
                InsertMode::Overwrite => offset + duration,
                _ => offset,
            };

            let mut segments = Vec::new();
            if offset > TIME_EPSILON {
                graph.add(
                    FilterChain::new()
                        .input("0:a")
                        .filter(Filter::new("atrim").named("end", fmt_secs(offset)))
                        .filter(Filter::new("asetpts").arg("PTS-STARTPTS"))
                        .output("pre"),
                );
                segments.push("pre".to_string());
            }
            segments.push("ins".to_string());
            if tail_start < total - TIME_EPSILON {
                graph.add(
                    FilterChain::new()
                        .input("0:a")
                        .filter(Filter::new("atrim").named("start", fmt_secs(tail_start)))
                        .filter(Filter::new("asetpts").arg("PTS-STARTPTS"))
                        .output("post"),
                );
                segments.push("post".to_string());
            }

            let mut chain = FilterChain::new();
            for seg in &segments {
                chain = chain.input(seg.clone());
            }
            if segments.len() > 1 {
                chain = chain.filter(
                    Filter::new("concat")
                        .named("n", segments.len())
                        .named("v", 0)
                        .named("a", 1),
                );
            }
            if pad_to_video {
                chain = chain
                    .filter(Filter::new("apad").named("whole_dur", fmt_secs(total)))
                    .filter(Filter::new("atrim").named("end", fmt_secs(total)));
            }
            graph.add(chain.output("aout"));
        }
    }

    graph
}

fn append_insertion_args(
    mut spec: CommandSpec,
    base: &MediaProbeResult,
    graph: &FilterGraph,
    enc: &EncodeConfig,
    output: &Path,
) -> CommandSpec {
    spec = spec.args(["-filter_complex", graph.render().as_str()]);
    if base.has_video() {
        spec = spec.args(["-map", "0:v:0", "-c:v", "copy"]);
    }
    spec.args(["-map", "[aout]"])
        .args(audio_encode_args(enc))
        .arg(path_arg(output))
}

/// Insert audio from another file into `base` at `offset`.
pub fn add_audio(
    base: &MediaProbeResult,
    source: &Path,
    source_duration: f64,
    offset: f64,
    mode: InsertMode,
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    check_insert_params(base, offset, source_duration)?;

    let graph = insertion_graph(base, Vec::new(), offset, source_duration, mode, enc);
    let spec = CommandSpec::new(ToolKind::Ffmpeg, "add audio")
        .args(["-y", "-i", path_arg(&base.path).as_str(), "-i", path_arg(source).as_str()]);
    Ok(BuildPlan::single(append_insertion_args(
        spec, base, &graph, enc, output,
    )))
}

/// Insert a near-silent generated tone into `base` at `offset`.
pub fn insert_silence(
    base: &MediaProbeResult,
    offset: f64,
    duration: f64,
    mode: InsertMode,
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    check_insert_params(base, offset, duration)?;

    let source_filters = vec![Filter::new("volume").arg(NEAR_SILENT_VOLUME)];
    let graph = insertion_graph(base, source_filters, offset, duration, mode, enc);
    let spec = CommandSpec::new(ToolKind::Ffmpeg, "insert silence")
        .args(["-y", "-i", path_arg(&base.path).as_str()])
        .args(["-f", "lavfi", "-t", fmt_secs(duration).as_str(), "-i"])
        .arg(near_silent_source(enc.sample_rate));
    Ok(BuildPlan::single(append_insertion_args(
        spec, base, &graph, enc, output,
    )))
}

/// Generate a standalone near-silent audio file.
pub fn generate_silence(duration: f64, enc: &EncodeConfig, output: &Path) -> Result<BuildPlan> {
    if !(duration.is_finite() && duration > 0.0) {
        return Err(Error::validation("duration must be a positive number"));
    }

    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let (codec, lossy) = audio_codec_for_ext(&ext);

    let mut af = FilterGraph::new();
    af.add(FilterChain::new().filter(Filter::new("volume").arg(NEAR_SILENT_VOLUME)));

    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "generate silence")
        .args(["-y", "-f", "lavfi", "-t", fmt_secs(duration).as_str(), "-i"])
        .arg(near_silent_source(enc.sample_rate))
        .args(["-filter:a", af.render().as_str()])
        .args(["-c:a", codec]);
    if lossy {
        spec = spec.args(["-b:a", enc.audio_bitrate.as_str()]);
    }
    spec = spec.arg(path_arg(output));
    Ok(BuildPlan::single(spec))
}

/// Extract the audio track into its own file; codec chosen from the output
/// extension.
pub fn extract_audio(
    probe: &MediaProbeResult,
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    if !probe.has_audio() {
        return Err(Error::validation("input has no audio stream"));
    }

    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let (codec, lossy) = audio_codec_for_ext(&ext);

    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "extract audio")
        .args(["-y", "-i", path_arg(&probe.path).as_str()])
        .args(["-vn", "-map", "0:a:0", "-c:a", codec]);
    if lossy {
        spec = spec.args(["-b:a", enc.audio_bitrate.as_str()]);
    }
    spec = spec.arg(path_arg(output));
    Ok(BuildPlan::single(spec))
}

/// Scale the audio track's volume by `factor` (1.0 = unchanged).
pub fn adjust_volume(
    probe: &MediaProbeResult,
    factor: f64,
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(Error::validation("volume factor must be a positive number"));
    }
    if !probe.has_audio() {
        return Err(Error::validation("input has no audio stream"));
    }

    let mut af = FilterGraph::new();
    af.add(FilterChain::new().filter(Filter::new("volume").arg(fmt_secs(factor))));

    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "adjust volume")
        .args(["-y", "-i", path_arg(&probe.path).as_str()]);
    if probe.has_video() {
        spec = spec.args(["-map", "0:v:0", "-c:v", "copy"]);
    }
    spec = spec
        .args(["-map", "0:a:0", "-filter:a", af.render().as_str()])
        .args(audio_encode_args(enc))
        .arg(path_arg(output));
    Ok(BuildPlan::single(spec))
}
