//! Text overlay (drawtext) with time-windowed segment planning.
//!
//! When the overlay covers only part of a longer file, re-encoding the whole
//! file wastes time on frames that do not change. The builder instead plans
//! three segment passes -- stream-copy before the window, encode only the
//! window with the overlay, stream-copy after -- and a concat-demuxer pass to
//! stitch them. When the window spans the whole file there is nothing to copy
//! around, so a single whole-file encode is built.

use std::path::Path;

use reelcut_core::config::EncodeConfig;
use reelcut_core::{Error, Result};

use crate::command::{CommandSpec, ToolKind};
use crate::filter::{Filter, FilterChain, FilterGraph};
use crate::probe::MediaProbeResult;

use super::{
    fmt_secs, path_arg, video_encode_args, BuildPlan, SupportFile, TIME_EPSILON,
};

/// Overlay appearance. The x/y fields are drawtext position expressions.
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font_size: u32,
    pub font_color: String,
    pub x: String,
    pub y: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 36,
            font_color: "white".into(),
            x: "(w-text_w)/2".into(),
            y: "h-text_h-32".into(),
        }
    }
}

fn drawtext_filter(text: &str, style: &TextStyle) -> Filter {
    Filter::new("drawtext")
        .named("text", text)
        .named("fontsize", style.font_size)
        .named("fontcolor", &style.font_color)
        .named("x", &style.x)
        .named("y", &style.y)
}

/// Overlay `text` on the video between `start` and `end` (defaulting to the
/// whole file).
pub fn add_text(
    input: &Path,
    probe: &MediaProbeResult,
    text: &str,
    start: Option<f64>,
    end: Option<f64>,
    style: &TextStyle,
    staging_dir: &Path,
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    if text.trim().is_empty() {
        return Err(Error::validation("overlay text must not be empty"));
    }
    if !probe.has_video() {
        return Err(Error::validation("input has no video stream"));
    }

    let total = probe.duration_secs;
    let start = start.unwrap_or(0.0);
    let end = end.unwrap_or(total);
    if !(start.is_finite() && start >= 0.0) {
        return Err(Error::validation("start must be a non-negative number"));
    }
    if !(end.is_finite() && end > start) {
        return Err(Error::validation("end must be greater than start"));
    }
    if end > total + TIME_EPSILON {
        return Err(Error::validation(format!(
            "window {}..{} exceeds media duration {}",
            fmt_secs(start),
            fmt_secs(end),
            fmt_secs(total)
        )));
    }

    let copy_head = start > TIME_EPSILON;
    let copy_tail = end < total - TIME_EPSILON;

    // Whole-file window: re-encoding everything is unavoidable.
    if !copy_head && !copy_tail {
        let mut graph = FilterGraph::new();
        graph.add(
            FilterChain::new()
                .input("0:v")
                .filter(drawtext_filter(text, style))
                .output("vout"),
        );
        let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "overlay text")
            .args(["-y", "-i", path_arg(input).as_str()])
            .args(["-filter_complex", graph.render().as_str()])
            .args(["-map", "[vout]"])
            .args(video_encode_args(enc));
        if probe.has_audio() {
            spec = spec.args(["-map", "0:a:0", "-c:a", "copy"]);
        }
        spec = spec.arg(path_arg(output));
        return Ok(BuildPlan::single(spec));
    }

    // Sub-range window: copy the unchanged segments, encode only the window.
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());

    let mut plan = BuildPlan::default();
    let mut segments = Vec::new();

    if copy_head {
        let seg = staging_dir.join(format!("segment_before.{ext}"));
        plan.push(
            CommandSpec::new(ToolKind::Ffmpeg, "copy segment before overlay")
                .args(["-y", "-ss", "0", "-i", path_arg(input).as_str()])
                .args(["-t", fmt_secs(start).as_str(), "-c", "copy"])
                .arg(path_arg(&seg)),
        );
        segments.push(seg);
    }

    let windowed = staging_dir.join(format!("segment_overlay.{ext}"));
    let mut graph = FilterGraph::new();
    graph.add(
        FilterChain::new()
            .input("0:v")
            .filter(drawtext_filter(text, style))
            .output("vout"),
    );
    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "encode overlay window")
        .args(["-y", "-ss", fmt_secs(start).as_str(), "-i", path_arg(input).as_str()])
        .args(["-t", fmt_secs(end - start).as_str()])
        .args(["-filter_complex", graph.render().as_str()])
        .args(["-map", "[vout]"])
        .args(video_encode_args(enc));
    if probe.has_audio() {
        spec = spec.args(["-map", "0:a:0", "-c:a", "copy"]);
    }
    plan.push(spec.arg(path_arg(&windowed)));
    segments.push(windowed);

    if copy_tail {
        let seg = staging_dir.join(format!("segment_after.{ext}"));
        plan.push(
            CommandSpec::new(ToolKind::Ffmpeg, "copy segment after overlay")
                .args(["-y", "-ss", fmt_secs(end).as_str(), "-i", path_arg(input).as_str()])
                .args(["-c", "copy"])
                .arg(path_arg(&seg)),
        );
        segments.push(seg);
    }

    // Concat demuxer list; single quotes in paths are closed-escaped-reopened.
    let list_path = staging_dir.join("concat_list.txt");
    let mut contents = String::new();
    for seg in &segments {
        let quoted = seg.to_string_lossy().replace('\'', "'\\''");
        contents.push_str(&format!("file '{quoted}'\n"));
    }
    plan.support_files.push(SupportFile {
        path: list_path.clone(),
        contents,
    });

    plan.push(
        CommandSpec::new(ToolKind::Ffmpeg, "concatenate segments")
            .args(["-y", "-f", "concat", "-safe", "0", "-i", path_arg(&list_path).as_str()])
            .args(["-c", "copy"])
            .arg(path_arg(output)),
    );

    Ok(plan)
}
