//! Trim builders: keep-range trims and interior range deletion.

use std::path::Path;

use reelcut_core::config::EncodeConfig;
use reelcut_core::{Error, Result};

use crate::command::{CommandSpec, ToolKind};
use crate::filter::{Filter, FilterChain, FilterGraph};
use crate::probe::MediaProbeResult;

use super::{audio_encode_args, fmt_secs, path_arg, video_encode_args, BuildPlan, TIME_EPSILON};

fn check_range(probe: &MediaProbeResult, start: f64, duration: f64) -> Result<()> {
    if !(start.is_finite() && start >= 0.0) {
        return Err(Error::validation("start must be a non-negative number"));
    }
    if !(duration.is_finite() && duration > 0.0) {
        return Err(Error::validation("duration must be a positive number"));
    }
    if start + duration > probe.duration_secs + TIME_EPSILON {
        return Err(Error::validation(format!(
            "range {}..{} exceeds media duration {}",
            fmt_secs(start),
            fmt_secs(start + duration),
            fmt_secs(probe.duration_secs)
        )));
    }
    Ok(())
}

/// Keep `[start, start + duration)` of the input, dropping the rest.
pub fn trim(
    input: &Path,
    probe: &MediaProbeResult,
    start: f64,
    duration: f64,
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    check_range(probe, start, duration)?;
    if !probe.has_video() && !probe.has_audio() {
        return Err(Error::validation("input has neither video nor audio"));
    }

    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "trim").args([
        "-y",
        "-ss",
        fmt_secs(start).as_str(),
        "-i",
        path_arg(input).as_str(),
        "-t",
        fmt_secs(duration).as_str(),
    ]);
    if probe.has_video() {
        spec = spec.args(["-map", "0:v:0"]).args(video_encode_args(enc));
    }
    if probe.has_audio() {
        spec = spec.args(["-map", "0:a:0"]).args(audio_encode_args(enc));
    }
    spec = spec.arg(path_arg(output));
    Ok(BuildPlan::single(spec))
}

/// Delete the interior range `[start, start + duration)` from the video
/// track, keeping everything around it.
///
/// Video is rebuilt from the two surviving segments and concatenated. Audio
/// is NOT spliced the same way: it is shortened from the end to the new total
/// length, so audio after the cut point stays offset relative to the video.
/// That asymmetry matches the upstream editor this core reproduces.
pub fn delete_video_range(
    input: &Path,
    probe: &MediaProbeResult,
    start: f64,
    duration: f64,
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    check_range(probe, start, duration)?;
    if !probe.has_video() {
        return Err(Error::validation("input has no video stream"));
    }

    let total = probe.duration_secs;
    let end = start + duration;
    let keep_head = start > TIME_EPSILON;
    let keep_tail = end < total - TIME_EPSILON;
    if !keep_head && !keep_tail {
        return Err(Error::validation(
            "deleted range covers the entire file; nothing would remain",
        ));
    }

    let mut graph = FilterGraph::new();
    match (keep_head, keep_tail) {
        (true, true) => {
            graph.add(
                FilterChain::new()
                    .input("0:v")
                    .filter(Filter::new("trim").named("start", 0).named("end", fmt_secs(start)))
                    .filter(Filter::new("setpts").arg("PTS-STARTPTS"))
                    .output("v0"),
            );
            graph.add(
                FilterChain::new()
                    .input("0:v")
                    .filter(Filter::new("trim").named("start", fmt_secs(end)))
                    .filter(Filter::new("setpts").arg("PTS-STARTPTS"))
                    .output("v1"),
            );
            graph.add(
                FilterChain::new()
                    .input("v0")
                    .input("v1")
                    .filter(Filter::new("concat").named("n", 2).named("v", 1).named("a", 0))
                    .output("vout"),
            );
        }
        (true, false) => {
            graph.add(
                FilterChain::new()
                    .input("0:v")
                    .filter(Filter::new("trim").named("start", 0).named("end", fmt_secs(start)))
                    .filter(Filter::new("setpts").arg("PTS-STARTPTS"))
                    .output("vout"),
            );
        }
        (false, true) => {
            graph.add(
                FilterChain::new()
                    .input("0:v")
                    .filter(Filter::new("trim").named("start", fmt_secs(end)))
                    .filter(Filter::new("setpts").arg("PTS-STARTPTS"))
                    .output("vout"),
            );
        }
        (false, false) => unreachable!(),
    }

    // Audio keeps its original timeline and is clipped to the shortened
    // total from the end.
    if probe.has_audio() {
        graph.add(
            FilterChain::new()
                .input("0:a")
                .filter(Filter::new("atrim").named("start", 0).named("end", fmt_secs(total - duration)))
                .filter(Filter::new("asetpts").arg("PTS-STARTPTS"))
                .output("aout"),
        );
    }

    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "cut video range")
        .args(["-y", "-i", path_arg(input).as_str()])
        .args(["-filter_complex", graph.render().as_str()])
        .args(["-map", "[vout]"])
        .args(video_encode_args(enc));
    if probe.has_audio() {
        spec = spec.args(["-map", "[aout]"]).args(audio_encode_args(enc));
    }
    spec = spec.arg(path_arg(output));
    Ok(BuildPlan::single(spec))
}

/// Delete the interior range `[start, start + duration)` from the audio
/// track only, leaving the video untouched.
///
/// The shortened audio is padded back out to the video duration so the
/// container's streams stay the same length.
pub fn delete_audio_range(
    input: &Path,
    probe: &MediaProbeResult,
    start: f64,
    duration: f64,
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    check_range(probe, start, duration)?;
    if !probe.has_audio() {
        return Err(Error::validation("input has no audio stream"));
    }

    let total = probe.duration_secs;
    let end = start + duration;
    let keep_head = start > TIME_EPSILON;
    let keep_tail = end < total - TIME_EPSILON;
    if !keep_head && !keep_tail {
        return Err(Error::validation(
            "deleted range covers the entire audio track",
        ));
    }

    let mut graph = FilterGraph::new();
    let mut segments = Vec::new();
    if keep_head {
        graph.add(
            FilterChain::new()
                .input("0:a")
                .filter(Filter::new("atrim").named("start", 0).named("end", fmt_secs(start)))
                .filter(Filter::new("asetpts").arg("PTS-STARTPTS"))
                .output("a0"),
        );
        segments.push("a0");
    }
    if keep_tail {
        graph.add(
            FilterChain::new()
                .input("0:a")
                .filter(Filter::new("atrim").named("start", fmt_secs(end)))
                .filter(Filter::new("asetpts").arg("PTS-STARTPTS"))
                .output("a1"),
        );
        segments.push("a1");
    }

    let mut tail = FilterChain::new();
    for seg in &segments {
        tail = tail.input(*seg);
    }
    if segments.len() > 1 {
        tail = tail.filter(
            Filter::new("concat")
                .named("n", segments.len())
                .named("v", 0)
                .named("a", 1),
        );
    }
    if probe.has_video() {
        tail = tail.filter(Filter::new("apad").named("whole_dur", fmt_secs(total)));
    }
    graph.add(tail.output("aout"));

    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "cut audio range")
        .args(["-y", "-i", path_arg(input).as_str()])
        .args(["-filter_complex", graph.render().as_str()]);
    if probe.has_video() {
        spec = spec.args(["-map", "0:v:0", "-c:v", "copy"]);
    }
    spec = spec
        .args(["-map", "[aout]"])
        .args(audio_encode_args(enc))
        .arg(path_arg(output));
    Ok(BuildPlan::single(spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{AudioStreamInfo, VideoStreamInfo};
    use std::path::PathBuf;

    fn probe_with_audio(duration: f64) -> MediaProbeResult {
        MediaProbeResult {
            path: PathBuf::from("/test/clip.mp4"),
            duration_secs: duration,
            format_name: "mov,mp4,m4a,3gp,3g2,mj2".into(),
            file_size: 1024,
            video: Some(VideoStreamInfo {
                codec: "h264".into(),
                width: 1920,
                height: 1080,
                frame_rate: Some(30.0),
            }),
            audio: Some(AudioStreamInfo {
                codec: "aac".into(),
                channels: 2,
                sample_rate: Some(44100),
            }),
        }
    }

    fn probe_without_audio(duration: f64) -> MediaProbeResult {
        let mut p = probe_with_audio(duration);
        p.audio = None;
        p
    }

    #[test]
    fn trim_maps_both_streams_when_audio_present() {
        let probe = probe_with_audio(10.0);
        let plan = trim(
            &probe.path.clone(),
            &probe,
            2.0,
            3.0,
            &EncodeConfig::default(),
            Path::new("/out/trimmed.mp4"),
        )
        .unwrap();
        assert_eq!(plan.passes.len(), 1);
        let args = &plan.passes[0].args;
        assert!(args.contains(&"-ss".to_string()));
        assert!(args.contains(&"2".to_string()));
        assert!(args.contains(&"3".to_string()));
        assert!(args.contains(&"0:v:0".to_string()));
        assert!(args.contains(&"0:a:0".to_string()));
    }

    #[test]
    fn trim_omits_audio_mapping_without_audio_stream() {
        let probe = probe_without_audio(10.0);
        let plan = trim(
            &probe.path.clone(),
            &probe,
            2.0,
            3.0,
            &EncodeConfig::default(),
            Path::new("/out/trimmed.mp4"),
        )
        .unwrap();
        let args = &plan.passes[0].args;
        assert!(!args.contains(&"0:a:0".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
    }

    #[test]
    fn trim_rejects_out_of_range_requests() {
        let probe = probe_with_audio(10.0);
        let enc = EncodeConfig::default();
        let out = Path::new("/out/x.mp4");
        assert!(trim(&probe.path.clone(), &probe, -1.0, 3.0, &enc, out).is_err());
        assert!(trim(&probe.path.clone(), &probe, 0.0, 0.0, &enc, out).is_err());
        assert!(trim(&probe.path.clone(), &probe, 8.0, 3.0, &enc, out).is_err());
    }

    #[test]
    fn delete_video_range_builds_two_segments_and_shortens_audio() {
        let probe = probe_with_audio(10.0);
        let plan = delete_video_range(
            &probe.path.clone(),
            &probe,
            2.0,
            3.0,
            &EncodeConfig::default(),
            Path::new("/out/cut.mp4"),
        )
        .unwrap();
        let args = &plan.passes[0].args;
        let graph_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &args[graph_pos + 1];

        // Two video segments spliced around the deleted range.
        assert!(graph.contains("trim=start=0:end=2"));
        assert!(graph.contains("trim=start=5"));
        assert!(graph.contains("concat=n=2:v=1:a=0"));
        // Audio independently clipped to total - deleted, not spliced.
        assert!(graph.contains("atrim=start=0:end=7"));
        assert!(!graph.contains("concat=n=2:v=0:a=1"));
        assert!(args.contains(&"[vout]".to_string()));
        assert!(args.contains(&"[aout]".to_string()));
    }

    #[test]
    fn delete_video_range_at_file_start_uses_single_segment() {
        let probe = probe_without_audio(10.0);
        let plan = delete_video_range(
            &probe.path.clone(),
            &probe,
            0.0,
            4.0,
            &EncodeConfig::default(),
            Path::new("/out/cut.mp4"),
        )
        .unwrap();
        let args = &plan.passes[0].args;
        let graph_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &args[graph_pos + 1];
        assert!(graph.contains("trim=start=4"));
        assert!(!graph.contains("concat"));
        // No audio chain at all for an audio-less input.
        assert!(!graph.contains("atrim"));
        assert!(!args.contains(&"[aout]".to_string()));
    }

    #[test]
    fn delete_video_range_rejects_full_file() {
        let probe = probe_with_audio(10.0);
        let result = delete_video_range(
            &probe.path.clone(),
            &probe,
            0.0,
            10.0,
            &EncodeConfig::default(),
            Path::new("/out/cut.mp4"),
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn delete_audio_range_splices_audio_and_copies_video() {
        let probe = probe_with_audio(10.0);
        let plan = delete_audio_range(
            &probe.path.clone(),
            &probe,
            2.0,
            3.0,
            &EncodeConfig::default(),
            Path::new("/out/cut.mp4"),
        )
        .unwrap();
        let args = &plan.passes[0].args;
        let graph_pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &args[graph_pos + 1];

        assert!(graph.contains("atrim=start=0:end=2"));
        assert!(graph.contains("atrim=start=5"));
        assert!(graph.contains("concat=n=2:v=0:a=1"));
        assert!(graph.contains("apad=whole_dur=10"));

        // Video is stream-copied, never re-encoded.
        let copy_pos = args.iter().position(|a| a == "-c:v").unwrap();
        assert_eq!(args[copy_pos + 1], "copy");
    }

    #[test]
    fn delete_audio_range_requires_audio() {
        let probe = probe_without_audio(10.0);
        let result = delete_audio_range(
            &probe.path.clone(),
            &probe,
            2.0,
            3.0,
            &EncodeConfig::default(),
            Path::new("/out/cut.mp4"),
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
