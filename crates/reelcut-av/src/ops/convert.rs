//! Re-encoding, arbitrary filter application, and waveform rendering.

use std::path::Path;

use reelcut_core::config::EncodeConfig;
use reelcut_core::{Error, Result};

use crate::command::{CommandSpec, ToolKind};
use crate::filter::{Filter, FilterChain, FilterGraph};
use crate::probe::MediaProbeResult;

use super::{audio_encode_args, path_arg, video_encode_args, BuildPlan};

const AUDIO_ONLY_EXTS: &[&str] = &["mp3", "m4a", "aac", "wav", "flac", "ogg", "opus"];

/// Re-encode the input into the container implied by the output extension.
pub fn reencode(probe: &MediaProbeResult, enc: &EncodeConfig, output: &Path) -> Result<BuildPlan> {
    if !probe.has_video() && !probe.has_audio() {
        return Err(Error::validation("input has neither video nor audio"));
    }

    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if probe.has_video() && AUDIO_ONLY_EXTS.contains(&ext.as_str()) {
        return Err(Error::validation(format!(
            "'{ext}' is an audio container; use extract-audio to drop the video track"
        )));
    }

    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "re-encode")
        .args(["-y", "-i", path_arg(&probe.path).as_str()]);
    if probe.has_video() {
        spec = spec.args(["-map", "0:v:0"]).args(video_encode_args(enc));
    }
    if probe.has_audio() {
        spec = spec.args(["-map", "0:a:0"]).args(audio_encode_args(enc));
    }
    // Progressive-download layout for MP4-family outputs.
    if matches!(ext.as_str(), "mp4" | "m4v" | "mov") {
        spec = spec.args(["-movflags", "+faststart"]);
    }
    spec = spec.arg(path_arg(output));
    Ok(BuildPlan::single(spec))
}

/// Apply caller-supplied video and/or audio filter expressions.
///
/// Streams without a filter are stream-copied rather than re-encoded.
pub fn apply_filter(
    probe: &MediaProbeResult,
    video_filter: Option<&str>,
    audio_filter: Option<&str>,
    enc: &EncodeConfig,
    output: &Path,
) -> Result<BuildPlan> {
    let video_filter = video_filter.map(str::trim).filter(|s| !s.is_empty());
    let audio_filter = audio_filter.map(str::trim).filter(|s| !s.is_empty());

    if video_filter.is_none() && audio_filter.is_none() {
        return Err(Error::validation("no filter specified"));
    }
    if video_filter.is_some() && !probe.has_video() {
        return Err(Error::validation("input has no video stream to filter"));
    }
    if audio_filter.is_some() && !probe.has_audio() {
        return Err(Error::validation("input has no audio stream to filter"));
    }

    let mut spec = CommandSpec::new(ToolKind::Ffmpeg, "apply filter")
        .args(["-y", "-i", path_arg(&probe.path).as_str()]);
    if probe.has_video() {
        match video_filter {
            Some(vf) => {
                spec = spec.args(["-vf", vf]).args(video_encode_args(enc));
            }
            None => {
                spec = spec.args(["-c:v", "copy"]);
            }
        }
    }
    if probe.has_audio() {
        match audio_filter {
            Some(af) => {
                spec = spec.args(["-af", af]).args(audio_encode_args(enc));
            }
            None => {
                spec = spec.args(["-c:a", "copy"]);
            }
        }
    }
    spec = spec.arg(path_arg(output));
    Ok(BuildPlan::single(spec))
}

/// Render the audio track's waveform into a still image.
pub fn waveform(
    probe: &MediaProbeResult,
    width: u32,
    height: u32,
    color: Option<&str>,
    output: &Path,
) -> Result<BuildPlan> {
    if !probe.has_audio() {
        return Err(Error::validation("input has no audio stream"));
    }
    if width == 0 || height == 0 {
        return Err(Error::validation("waveform dimensions must be non-zero"));
    }

    let mut graph = FilterGraph::new();
    graph.add(
        FilterChain::new()
            .input("0:a")
            .filter(Filter::new("aformat").named("channel_layouts", "mono"))
            .filter(
                Filter::new("showwavespic")
                    .named("s", format!("{width}x{height}"))
                    .named("colors", color.unwrap_or("0x3399ff")),
            )
            .output("vout"),
    );

    let spec = CommandSpec::new(ToolKind::Ffmpeg, "render waveform")
        .args(["-y", "-i", path_arg(&probe.path).as_str()])
        .args(["-filter_complex", graph.render().as_str()])
        .args(["-map", "[vout]", "-frames:v", "1"])
        .arg(path_arg(output));
    Ok(BuildPlan::single(spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{AudioStreamInfo, VideoStreamInfo};
    use std::path::PathBuf;

    fn probe(has_video: bool, has_audio: bool) -> MediaProbeResult {
        MediaProbeResult {
            path: PathBuf::from("/test/clip.avi"),
            duration_secs: 10.0,
            format_name: "avi".into(),
            file_size: 1024,
            video: has_video.then(|| VideoStreamInfo {
                codec: "mpeg4".into(),
                width: 1280,
                height: 720,
                frame_rate: Some(25.0),
            }),
            audio: has_audio.then(|| AudioStreamInfo {
                codec: "mp3".into(),
                channels: 2,
                sample_rate: Some(44100),
            }),
        }
    }

    #[test]
    fn reencode_maps_existing_streams() {
        let p = probe(true, true);
        let plan = reencode(&p, &EncodeConfig::default(), Path::new("/out/clip.mp4")).unwrap();
        let args = &plan.passes[0].args;
        assert!(args.contains(&"0:v:0".to_string()));
        assert!(args.contains(&"0:a:0".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
    }

    #[test]
    fn reencode_omits_audio_args_without_audio() {
        let p = probe(true, false);
        let plan = reencode(&p, &EncodeConfig::default(), Path::new("/out/clip.mkv")).unwrap();
        let args = &plan.passes[0].args;
        assert!(!args.contains(&"0:a:0".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
        // faststart only applies to the MP4 family.
        assert!(!args.contains(&"+faststart".to_string()));
    }

    #[test]
    fn reencode_rejects_audio_container_for_video_input() {
        let p = probe(true, true);
        let result = reencode(&p, &EncodeConfig::default(), Path::new("/out/clip.mp3"));
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn apply_filter_copies_unfiltered_streams() {
        let p = probe(true, true);
        let plan = apply_filter(
            &p,
            Some("hue=s=0"),
            None,
            &EncodeConfig::default(),
            Path::new("/out/gray.mp4"),
        )
        .unwrap();
        let args = &plan.passes[0].args;
        assert!(args.contains(&"-vf".to_string()));
        assert!(args.contains(&"hue=s=0".to_string()));
        let pos = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[pos + 1], "copy");
    }

    #[test]
    fn apply_filter_requires_some_filter() {
        let p = probe(true, true);
        let result = apply_filter(
            &p,
            None,
            Some("   "),
            &EncodeConfig::default(),
            Path::new("/out/x.mp4"),
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn apply_filter_rejects_video_filter_on_audio_file() {
        let p = probe(false, true);
        let result = apply_filter(
            &p,
            Some("hue=s=0"),
            None,
            &EncodeConfig::default(),
            Path::new("/out/x.mp3"),
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn waveform_renders_single_frame() {
        let p = probe(false, true);
        let plan = waveform(&p, 800, 240, None, Path::new("/out/wave.png")).unwrap();
        let args = &plan.passes[0].args;
        let pos = args.iter().position(|a| a == "-filter_complex").unwrap();
        let graph = &args[pos + 1];
        assert!(graph.contains("showwavespic=s=800x240"));
        assert!(graph.contains("channel_layouts=mono"));
        assert!(args.contains(&"-frames:v".to_string()));
    }

    #[test]
    fn waveform_requires_audio() {
        let p = probe(true, false);
        let result = waveform(&p, 800, 240, None, Path::new("/out/wave.png"));
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
