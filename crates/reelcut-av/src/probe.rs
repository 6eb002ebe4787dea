//! FFprobe-backed media probing.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format
//! -show_streams` and maps the JSON output into [`MediaProbeResult`]. Results
//! are produced fresh per call and never cached: the file on disk may change
//! between operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use reelcut_core::{Error, Result};

use crate::command::ToolCommand;

/// Summary of the first video stream of a file.
#[derive(Debug, Clone, Serialize)]
pub struct VideoStreamInfo {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<f64>,
}

/// Summary of the first audio stream of a file.
#[derive(Debug, Clone, Serialize)]
pub struct AudioStreamInfo {
    pub codec: String,
    pub channels: u32,
    pub sample_rate: Option<u32>,
}

/// Metadata extracted from one ffprobe invocation.
#[derive(Debug, Clone, Serialize)]
pub struct MediaProbeResult {
    /// The probed file.
    pub path: PathBuf,
    /// Container duration in seconds. Always finite and non-negative: an
    /// unparsable duration fails the probe instead of reading as zero.
    pub duration_secs: f64,
    /// Raw container format name as reported by ffprobe.
    pub format_name: String,
    /// File size in bytes.
    pub file_size: u64,
    /// First real video stream, if any (attached cover art is ignored).
    pub video: Option<VideoStreamInfo>,
    /// First audio stream, if any.
    pub audio: Option<AudioStreamInfo>,
}

impl MediaProbeResult {
    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct MediaProber {
    ffprobe_path: PathBuf,
}

impl MediaProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self { ffprobe_path }
    }

    /// Probe a file for container and stream metadata.
    ///
    /// # Errors
    ///
    /// - [`Error::Spawn`] / [`Error::Tool`] per the runner contract.
    /// - [`Error::Probe`] when the JSON output is unparsable or carries no
    ///   usable duration.
    pub async fn probe(&self, path: &Path) -> Result<MediaProbeResult> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = cmd.execute().await?;
        parse_probe_json(path, &output.stdout)
    }

    /// Cheaper variant answering only "does this file have an audio stream?".
    ///
    /// Selects only audio stream descriptors so ffprobe does not serialize
    /// the full metadata tree.
    pub async fn has_audio_stream(&self, path: &Path) -> Result<bool> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=codec_type",
            "-of",
            "csv=p=0",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = cmd.execute().await?;
        Ok(output.stdout.lines().any(|l| l.trim() == "audio"))
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    channels: Option<u32>,
    sample_rate: Option<String>,
    #[serde(default)]
    disposition: FfprobeDisposition,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeDisposition {
    #[serde(default)]
    attached_pic: u8,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse raw ffprobe JSON into a [`MediaProbeResult`].
///
/// Separated from the subprocess call so tests can run on fixture strings.
pub fn parse_probe_json(path: &Path, json: &str) -> Result<MediaProbeResult> {
    let ff: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::probe(format!("ffprobe JSON parse error: {e}")))?;

    let duration_secs = ff
        .format
        .duration
        .as_deref()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| {
            Error::probe(format!(
                "no usable duration reported for {}",
                path.display()
            ))
        })?;

    let file_size = ff
        .format
        .size
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let mut video = None;
    let mut audio = None;

    for stream in ff.streams {
        match stream.codec_type.as_deref() {
            // Cover art in audio files shows up as a video stream with the
            // attached_pic disposition; it is not a playable video track.
            Some("video") if stream.disposition.attached_pic == 0 => {
                if video.is_none() {
                    video = Some(VideoStreamInfo {
                        codec: stream.codec_name.unwrap_or_default(),
                        width: stream.width.unwrap_or(0),
                        height: stream.height.unwrap_or(0),
                        frame_rate: stream.r_frame_rate.as_deref().and_then(parse_frame_rate),
                    });
                }
            }
            Some("audio") => {
                if audio.is_none() {
                    audio = Some(AudioStreamInfo {
                        codec: stream.codec_name.unwrap_or_default(),
                        channels: stream.channels.unwrap_or(2),
                        sample_rate: stream.sample_rate.and_then(|s| s.parse().ok()),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(MediaProbeResult {
        path: path.to_path_buf(),
        duration_secs,
        format_name: ff.format.format_name.unwrap_or_default(),
        file_size,
        video,
        audio,
    })
}

/// Parse an ffprobe frame rate, given as a fraction ("24000/1001") or a
/// plain number.
fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let parts: Vec<&str> = rate_str.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 {
            return Some(num / den);
        }
    }
    rate_str.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO_WITH_AUDIO: &str = r#"{
        "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "10.000000", "size": "1048576"},
        "streams": [
            {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080, "r_frame_rate": "30000/1001"},
            {"codec_type": "audio", "codec_name": "aac", "channels": 2, "sample_rate": "44100"}
        ]
    }"#;

    const VIDEO_NO_AUDIO: &str = r#"{
        "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "5.25", "size": "2048"},
        "streams": [
            {"codec_type": "video", "codec_name": "h264", "width": 1280, "height": 720, "r_frame_rate": "25/1"}
        ]
    }"#;

    const MP3_WITH_COVER_ART: &str = r#"{
        "format": {"format_name": "mp3", "duration": "180.5", "size": "4096"},
        "streams": [
            {"codec_type": "audio", "codec_name": "mp3", "channels": 2, "sample_rate": "48000"},
            {"codec_type": "video", "codec_name": "mjpeg", "width": 600, "height": 600,
             "disposition": {"attached_pic": 1}}
        ]
    }"#;

    #[test]
    fn parse_video_with_audio() {
        let result = parse_probe_json(Path::new("/test/clip.mp4"), VIDEO_WITH_AUDIO).unwrap();
        assert_eq!(result.duration_secs, 10.0);
        assert_eq!(result.file_size, 1_048_576);
        assert!(result.has_video());
        assert!(result.has_audio());

        let video = result.video.unwrap();
        assert_eq!(video.width, 1920);
        assert_eq!(video.height, 1080);
        assert!((video.frame_rate.unwrap() - 29.97).abs() < 0.01);

        let audio = result.audio.unwrap();
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.sample_rate, Some(44100));
    }

    #[test]
    fn parse_video_without_audio() {
        let result = parse_probe_json(Path::new("/test/silent.mp4"), VIDEO_NO_AUDIO).unwrap();
        assert_eq!(result.duration_secs, 5.25);
        assert!(result.has_video());
        assert!(!result.has_audio());
    }

    #[test]
    fn cover_art_is_not_a_video_track() {
        let result = parse_probe_json(Path::new("/test/song.mp3"), MP3_WITH_COVER_ART).unwrap();
        assert!(!result.has_video());
        assert!(result.has_audio());
        assert_eq!(result.audio.unwrap().sample_rate, Some(48000));
    }

    #[test]
    fn missing_duration_is_probe_error() {
        let json = r#"{"format": {"format_name": "png_pipe"}, "streams": []}"#;
        let result = parse_probe_json(Path::new("/test/image.png"), json);
        assert!(matches!(result, Err(Error::Probe(_))));
    }

    #[test]
    fn garbage_duration_is_probe_error() {
        let json = r#"{"format": {"duration": "N/A"}, "streams": []}"#;
        let result = parse_probe_json(Path::new("/test/odd.bin"), json);
        assert!(matches!(result, Err(Error::Probe(_))));
    }

    #[test]
    fn invalid_json_is_probe_error() {
        let result = parse_probe_json(Path::new("/test/x"), "not json at all");
        assert!(matches!(result, Err(Error::Probe(_))));
    }

    #[test]
    fn frame_rate_fraction() {
        assert!((parse_frame_rate("24000/1001").unwrap() - 23.976).abs() < 0.01);
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("invalid"), None);
    }
}
