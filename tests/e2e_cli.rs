//! CLI end-to-end tests
//!
//! Tests for the reelcut command-line interface. Operation tests that need a
//! real ffmpeg/ffprobe are gated on the tools being installed.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the reelcut binary
#[allow(deprecated)]
fn reelcut_cmd() -> Command {
    Command::cargo_bin("reelcut").unwrap()
}

/// True when both ffmpeg and ffprobe respond on this machine.
fn ffmpeg_available() -> bool {
    let probe = |name: &str| {
        Command::new(name)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    };
    probe("ffmpeg") && probe("ffprobe")
}

/// Generate a short test clip with ffmpeg's synthetic sources.
fn make_test_clip(path: &PathBuf, seconds: u32, with_audio: bool) {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-f", "lavfi", "-i"]);
    cmd.arg(format!("testsrc=duration={seconds}:size=320x240:rate=25"));
    if with_audio {
        cmd.args(["-f", "lavfi", "-i"]);
        cmd.arg(format!("sine=frequency=440:duration={seconds}"));
        cmd.args(["-map", "0:v", "-map", "1:a", "-c:a", "aac"]);
    }
    cmd.args(["-c:v", "libx264", "-preset", "ultrafast"]);
    cmd.arg(path);
    let status = cmd.status().expect("failed to run ffmpeg");
    assert!(status.success(), "test clip generation failed");
}

#[test]
fn cli_no_args_shows_help() {
    let mut cmd = reelcut_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn cli_help_flag() {
    let mut cmd = reelcut_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelcut"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn cli_version_flag() {
    let mut cmd = reelcut_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelcut"));
}

#[test]
fn cli_check_tools_command() {
    let mut cmd = reelcut_cmd();
    cmd.arg("check-tools").assert().success().stdout(
        predicate::str::contains("ffmpeg").and(predicate::str::contains("ffprobe")),
    );
}

#[test]
fn cli_validate_default_config() {
    let mut cmd = reelcut_cmd();
    cmd.arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"));
}

#[test]
fn cli_validate_config_file_with_warnings() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, r#"{"encode": {"video_crf": 99}}"#).unwrap();

    let mut cmd = reelcut_cmd();
    cmd.arg("validate")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("video_crf"));
}

#[test]
fn cli_rejects_invalid_speed_before_touching_tools() {
    let mut cmd = reelcut_cmd();
    cmd.args(["speed", "/nonexistent/clip.mp4", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation"));
}

#[test]
fn cli_rejects_single_clip_merge() {
    // Two positional inputs are required by the parser itself.
    let mut cmd = reelcut_cmd();
    cmd.args(["merge", "/only/one.mp4", "-o", "/tmp/out.mp4"])
        .assert()
        .failure();
}

#[test]
fn cli_rejects_empty_overlay_text() {
    let mut cmd = reelcut_cmd();
    cmd.args(["text", "/nonexistent/clip.mp4", "--text", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation"));
}

#[test]
fn cli_rejects_unknown_insert_mode() {
    let mut cmd = reelcut_cmd();
    cmd.args([
        "add-audio",
        "/a.mp4",
        "/b.wav",
        "--mode",
        "blend",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("blend"));
}

#[test]
fn cli_trim_missing_input_fails() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.mp4");
    let mut cmd = reelcut_cmd();
    cmd.args(["trim", "/definitely/not/here.mp4", "--start", "0", "--duration", "1"])
        .arg("-o")
        .arg(&out)
        .assert()
        .failure();
    assert!(!out.exists());
}

// ===== Tests below exercise real ffmpeg invocations =====

#[test]
fn cli_trim_produces_shorter_clip() {
    if !ffmpeg_available() {
        return;
    }
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    make_test_clip(&input, 4, true);
    let output = dir.path().join("trimmed.mp4");

    let mut cmd = reelcut_cmd();
    cmd.arg("trim")
        .arg(&input)
        .args(["--start", "1", "--duration", "2"])
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("trimmed.mp4"));
    assert!(output.exists());
    assert!(fs::metadata(&output).unwrap().len() > 0);
}

#[test]
fn cli_trim_onto_itself_replaces_original() {
    if !ffmpeg_available() {
        return;
    }
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    make_test_clip(&input, 4, true);
    let before = fs::metadata(&input).unwrap().len();

    let mut cmd = reelcut_cmd();
    cmd.arg("trim")
        .arg(&input)
        .args(["--start", "0", "--duration", "1"])
        .arg("-o")
        .arg(&input)
        .assert()
        .success();

    // Original replaced in place, no staging file left behind.
    assert!(input.exists());
    assert!(fs::metadata(&input).unwrap().len() < before);
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains("staging"))
        .collect();
    assert!(leftovers.is_empty(), "staging leftovers: {leftovers:?}");
}

#[test]
fn cli_extract_audio_from_clip() {
    if !ffmpeg_available() {
        return;
    }
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    make_test_clip(&input, 2, true);
    let output = dir.path().join("sound.m4a");

    let mut cmd = reelcut_cmd();
    cmd.arg("extract-audio")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();
    assert!(output.exists());
}

#[test]
fn cli_probe_reports_streams() {
    if !ffmpeg_available() {
        return;
    }
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    make_test_clip(&input, 2, false);

    let mut cmd = reelcut_cmd();
    cmd.arg("probe")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Video:"))
        .stdout(predicate::str::contains("Audio:    none"));
}

#[test]
fn cli_silence_generates_standalone_track() {
    if !ffmpeg_available() {
        return;
    }
    let dir = tempdir().unwrap();
    let output = dir.path().join("quiet.m4a");

    let mut cmd = reelcut_cmd();
    cmd.args(["silence", "--duration", "1"])
        .arg("-o")
        .arg(&output)
        .assert()
        .success();
    assert!(output.exists());
}
