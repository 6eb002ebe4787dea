//! Per-operation coordinator.
//!
//! One [`Orchestrator::run`] call sequences a single operation:
//! validate -> probe input(s) -> resolve the output plan -> build the pass
//! list -> run each pass in order -> finalize. Multi-pass plans are strictly
//! linear; the first failing pass aborts the chain. The workspace holding
//! intermediate artifacts is removed on every exit path, and a failed
//! removal is logged, never fatal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reelcut_av::command::{CommandSpec, ToolCommand};
use reelcut_av::ops::{self, BuildPlan, TextStyle};
use reelcut_av::probe::{MediaProbeResult, MediaProber};
use reelcut_av::tools::ToolRegistry;
use reelcut_av::workspace::Workspace;
use reelcut_av::output;
use reelcut_core::config::Config;
use reelcut_core::{Error, Result};

use crate::context::{ProgressEvent, RunOptions};
use crate::request::OperationRequest;

/// Coordinates edit operations against the discovered external tools.
///
/// Cheap to share; a caller may run several operations concurrently, each
/// with its own workspace and probe results. One operation's passes never
/// overlap each other.
pub struct Orchestrator {
    tools: Arc<ToolRegistry>,
    config: Arc<Config>,
}

impl Orchestrator {
    pub fn new(tools: Arc<ToolRegistry>, config: Arc<Config>) -> Self {
        Self { tools, config }
    }

    /// Execute one operation and return the final output path.
    pub async fn run(&self, request: OperationRequest, opts: &RunOptions) -> Result<PathBuf> {
        request.validate()?;
        tracing::info!("starting operation: {}", request.label());

        let workspace = Workspace::new()?;
        let result = self.run_inner(&request, &workspace, opts).await;
        workspace.cleanup();

        match &result {
            Ok(path) => tracing::info!("{} finished: {}", request.label(), path.display()),
            Err(e) => tracing::error!("{} failed: {e}", request.label()),
        }
        result
    }

    async fn run_inner(
        &self,
        request: &OperationRequest,
        workspace: &Workspace,
        opts: &RunOptions,
    ) -> Result<PathBuf> {
        let requested = request.requested_output().map(Path::to_path_buf);
        let name_source = request
            .primary_input()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(request.label()));

        let scratch = self.config.scratch.resolve();
        if requested.is_none() {
            std::fs::create_dir_all(&scratch)?;
        }
        let plan = output::resolve(
            requested.as_deref(),
            &request.default_ext(),
            &name_source,
            &scratch,
        )?;
        tracing::debug!(
            "output plan: final={} staging={} atomic_replace={}",
            plan.final_path.display(),
            plan.staging_path.display(),
            plan.requires_atomic_replace
        );

        let build = self
            .plan_operation(request, workspace, plan.write_target())
            .await?;

        for sf in &build.support_files {
            std::fs::write(&sf.path, &sf.contents)?;
        }

        let total = build.passes.len();
        for (i, spec) in build.passes.iter().enumerate() {
            if opts.cancellation.is_cancelled() {
                return Err(Error::Cancelled);
            }
            opts.progress.send(ProgressEvent::Pass {
                index: i + 1,
                total,
                label: &spec.label,
            });
            tracing::debug!("pass {}/{}: {}", i + 1, total, spec.label);
            self.run_pass(spec, opts).await?;
        }

        output::apply(&plan)
    }

    /// Run one subprocess pass, streaming its diagnostics to the progress
    /// channel.
    async fn run_pass(&self, spec: &CommandSpec, opts: &RunOptions) -> Result<()> {
        let tool = self.tools.require(spec.tool.name())?;
        let mut cmd = ToolCommand::new(tool.path.clone());
        cmd.args(spec.args.iter().cloned());
        cmd.execute_streaming(
            |line| opts.progress.send(ProgressEvent::Line(line)),
            &opts.cancellation,
        )
        .await?;
        Ok(())
    }

    /// Probe one file. Always fresh -- results are never cached across
    /// operations, and each operation probes each input exactly once.
    async fn probe(&self, path: &Path) -> Result<MediaProbeResult> {
        let ffprobe = self.tools.require("ffprobe")?;
        MediaProber::new(ffprobe.path.clone()).probe(path).await
    }

    /// Map a request to its pass plan, probing inputs as needed.
    async fn plan_operation(
        &self,
        request: &OperationRequest,
        workspace: &Workspace,
        write_target: &Path,
    ) -> Result<BuildPlan> {
        let enc = &self.config.encode;
        match request {
            OperationRequest::Trim {
                input,
                start,
                duration,
                ..
            } => {
                let probe = self.probe(input).await?;
                ops::trim(input, &probe, *start, *duration, enc, write_target)
            }
            OperationRequest::TrimVideoOnly {
                input,
                start,
                duration,
                ..
            } => {
                let probe = self.probe(input).await?;
                ops::delete_video_range(input, &probe, *start, *duration, enc, write_target)
            }
            OperationRequest::TrimAudioOnly {
                input,
                start,
                duration,
                ..
            } => {
                let probe = self.probe(input).await?;
                ops::delete_audio_range(input, &probe, *start, *duration, enc, write_target)
            }
            OperationRequest::ReEncode { input, .. } => {
                let probe = self.probe(input).await?;
                ops::reencode(&probe, enc, write_target)
            }
            OperationRequest::ApplyFilter {
                input,
                video_filter,
                audio_filter,
                ..
            } => {
                let probe = self.probe(input).await?;
                ops::apply_filter(
                    &probe,
                    video_filter.as_deref(),
                    audio_filter.as_deref(),
                    enc,
                    write_target,
                )
            }
            OperationRequest::AddAudio {
                input,
                audio,
                offset,
                mode,
                ..
            } => {
                let base = self.probe(input).await?;
                let source = self.probe(audio).await?;
                if !source.has_audio() {
                    return Err(Error::validation(format!(
                        "{} has no audio stream",
                        audio.display()
                    )));
                }
                ops::add_audio(
                    &base,
                    audio,
                    source.duration_secs,
                    *offset,
                    *mode,
                    enc,
                    write_target,
                )
            }
            OperationRequest::AddText {
                input,
                text,
                start,
                end,
                font_size,
                font_color,
                ..
            } => {
                let probe = self.probe(input).await?;
                let mut style = TextStyle::default();
                if let Some(size) = font_size {
                    style.font_size = *size;
                }
                if let Some(color) = font_color {
                    style.font_color = color.clone();
                }
                ops::add_text(
                    input,
                    &probe,
                    text,
                    *start,
                    *end,
                    &style,
                    workspace.dir(),
                    enc,
                    write_target,
                )
            }
            OperationRequest::MergeVideos {
                inputs, transition, ..
            } => {
                let mut probes = Vec::with_capacity(inputs.len());
                for input in inputs {
                    probes.push(self.probe(input).await?);
                }
                ops::merge_videos(
                    &probes,
                    transition.as_ref(),
                    workspace.dir(),
                    enc,
                    write_target,
                )
            }
            OperationRequest::MergeAudios { inputs, .. } => {
                let mut probes = Vec::with_capacity(inputs.len());
                for input in inputs {
                    probes.push(self.probe(input).await?);
                }
                ops::merge_audios(&probes, enc, write_target)
            }
            OperationRequest::ExtractAudio { input, .. } => {
                let probe = self.probe(input).await?;
                ops::extract_audio(&probe, enc, write_target)
            }
            OperationRequest::AdjustVolume { input, factor, .. } => {
                let probe = self.probe(input).await?;
                ops::adjust_volume(&probe, *factor, enc, write_target)
            }
            OperationRequest::AdjustSpeed { input, speed, .. } => {
                let probe = self.probe(input).await?;
                ops::adjust_speed(&probe, *speed, enc, write_target)
            }
            OperationRequest::GenerateSilence {
                input: Some(input),
                offset,
                duration,
                mode,
                ..
            } => {
                let probe = self.probe(input).await?;
                ops::insert_silence(&probe, *offset, *duration, *mode, enc, write_target)
            }
            OperationRequest::GenerateSilence {
                input: None,
                duration,
                ..
            } => ops::generate_silence(*duration, enc, write_target),
            OperationRequest::GenerateWaveform {
                input,
                width,
                height,
                color,
                ..
            } => {
                let probe = self.probe(input).await?;
                ops::waveform(&probe, *width, *height, color.as_deref(), write_target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProgressSender;
    use reelcut_core::config::ToolsConfig;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    /// Registry whose "ffmpeg" is a stub that exits 0 without doing work.
    /// Lets orchestration paths run without a real ffmpeg install.
    fn stub_tools() -> Option<Arc<ToolRegistry>> {
        let stub = PathBuf::from("/bin/true");
        if !stub.exists() {
            return None;
        }
        let cfg = ToolsConfig {
            ffmpeg_path: Some(stub),
            ffprobe_path: None,
        };
        Some(Arc::new(ToolRegistry::discover(&cfg)))
    }

    fn orchestrator(tools: Arc<ToolRegistry>) -> Orchestrator {
        Orchestrator::new(tools, Arc::new(Config::default()))
    }

    #[tokio::test]
    async fn validation_failure_short_circuits() {
        let Some(tools) = stub_tools() else { return };
        let orch = orchestrator(tools);
        let request = OperationRequest::AdjustSpeed {
            input: PathBuf::from("/nonexistent.mp4"),
            speed: 0.0,
            output: None,
        };
        let result = orch.run(request, &RunOptions::default()).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn standalone_silence_runs_single_pass() {
        let Some(tools) = stub_tools() else { return };
        let orch = orchestrator(tools);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("quiet.m4a");
        let request = OperationRequest::GenerateSilence {
            input: None,
            offset: 0.0,
            duration: 2.0,
            mode: Default::default(),
            output: Some(out.clone()),
        };

        let passes = Arc::new(Mutex::new(Vec::new()));
        let passes_clone = passes.clone();
        let opts = RunOptions::default().with_progress(ProgressSender::new(move |ev| {
            if let ProgressEvent::Pass { index, total, label } = ev {
                passes_clone
                    .lock()
                    .unwrap()
                    .push((index, total, label.to_string()));
            }
        }));

        let result = orch.run(request, &opts).await.unwrap();
        assert_eq!(result, out);

        let seen = passes.lock().unwrap();
        assert_eq!(*seen, vec![(1, 1, "generate silence".to_string())]);
    }

    #[tokio::test]
    async fn pre_cancelled_run_never_spawns() {
        let Some(tools) = stub_tools() else { return };
        let orch = orchestrator(tools);

        let token = CancellationToken::new();
        token.cancel();
        let opts = RunOptions::default().with_cancellation(token);

        let request = OperationRequest::GenerateSilence {
            input: None,
            offset: 0.0,
            duration: 2.0,
            mode: Default::default(),
            output: None,
        };
        let result = orch.run(request, &opts).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn probing_a_missing_file_fails_cleanly() {
        // Without ffprobe installed this fails at tool lookup; with it
        // installed, at the probe itself. Either way: an error, no panic,
        // no leftover artifacts.
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        let orch = orchestrator(Arc::new(registry));
        let request = OperationRequest::ExtractAudio {
            input: PathBuf::from("/definitely/not/here.mp4"),
            output: None,
        };
        let result = orch.run(request, &RunOptions::default()).await;
        assert!(result.is_err());
    }
}
