mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use reelcut_av::probe::MediaProber;
use reelcut_av::tools::ToolRegistry;
use reelcut_core::config::Config;
use reelcut_pipeline::{
    Orchestrator, OperationRequest, ProgressEvent, ProgressSender, RunOptions,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging.
    // Respect RUST_LOG env var if set, otherwise use defaults based on the
    // verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelcut=trace,reelcut_av=trace,reelcut_pipeline=trace,reelcut_core=debug".to_string()
        } else {
            "reelcut=info,reelcut_av=info,reelcut_pipeline=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config;
    match cli.command {
        Commands::Probe { file, json } => probe_file(&file, json, config_path.as_deref()),
        Commands::CheckTools => check_tools(config_path.as_deref()),
        Commands::Validate { config } => {
            validate_config(config.or(config_path).as_deref())
        }
        operation => {
            let Some(request) = cli::to_request(operation) else {
                anyhow::bail!("unhandled command");
            };
            run_operation(request, config_path.as_deref(), cli.verbose)
        }
    }
}

fn run_operation(
    request: OperationRequest,
    config_path: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let config = Config::load_or_default(config_path);
    for warning in config.validate() {
        tracing::warn!("config: {warning}");
    }
    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    let orchestrator = Orchestrator::new(tools, Arc::new(config));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        // Ctrl-C cancels the operation and kills any in-flight subprocess.
        let token = CancellationToken::new();
        let interrupt_token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; cancelling");
                interrupt_token.cancel();
            }
        });

        let progress = ProgressSender::new(move |event| match event {
            ProgressEvent::Pass {
                index,
                total,
                label,
            } => eprintln!("[{index}/{total}] {label}"),
            ProgressEvent::Line(line) => {
                if verbose {
                    eprintln!("  {line}");
                }
            }
        });
        let opts = RunOptions::default()
            .with_cancellation(token)
            .with_progress(progress);

        let path = orchestrator.run(request, &opts).await?;
        println!("{}", path.display());
        Ok(())
    })
}

fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools);
    let ffprobe = tools.require("ffprobe")?;
    let prober = MediaProber::new(ffprobe.path.clone());

    let rt = tokio::runtime::Runtime::new()?;
    let info = rt.block_on(prober.probe(file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File:     {}", info.path.display());
    println!("Format:   {}", info.format_name);
    println!("Duration: {:.3}s", info.duration_secs);
    println!("Size:     {} bytes", info.file_size);
    match &info.video {
        Some(v) => {
            let fps = v
                .frame_rate
                .map(|f| format!(" @ {f:.3} fps"))
                .unwrap_or_default();
            println!("Video:    {} {}x{}{fps}", v.codec, v.width, v.height);
        }
        None => println!("Video:    none"),
    }
    match &info.audio {
        Some(a) => {
            let rate = a
                .sample_rate
                .map(|sr| format!(" @ {sr} Hz"))
                .unwrap_or_default();
            println!("Audio:    {} {}ch{rate}", a.codec, a.channels);
        }
        None => println!("Audio:    none"),
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools);

    for info in tools.check_all() {
        if info.available {
            let path = info
                .path
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let version = info.version.unwrap_or_else(|| "unknown version".into());
            println!("{:<8} {path} ({version})", info.name);
        } else {
            println!("{:<8} NOT FOUND", info.name);
        }
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(path);
    let warnings = config.validate();
    if warnings.is_empty() {
        println!("Configuration OK");
    } else {
        for warning in &warnings {
            println!("warning: {warning}");
        }
    }
    Ok(())
}
