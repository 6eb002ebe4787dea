use clap::{Parser, Subcommand};
use std::path::PathBuf;

use reelcut_pipeline::{InsertMode, OperationRequest, TransitionSpec};

#[derive(Parser)]
#[command(name = "reelcut")]
#[command(author, version, about = "FFmpeg-backed video/audio editing toolkit")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (includes raw ffmpeg output)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Keep a time range of a clip, dropping the rest
    Trim {
        input: PathBuf,
        /// Range start in seconds
        #[arg(long)]
        start: f64,
        /// Range length in seconds
        #[arg(long)]
        duration: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete an interior time range from the video track
    Cut {
        input: PathBuf,
        /// Deleted range start in seconds
        #[arg(long)]
        start: f64,
        /// Deleted range length in seconds
        #[arg(long)]
        duration: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete an interior time range from the audio track, keeping video
    CutAudio {
        input: PathBuf,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        duration: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-encode into the container implied by the output extension
    Convert {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply raw ffmpeg filter expressions to the streams
    Filter {
        input: PathBuf,
        /// Video filter expression (e.g. "hue=s=0")
        #[arg(long)]
        video: Option<String>,
        /// Audio filter expression (e.g. "loudnorm")
        #[arg(long)]
        audio: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Insert audio from another file into a clip
    AddAudio {
        input: PathBuf,
        audio: PathBuf,
        /// Insertion point in seconds
        #[arg(long, default_value_t = 0.0)]
        offset: f64,
        /// mix, overwrite, or push
        #[arg(long, default_value_t = InsertMode::Mix)]
        mode: InsertMode,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Overlay text on the video, optionally only within a time window
    Text {
        input: PathBuf,
        #[arg(long)]
        text: String,
        /// Window start in seconds (defaults to the beginning)
        #[arg(long)]
        start: Option<f64>,
        /// Window end in seconds (defaults to the end of the file)
        #[arg(long)]
        end: Option<f64>,
        #[arg(long)]
        font_size: Option<u32>,
        #[arg(long)]
        color: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Concatenate clips, optionally crossfading between them
    Merge {
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,
        /// xfade transition name (e.g. fade, wipeleft, dissolve)
        #[arg(long)]
        transition: Option<String>,
        /// Transition overlap in seconds
        #[arg(long, default_value_t = 1.0)]
        transition_duration: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Concatenate audio files into one track
    MergeAudio {
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract the audio track into its own file
    ExtractAudio {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scale audio volume by a factor (1.0 = unchanged)
    Volume {
        input: PathBuf,
        factor: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Change playback speed (2.0 = twice as fast)
    Speed {
        input: PathBuf,
        speed: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Insert near-silence into a clip, or generate a standalone silent track
    Silence {
        /// File to insert into; omit to generate a standalone track
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 0.0)]
        offset: f64,
        /// Silence length in seconds
        #[arg(long)]
        duration: f64,
        #[arg(long, default_value_t = InsertMode::Mix)]
        mode: InsertMode,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the audio track's waveform to an image
    Waveform {
        input: PathBuf,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 240)]
        height: u32,
        /// Waveform color (e.g. "0x3399ff")
        #[arg(long)]
        color: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Probe a media file and display information
    Probe {
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses the global --config if omitted)
        config: Option<PathBuf>,
    },
}

/// Convert an operation subcommand into its request. Returns `None` for the
/// maintenance commands (probe, check-tools, validate), which are handled
/// directly in `main`.
pub fn to_request(command: Commands) -> Option<OperationRequest> {
    match command {
        Commands::Trim {
            input,
            start,
            duration,
            output,
        } => Some(OperationRequest::Trim {
            input,
            start,
            duration,
            output,
        }),
        Commands::Cut {
            input,
            start,
            duration,
            output,
        } => Some(OperationRequest::TrimVideoOnly {
            input,
            start,
            duration,
            output,
        }),
        Commands::CutAudio {
            input,
            start,
            duration,
            output,
        } => Some(OperationRequest::TrimAudioOnly {
            input,
            start,
            duration,
            output,
        }),
        Commands::Convert { input, output } => Some(OperationRequest::ReEncode { input, output }),
        Commands::Filter {
            input,
            video,
            audio,
            output,
        } => Some(OperationRequest::ApplyFilter {
            input,
            video_filter: video,
            audio_filter: audio,
            output,
        }),
        Commands::AddAudio {
            input,
            audio,
            offset,
            mode,
            output,
        } => Some(OperationRequest::AddAudio {
            input,
            audio,
            offset,
            mode,
            output,
        }),
        Commands::Text {
            input,
            text,
            start,
            end,
            font_size,
            color,
            output,
        } => Some(OperationRequest::AddText {
            input,
            text,
            start,
            end,
            font_size,
            font_color: color,
            output,
        }),
        Commands::Merge {
            inputs,
            transition,
            transition_duration,
            output,
        } => Some(OperationRequest::MergeVideos {
            inputs,
            transition: transition.map(|kind| TransitionSpec {
                kind,
                duration: transition_duration,
            }),
            output,
        }),
        Commands::MergeAudio { inputs, output } => {
            Some(OperationRequest::MergeAudios { inputs, output })
        }
        Commands::ExtractAudio { input, output } => {
            Some(OperationRequest::ExtractAudio { input, output })
        }
        Commands::Volume {
            input,
            factor,
            output,
        } => Some(OperationRequest::AdjustVolume {
            input,
            factor,
            output,
        }),
        Commands::Speed {
            input,
            speed,
            output,
        } => Some(OperationRequest::AdjustSpeed {
            input,
            speed,
            output,
        }),
        Commands::Silence {
            input,
            offset,
            duration,
            mode,
            output,
        } => Some(OperationRequest::GenerateSilence {
            input,
            offset,
            duration,
            mode,
            output,
        }),
        Commands::Waveform {
            input,
            width,
            height,
            color,
            output,
        } => Some(OperationRequest::GenerateWaveform {
            input,
            width,
            height,
            color,
            output,
        }),
        Commands::Probe { .. } | Commands::CheckTools | Commands::Validate { .. } => None,
    }
}
