//! Command-line interface

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ExtractConfig;
use crate::media::PromptChooser;

/// Extract the audio under subtitle cues into a compact audio file
#[derive(Parser, Debug)]
#[command(name = "cuecut")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (overrides the config file)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Logging format: pretty or json (overrides the config file)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract cue-synchronized audio into a new file
    Extract(ExtractArgs),
    /// List the audio and subtitle streams of a media file
    Streams(StreamsArgs),
    /// Write a configuration file with every default spelled out
    InitConfig(InitConfigArgs),
}

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Media file holding the audio track
    pub input: PathBuf,

    /// Output audio file
    pub output: PathBuf,

    /// Separate subtitle file (default: subtitles inside the input)
    #[arg(short, long)]
    pub subtitles: Option<PathBuf>,

    /// Audio stream number, counting audio streams from 1
    #[arg(long)]
    pub audio_stream: Option<usize>,

    /// Subtitle stream number, counting subtitle streams from 1
    #[arg(long)]
    pub subtitle_stream: Option<usize>,

    /// TOML configuration file
    #[arg(short, long, env = "CUECUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output codec (mp3, aac, mp2, flac, opus, vorbis, pcm_s16le, ...)
    #[arg(long)]
    pub codec: Option<String>,

    /// Output sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Output channel count (1 or 2)
    #[arg(long)]
    pub channels: Option<u16>,

    /// Output bit rate in bps
    #[arg(long)]
    pub bit_rate: Option<u64>,

    /// Encoder input sample format (s16p, fltp, ...)
    #[arg(long)]
    pub sample_format: Option<String>,

    /// Output container format (default: from the output file name)
    #[arg(long)]
    pub format: Option<String>,

    /// Guard margin around each cue in milliseconds
    #[arg(long)]
    pub margin_ms: Option<i64>,
}

impl ExtractArgs {
    /// Override configuration values given on the command line.
    pub fn apply_to(&self, config: &mut ExtractConfig) {
        if let Some(codec) = &self.codec {
            config.encoder.codec = codec.clone();
        }
        if let Some(rate) = self.sample_rate {
            config.encoder.sample_rate = rate;
        }
        if let Some(channels) = self.channels {
            config.encoder.channels = channels;
        }
        if let Some(bit_rate) = self.bit_rate {
            config.encoder.bit_rate = bit_rate;
        }
        if let Some(format) = &self.sample_format {
            config.encoder.sample_format = format.clone();
        }
        if let Some(format) = &self.format {
            config.output.format = Some(format.clone());
        }
        if let Some(margin) = self.margin_ms {
            config.cues.guard_margin_ms = margin;
        }
    }
}

/// Arguments for the streams command
#[derive(Args, Debug)]
pub struct StreamsArgs {
    /// Media file to inspect
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the init-config command
#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the configuration file
    pub path: PathBuf,
}

/// Stream chooser asking on stdin. Listing and prompts go to stderr so that
/// stdout stays clean; without a terminal on stdin asking is an error.
pub fn stdin_chooser() -> PromptChooser<std::io::StdinLock<'static>, std::io::Stderr> {
    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    PromptChooser::new(stdin.lock(), std::io::stderr(), interactive)
}
