//! cuecut
//!
//! Command-line front end: extracts the audio under subtitle cues of a media
//! file into a compact audio file, lists streams, writes default config.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cuecut::cli::{self, Cli, Commands, ExtractArgs, StreamsArgs};
use cuecut::config::LoggingConfig;
use cuecut::config_file::{generate_default_config, ConfigFile};
use cuecut::media::{self, MediaKind};
use cuecut::{CueCutError, ExtractConfig, ExtractJob, Result};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "cuecut";

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }

    init_logging(&config.logging);
    tracing::debug!("{} v{} starting", APP_NAME, VERSION);

    match run(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = ?e.kind(), "{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Defaults, then the config file, then command-line overrides.
fn load_config(cli: &Cli) -> Result<ExtractConfig> {
    let Commands::Extract(args) = &cli.command else {
        return Ok(ExtractConfig::default());
    };
    let mut config = match &args.config {
        Some(path) => ConfigFile::from_file(path)?.into_extract_config(),
        None => ExtractConfig::default(),
    };
    args.apply_to(&mut config);
    Ok(config)
}

/// Initialize logging with tracing, to stderr so stdout stays usable.
fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("cuecut={},ffmpeg=warn", logging.level).into());
    let json = logging.is_json();

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn init_ffmpeg() -> Result<()> {
    cuecut::init()?;
    cuecut::install_log_filter();
    tracing::debug!("FFmpeg version: {}", cuecut::ffmpeg_version_info());
    Ok(())
}

fn run(command: Commands, config: ExtractConfig) -> Result<()> {
    match command {
        Commands::Extract(args) => {
            init_ffmpeg()?;
            extract(args, &config)
        }
        Commands::Streams(args) => {
            init_ffmpeg()?;
            list_streams(args)
        }
        Commands::InitConfig(args) => {
            generate_default_config(&args.path)?;
            println!("Wrote default configuration to {}", args.path.display());
            Ok(())
        }
    }
}

fn extract(args: ExtractArgs, config: &ExtractConfig) -> Result<()> {
    let job = ExtractJob {
        input: args.input,
        output: args.output,
        subtitles: args.subtitles,
        audio_stream: args.audio_stream,
        subtitle_stream: args.subtitle_stream,
    };
    let mut chooser = cli::stdin_chooser();
    let stats = cuecut::run_extraction(&job, config, &mut chooser)?;
    tracing::info!(
        output = %job.output.display(),
        seconds = stats.samples_encoded as f64 / config.encoder.sample_rate as f64,
        "wrote extracted audio"
    );
    Ok(())
}

fn list_streams(args: StreamsArgs) -> Result<()> {
    let streams = media::list_streams(&args.input)?;

    if args.json {
        let relevant: Vec<_> = streams
            .iter()
            .filter(|s| s.kind != MediaKind::Other)
            .collect();
        let json = serde_json::to_string_pretty(&relevant)
            .map_err(|e| CueCutError::Io(e.into()))?;
        println!("{}", json);
        return Ok(());
    }

    for kind in [MediaKind::Audio, MediaKind::Subtitle] {
        let of_kind = media::filter_kind(&streams, kind);
        if of_kind.is_empty() {
            println!("No {} streams", kind);
        }
        for (i, stream) in of_kind.iter().enumerate() {
            println!("{}", stream.summary(i + 1));
        }
    }
    Ok(())
}
