//! Extraction set-up
//!
//! Resolves the streams to use, opens every stage in acquisition order and
//! hands them to the synchronization loop.

use std::path::PathBuf;

use crate::config::ExtractConfig;
use crate::error::Result;
use crate::ffmpeg_utils::utils::is_text_subtitle_codec;
use crate::media::{self, AudioInput, MediaKind, StreamChooser};
use crate::output::AudioMuxer;
use crate::subtitle::{CueWindowPlanner, SubtitleCueSource};
use crate::transcode::decoder::AudioDecoder;
use crate::transcode::encoder::AudioEncoder;
use crate::transcode::pipeline::{CueSyncPipeline, PipelineStats};
use crate::transcode::resampler::AudioResampler;
use crate::transcode::FrameEncoder;

/// What to extract from where
#[derive(Debug, Clone)]
pub struct ExtractJob {
    /// Media file holding the audio track
    pub input: PathBuf,
    /// Output audio file
    pub output: PathBuf,
    /// Separate subtitle file; the input itself when unset
    pub subtitles: Option<PathBuf>,
    /// 1-based audio stream number
    pub audio_stream: Option<usize>,
    /// 1-based subtitle stream number
    pub subtitle_stream: Option<usize>,
}

/// Run one extraction end to end.
pub fn run_extraction(
    job: &ExtractJob,
    config: &ExtractConfig,
    chooser: &mut dyn StreamChooser,
) -> Result<PipelineStats> {
    config.validate()?;

    let input_streams = media::list_streams(&job.input)?;
    let audio = media::select_stream(&input_streams, MediaKind::Audio, job.audio_stream, chooser)?;

    let subtitle_path = job.subtitles.clone().unwrap_or_else(|| job.input.clone());
    let subtitle_streams = if subtitle_path == job.input {
        input_streams
    } else {
        media::list_streams(&subtitle_path)?
    };
    let subtitle = media::select_stream(
        &subtitle_streams,
        MediaKind::Subtitle,
        job.subtitle_stream,
        chooser,
    )?;
    if !is_text_subtitle_codec(subtitle.codec_id) {
        tracing::warn!(
            codec = subtitle.codec.as_str(),
            "bitmap subtitle stream: every event opens a cue"
        );
    }

    tracing::info!(
        input = %job.input.display(),
        output = %job.output.display(),
        subtitles = %subtitle_path.display(),
        codec = config.encoder.codec.as_str(),
        sample_rate = config.encoder.sample_rate,
        channels = config.encoder.channels,
        margin_ms = config.cues.guard_margin_ms,
        "starting extraction"
    );

    // Acquisition order: input, decoder, encoder, output, resampler, cues.
    // The pipeline releases them in reverse.
    let input = AudioInput::open(&job.input, audio.index)?;
    let decoder = AudioDecoder::open(&input.stream()?)?;
    let encoder = AudioEncoder::open(&config.encoder)?;
    let muxer = AudioMuxer::open(
        &job.output,
        config.output.format.as_deref(),
        &encoder.codec_parameters(),
        encoder.time_base(),
    )?;
    let resampler = AudioResampler::new(encoder.input_format());
    let cues = SubtitleCueSource::open(
        &subtitle_path,
        subtitle.index,
        config.cues.default_duration_ms,
    )?;

    let pipeline = CueSyncPipeline::new(
        input,
        decoder,
        encoder,
        muxer,
        resampler,
        cues,
        CueWindowPlanner::new(config.cues.guard_margin_ms),
    );
    pipeline.run()
}
