//! End-to-end extraction through real FFmpeg
//!
//! Synthetic WAV audio and SubRip cues go in, an encoded file comes out and
//! is decoded again to check what was kept.

use std::path::Path;

use crate::config::ExtractConfig;
use crate::extract::{run_extraction, ExtractJob};
use crate::ffmpeg_utils::helpers;
use crate::media::{AudioInput, MediaKind};
use crate::tests::fixtures::{write_srt, write_wav, NeverAsk};
use crate::transcode::decoder::AudioDecoder;
use crate::transcode::encoder::find_encoder;
use crate::transcode::{DecodeStatus, FrameDecoder, PacketReader};

/// Decoded content of an output file
struct Decoded {
    samples: usize,
    rate: u32,
    /// First channel, only when the output decodes to signed 16-bit
    values: Vec<i16>,
}

fn collect_frames(decoder: &mut AudioDecoder, decoded: &mut Decoded) {
    while let DecodeStatus::Frame(frame) = decoder.receive().unwrap() {
        decoded.samples += frame.samples();
        decoded.rate = frame.rate();
        if helpers::sample_format_name(frame.format()) == "s16" {
            let data = helpers::audio_plane_data(&frame, 0);
            let channels = frame.channels() as usize;
            decoded.values.extend(
                data.chunks_exact(2 * channels)
                    .take(frame.samples())
                    .map(|c| i16::from_le_bytes([c[0], c[1]])),
            );
        }
    }
}

fn decode_all(path: &Path) -> Decoded {
    let streams = crate::media::list_streams(path).unwrap();
    let audio = crate::media::filter_kind(&streams, MediaKind::Audio);
    assert_eq!(audio.len(), 1, "output must hold exactly one audio stream");

    let mut input = AudioInput::open(path, audio[0].index).unwrap();
    let mut decoder = AudioDecoder::open(&input.stream().unwrap()).unwrap();
    let mut decoded = Decoded {
        samples: 0,
        rate: 0,
        values: Vec::new(),
    };

    while let Some(packet) = input.read_packet().unwrap() {
        decoder.submit(Some(&packet)).unwrap();
        collect_frames(&mut decoder, &mut decoded);
    }
    decoder.submit(None).unwrap();
    collect_frames(&mut decoder, &mut decoded);
    decoded
}

fn pcm_config() -> ExtractConfig {
    let mut config = ExtractConfig::default();
    config.encoder.codec = "pcm_s16le".into();
    config.encoder.channels = 1;
    config.encoder.sample_rate = 48_000;
    config.encoder.sample_format = "s16".into();
    config
}

#[test]
fn test_extract_single_cue_to_wav() {
    crate::ffmpeg_utils::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav(dir.path(), "speech.wav", 10_000, 48_000);
    let subtitles = write_srt(dir.path(), "speech.srt", &[(2000, 3000, "Hello there")]);

    let job = ExtractJob {
        input,
        output: dir.path().join("out.wav"),
        subtitles: Some(subtitles),
        audio_stream: None,
        subtitle_stream: None,
    };
    let stats = run_extraction(&job, &pcm_config(), &mut NeverAsk).unwrap();
    assert_eq!(stats.cues_read, 1);

    let decoded = decode_all(&job.output);
    assert_eq!(decoded.rate, 48_000);
    // [1000,4000) once the 1 s guard margin is added
    let ms = decoded.samples as i64 * 1000 / 48_000;
    assert!((ms - 3000).abs() <= 10, "got {} ms", ms);

    assert_eq!(decoded.values.len(), decoded.samples);
    let first = decoded.values[0];
    let last = *decoded.values.last().unwrap();
    assert!((990..=1010).contains(&first), "first sample from {} ms", first);
    assert!((3990..=4000).contains(&last), "last sample from {} ms", last);
    for pair in decoded.values.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
}

#[test]
fn test_extract_overlapping_cues_to_wav() {
    crate::ffmpeg_utils::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav(dir.path(), "speech.wav", 10_000, 48_000);
    let subtitles = write_srt(
        dir.path(),
        "speech.srt",
        &[(1000, 2000, "First"), (1500, 2500, "Second"), (7000, 7500, "Third")],
    );

    let job = ExtractJob {
        input,
        output: dir.path().join("out.wav"),
        subtitles: Some(subtitles),
        audio_stream: None,
        subtitle_stream: None,
    };
    let stats = run_extraction(&job, &pcm_config(), &mut NeverAsk).unwrap();
    assert_eq!(stats.cues_read, 3);
    assert_eq!(stats.cues_skipped, 0);

    // [0,3000) + [3000,3500) + [6000,8500)
    let decoded = decode_all(&job.output);
    let ms = decoded.samples as i64 * 1000 / 48_000;
    assert!((ms - 6000).abs() <= 20, "got {} ms", ms);
    for pair in decoded.values.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
}

#[test]
fn test_extract_to_fixed_frame_codec() {
    crate::ffmpeg_utils::init().unwrap();
    if find_encoder("mp2").is_none() {
        eprintln!("mp2 encoder not available, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav(dir.path(), "speech.wav", 10_000, 44_100);
    let subtitles = write_srt(dir.path(), "speech.srt", &[(2000, 3000, "Hello there")]);

    let mut config = ExtractConfig::default();
    config.encoder.codec = "mp2".into();
    config.encoder.channels = 1;
    config.encoder.sample_rate = 48_000;
    config.encoder.bit_rate = 128_000;
    config.encoder.sample_format = "s16".into();

    let job = ExtractJob {
        input,
        output: dir.path().join("out.mp2"),
        subtitles: Some(subtitles),
        audio_stream: None,
        subtitle_stream: None,
    };
    let stats = run_extraction(&job, &config, &mut NeverAsk).unwrap();
    assert!(stats.packets_written > 0);

    // Whole 1152-sample frames, plus whatever the codec delays
    let decoded = decode_all(&job.output);
    assert_eq!(decoded.rate, 48_000);
    let ms = decoded.samples as i64 * 1000 / 48_000;
    assert!((ms - 3000).abs() <= 60, "got {} ms", ms);
}

#[test]
fn test_missing_subtitle_stream_is_not_found() {
    crate::ffmpeg_utils::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav(dir.path(), "speech.wav", 1000, 48_000);

    let job = ExtractJob {
        input,
        output: dir.path().join("out.wav"),
        subtitles: None,
        audio_stream: None,
        subtitle_stream: None,
    };
    let err = run_extraction(&job, &pcm_config(), &mut NeverAsk).unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    assert!(!job.output.exists());
}

#[test]
fn test_unknown_encoder_is_not_found() {
    crate::ffmpeg_utils::init().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let input = write_wav(dir.path(), "speech.wav", 1000, 48_000);
    let subtitles = write_srt(dir.path(), "speech.srt", &[(200, 400, "Hi")]);

    let mut config = pcm_config();
    config.encoder.codec = "no_such_codec".into();
    let job = ExtractJob {
        input,
        output: dir.path().join("out.wav"),
        subtitles: Some(subtitles),
        audio_stream: None,
        subtitle_stream: None,
    };
    let err = run_extraction(&job, &config, &mut NeverAsk).unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
}
