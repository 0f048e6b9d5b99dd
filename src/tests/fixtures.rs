//! Test fixtures
//!
//! Small synthetic media files written into temporary directories, so the
//! end-to-end tests need no assets checked into the tree.

use std::path::{Path, PathBuf};

use hound::{WavSpec, WavWriter};

use crate::error::Result;
use crate::media::{MediaKind, StreamChooser, StreamDescriptor};

/// Mono signed 16-bit PCM WAV of `duration_ms` at `rate`. Each sample holds
/// the millisecond it plays at, like the in-memory mock source.
pub fn write_wav(dir: &Path, name: &str, duration_ms: u32, rate: u32) -> PathBuf {
    let path = dir.join(name);
    let spec = WavSpec {
        channels: 1,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();

    let samples = duration_ms as u64 * rate as u64 / 1000;
    for i in 0..samples {
        writer.write_sample((i * 1000 / rate as u64) as i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn srt_timestamp(ms: i64) -> String {
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        (ms / 60_000) % 60,
        (ms / 1000) % 60,
        ms % 1000
    )
}

/// SubRip file with one numbered event per `(start_ms, end_ms, text)`.
pub fn write_srt(dir: &Path, name: &str, events: &[(i64, i64, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::new();
    for (i, (start, end, text)) in events.iter().enumerate() {
        content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            srt_timestamp(*start),
            srt_timestamp(*end),
            text
        ));
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Chooser for runs that must never need to ask.
pub struct NeverAsk;

impl StreamChooser for NeverAsk {
    fn choose(&mut self, kind: MediaKind, candidates: &[StreamDescriptor]) -> Result<usize> {
        panic!(
            "unexpected {} stream prompt with {} candidates",
            kind,
            candidates.len()
        );
    }
}

#[test]
fn test_srt_timestamp() {
    assert_eq!(srt_timestamp(0), "00:00:00,000");
    assert_eq!(srt_timestamp(3_723_045), "01:02:03,045");
}

#[test]
fn test_wav_samples_hold_their_millisecond() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_wav(dir.path(), "ramp.wav", 100, 48_000);

    let mut reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().sample_rate, 48_000);
    assert_eq!(reader.duration(), 4800);
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples[0], 0);
    assert_eq!(samples[47], 0);
    assert_eq!(samples[48], 1);
    assert_eq!(*samples.last().unwrap(), 99);
}
