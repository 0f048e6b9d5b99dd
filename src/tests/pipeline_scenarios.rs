//! Synchronization loop scenarios over in-memory collaborators
//!
//! Source audio is 10 s long unless stated otherwise; see `mocks` for the
//! sample layout.

use crate::error::ErrorKind;
use crate::subtitle::{CueList, CueWindowPlanner};
use crate::tests::mocks::{
    IdentityResampler, MockDecoder, MockEncoder, MockReader, MockWriter, PACKET_SAMPLES,
};
use crate::timeline::TimeRange;
use crate::transcode::pipeline::{CueSyncPipeline, PipelineStats};

struct Outcome {
    stats: crate::error::Result<PipelineStats>,
    seeks: Vec<i64>,
    values: Vec<i16>,
    frame_sizes: Vec<usize>,
    frame_pts: Vec<i64>,
    packets: usize,
    finished: bool,
}

fn cue(start: i64, end: i64) -> TimeRange {
    TimeRange::new(start, end).unwrap()
}

fn run_with(audio_ms: i64, cues: Vec<TimeRange>, encoder: MockEncoder) -> Outcome {
    run_stages(MockReader::new(audio_ms), cues, encoder, MockWriter::default())
}

fn run_stages(
    reader: MockReader,
    cues: Vec<TimeRange>,
    encoder: MockEncoder,
    writer: MockWriter,
) -> Outcome {
    let seeks = reader.seeks.clone();
    let encoder_log = encoder.log.clone();
    let writer_log = writer.log.clone();

    let pipeline = CueSyncPipeline::new(
        reader,
        MockDecoder::default(),
        encoder,
        writer,
        IdentityResampler,
        CueList::new(cues),
        CueWindowPlanner::new(1000),
    );
    let stats = pipeline.run();

    let encoded = encoder_log.borrow();
    let written = writer_log.borrow();
    let seeks = seeks.borrow().clone();
    Outcome {
        stats,
        seeks,
        values: encoded.values.clone(),
        frame_sizes: encoded.frame_sizes.clone(),
        frame_pts: encoded.frame_pts.clone(),
        packets: written.packets,
        finished: written.finished,
    }
}

fn assert_non_decreasing(values: &[i16]) {
    for pair in values.windows(2) {
        assert!(pair[0] <= pair[1], "output went back in time: {:?}", pair);
    }
}

#[test]
fn test_single_cue_keeps_guarded_window() {
    let out = run_with(10_000, vec![cue(2000, 3000)], MockEncoder::new(None));
    let stats = out.stats.unwrap();

    assert_eq!(out.seeks, vec![1000]);
    assert!(out.finished);
    // 3 s at 48 kHz
    let total = out.values.len() as i64;
    assert!((total - 144_000).abs() <= 200, "got {} samples", total);
    assert!(*out.values.first().unwrap() >= 999);
    assert!(*out.values.last().unwrap() <= 3999);
    assert_non_decreasing(&out.values);

    assert_eq!(stats.cues_read, 1);
    assert_eq!(stats.cues_skipped, 0);
    assert_eq!(stats.samples_encoded, total as u64);
    assert_eq!(stats.samples_extracted, total as u64);
    assert_eq!(out.packets as u64, stats.packets_written);
}

#[test]
fn test_overlapping_cues_do_not_duplicate_audio() {
    let out = run_with(
        10_000,
        vec![cue(1000, 2000), cue(1500, 2500)],
        MockEncoder::new(None),
    );
    out.stats.unwrap();

    // Windows [0,3000) and [3000,3500)
    assert_eq!(out.seeks, vec![0, 3000]);
    let total = out.values.len() as i64;
    assert!((total - 168_000).abs() <= 200, "got {} samples", total);
    assert_eq!(out.values[0], 0);
    assert!(*out.values.last().unwrap() <= 3499);
    assert_non_decreasing(&out.values);
}

#[test]
fn test_covered_cue_is_skipped() {
    let out = run_with(
        10_000,
        vec![cue(2000, 5000), cue(2500, 3000)],
        MockEncoder::new(None),
    );
    let stats = out.stats.unwrap();

    assert_eq!(out.seeks, vec![1000]);
    assert_eq!(stats.cues_read, 2);
    assert_eq!(stats.cues_skipped, 1);
    assert_non_decreasing(&out.values);
}

#[test]
fn test_fixed_frame_size_encoder_gets_full_frames_and_short_tail() {
    let out = run_with(10_000, vec![cue(2000, 3000)], MockEncoder::new(Some(1152)));
    let stats = out.stats.unwrap();

    let (last, full) = out.frame_sizes.split_last().unwrap();
    assert!(full.iter().all(|&size| size == 1152));
    assert!(*last > 0 && *last <= 1152);
    assert_eq!(
        stats.samples_encoded,
        out.frame_sizes.iter().sum::<usize>() as u64
    );

    // Timestamps follow the cumulative sample count
    for (i, pts) in out.frame_pts.iter().enumerate() {
        assert_eq!(*pts, (i * 1152) as i64);
    }
    assert_non_decreasing(&out.values);
}

#[test]
fn test_variable_frame_size_encoder_gets_regions_as_cut() {
    let out = run_with(10_000, vec![cue(2000, 3000)], MockEncoder::new(None));
    out.stats.unwrap();

    // Interior frames pass through whole; only the window edges are cut
    let interior = &out.frame_sizes[1..out.frame_sizes.len() - 1];
    assert!(interior.iter().all(|&size| size == PACKET_SAMPLES));
    assert!(out.frame_sizes[0] < PACKET_SAMPLES);

    let mut expected = 0i64;
    for (pts, size) in out.frame_pts.iter().zip(&out.frame_sizes) {
        assert_eq!(*pts, expected);
        expected += *size as i64;
    }
}

#[test]
fn test_cue_running_past_end_of_audio() {
    // Window [8500,10800) but the audio stops at 10 s
    let out = run_with(10_000, vec![cue(9500, 9800)], MockEncoder::new(None));
    out.stats.unwrap();

    let total = out.values.len() as i64;
    assert!((total - 72_000).abs() <= 200, "got {} samples", total);
    assert_eq!(*out.values.last().unwrap(), 9999);
    assert!(out.finished);
}

#[test]
fn test_cue_entirely_past_end_of_audio() {
    let out = run_with(10_000, vec![cue(12_000, 13_000)], MockEncoder::new(Some(1152)));
    let stats = out.stats.unwrap();

    assert!(out.values.is_empty());
    assert_eq!(stats.samples_encoded, 0);
    assert!(out.finished);
}

#[test]
fn test_no_cues_produces_empty_finalized_output() {
    let out = run_with(10_000, Vec::new(), MockEncoder::new(None));
    let stats = out.stats.unwrap();

    assert_eq!(stats, PipelineStats::default());
    assert!(out.seeks.is_empty());
    assert!(out.finished);
}

#[test]
fn test_encoder_failure_aborts_without_trailer() {
    let out = run_with(
        10_000,
        vec![cue(2000, 3000)],
        MockEncoder::new(None).failing_at(3),
    );
    let err = out.stats.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CodecFailure);
    assert_eq!(out.frame_sizes.len(), 3);
    assert!(!out.finished);
}

#[test]
fn test_write_failure_aborts_without_trailer() {
    let out = run_stages(
        MockReader::new(10_000),
        vec![cue(2000, 3000)],
        MockEncoder::new(None),
        MockWriter::failing_at(5),
    );
    let err = out.stats.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IoFailure);
    assert_eq!(out.packets, 5);
    assert!(!out.finished);
}

#[test]
fn test_seek_failure_aborts_before_decoding() {
    let out = run_stages(
        MockReader::new(10_000).failing_seek(),
        vec![cue(2000, 3000), cue(6000, 7000)],
        MockEncoder::new(None),
        MockWriter::default(),
    );
    let err = out.stats.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IoFailure);
    assert_eq!(out.seeks, vec![1000]);
    assert!(out.values.is_empty());
    assert!(!out.finished);
}
