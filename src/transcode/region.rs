//! Sample region extraction
//!
//! Carves the samples covering a sub-range of a decoded frame's time span out
//! into a new frame. The time-to-sample mapping is a proportion of the
//! frame's millisecond span, floored, so consecutive extractions across cue
//! boundaries can be off by a sample or two. No remainder is carried between
//! calls.

use ffmpeg_next as ffmpeg;

use crate::error::{CueCutError, Result};
use crate::ffmpeg_utils::helpers;
use crate::timeline::TimeRange;

/// Sample index window `[skip, skip + count)` inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow {
    pub skip: usize,
    pub count: usize,
}

impl SampleWindow {
    /// Map `region` (which must lie inside `frame_range`) onto the `samples`
    /// samples of a frame covering `frame_range`.
    ///
    /// ```text
    /// skip  = floor(N * (region.start - frame.start) / frame.duration)
    /// count = floor(N * region.duration / frame.duration)
    /// ```
    pub fn locate(samples: usize, frame_range: TimeRange, region: TimeRange) -> Self {
        debug_assert!(
            frame_range.contains(&region),
            "region {:?} outside frame {:?}",
            region,
            frame_range
        );
        let n = samples as u128;
        let span = frame_range.duration_ms() as u128;
        let offset = (region.start() - frame_range.start()).max(0) as u128;
        let length = region.duration_ms() as u128;

        let skip = ((n * offset / span) as usize).min(samples);
        let count = ((n * length / span) as usize).min(samples - skip);
        Self { skip, count }
    }
}

/// Copy the samples of `frame` that fall inside `region` into a new frame of
/// the same format, layout and rate.
///
/// Returns `None` when the region maps to zero samples.
pub fn extract_region(
    frame: &ffmpeg::util::frame::Audio,
    frame_range: TimeRange,
    region: TimeRange,
) -> Result<Option<ffmpeg::util::frame::Audio>> {
    let window = SampleWindow::locate(frame.samples(), frame_range, region);
    if window.count == 0 {
        return Ok(None);
    }

    let format = frame.format();
    let channels = frame.channels() as usize;
    let unit = helpers::bytes_per_plane_sample(format, channels);
    let from = window.skip * unit;
    let to = (window.skip + window.count) * unit;

    let mut out = ffmpeg::util::frame::Audio::new(
        format,
        window.count,
        helpers::frame_channel_layout(frame),
    );
    out.set_rate(frame.rate());

    for plane in 0..helpers::plane_count(format, channels) {
        let src = helpers::audio_plane_data(frame, plane);
        if src.len() < to {
            return Err(CueCutError::InvalidInput(format!(
                "decoded plane {} holds {} bytes, expected at least {}",
                plane,
                src.len(),
                to
            )));
        }
        let dst = helpers::audio_plane_data_mut(&mut out, plane);
        if dst.len() < to - from {
            return Err(CueCutError::OutOfMemory(format!(
                "could not allocate {} samples x {} channels for region",
                window.count, channels
            )));
        }
        dst[..to - from].copy_from_slice(&src[from..to]);
    }

    tracing::trace!(
        frame_start_ms = frame_range.start(),
        frame_end_ms = frame_range.end(),
        region_start_ms = region.start(),
        region_end_ms = region.end(),
        skip = window.skip,
        count = window.count,
        "extracted sample region"
    );

    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_next::util::channel_layout::ChannelLayout;
    use ffmpeg_next::util::format::sample::{Sample, Type as SampleType};

    fn r(start: i64, end: i64) -> TimeRange {
        TimeRange::new(start, end).unwrap()
    }

    #[test]
    fn test_whole_frame_maps_to_all_samples() {
        let w = SampleWindow::locate(1024, r(981, 1003), r(981, 1003));
        assert_eq!(w, SampleWindow { skip: 0, count: 1024 });
    }

    #[test]
    fn test_partial_region() {
        let w = SampleWindow::locate(1024, r(981, 1003), r(1000, 1003));
        assert_eq!(w, SampleWindow { skip: 884, count: 139 });
    }

    #[test]
    fn test_split_frame_is_contiguous() {
        // A frame cut at the same instant by two neighbouring cues
        let frame = r(2987, 3008);
        let first = SampleWindow::locate(1024, frame, r(2987, 3000));
        let second = SampleWindow::locate(1024, frame, r(3000, 3008));
        assert_eq!(first.skip + first.count, second.skip);
    }

    #[test]
    fn test_window_stays_inside_frame() {
        for n in [1usize, 7, 960, 1024, 1152, 4096] {
            for (fs, fe) in [(0i64, 1i64), (0, 21), (981, 1003), (100, 197)] {
                let frame = r(fs, fe);
                for rs in fs..fe {
                    for re in (rs + 1)..=fe {
                        let w = SampleWindow::locate(n, frame, r(rs, re));
                        assert!(w.count <= n);
                        assert!(w.skip + w.count <= n, "n={} frame={:?} region={}..{}", n, frame, rs, re);
                    }
                }
            }
        }
    }

    fn fill_i16(frame: &mut ffmpeg::util::frame::Audio, plane: usize, values: impl Iterator<Item = i16>) {
        let data = helpers::audio_plane_data_mut(frame, plane);
        for (chunk, v) in data.chunks_exact_mut(2).zip(values) {
            chunk.copy_from_slice(&v.to_ne_bytes());
        }
    }

    fn read_i16(frame: &ffmpeg::util::frame::Audio, plane: usize, count: usize) -> Vec<i16> {
        helpers::audio_plane_data(frame, plane)
            .chunks_exact(2)
            .take(count)
            .map(|c| i16::from_ne_bytes([c[0], c[1]]))
            .collect()
    }

    #[test]
    fn test_extract_planar_copies_each_channel() {
        let mut frame =
            ffmpeg::util::frame::Audio::new(Sample::I16(SampleType::Planar), 100, ChannelLayout::STEREO);
        frame.set_rate(1000);
        fill_i16(&mut frame, 0, 0..100);
        fill_i16(&mut frame, 1, (0..100).map(|v| -v));

        let out = extract_region(&frame, r(0, 100), r(10, 20)).unwrap().unwrap();
        assert_eq!(out.samples(), 10);
        assert_eq!(out.rate(), 1000);
        assert_eq!(read_i16(&out, 0, 10), (10..20).collect::<Vec<i16>>());
        assert_eq!(read_i16(&out, 1, 10), (10..20).map(|v| -v).collect::<Vec<i16>>());
    }

    #[test]
    fn test_extract_packed_copies_interleaved_frames() {
        let mut frame =
            ffmpeg::util::frame::Audio::new(Sample::I16(SampleType::Packed), 50, ChannelLayout::STEREO);
        frame.set_rate(1000);
        // L/R pairs: (i, 1000 + i)
        fill_i16(
            &mut frame,
            0,
            (0..50).flat_map(|i| [i as i16, 1000 + i as i16]),
        );

        let out = extract_region(&frame, r(0, 50), r(40, 50)).unwrap().unwrap();
        assert_eq!(out.samples(), 10);
        let values = read_i16(&out, 0, 20);
        assert_eq!(values[0], 40);
        assert_eq!(values[1], 1040);
        assert_eq!(values[18], 49);
        assert_eq!(values[19], 1049);
    }

    #[test]
    fn test_extract_empty_window() {
        let frame =
            ffmpeg::util::frame::Audio::new(Sample::I16(SampleType::Packed), 4, ChannelLayout::MONO);
        // 4 samples over 100 ms: a 1 ms region maps to zero samples
        assert!(extract_region(&frame, r(0, 100), r(50, 51)).unwrap().is_none());
    }
}
