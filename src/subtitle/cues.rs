//! Cue sources and cue window planning

use std::path::Path;

use ffmpeg_next as ffmpeg;

use super::extractor::payload_text;
use crate::error::{CueCutError, FfmpegError, Result};
use crate::ffmpeg_utils::utils::format_timestamp;
use crate::timeline::timebase::is_valid_timebase;
use crate::timeline::{ticks_to_ms, TimeRange};

/// An ordered, lazy, finite sequence of cue time ranges.
///
/// Not restartable: once `next_cue` returns `Ok(None)` the source is spent.
pub trait CueSource {
    fn next_cue(&mut self) -> Result<Option<TimeRange>>;
}

/// In-memory cue source
#[derive(Debug, Clone)]
pub struct CueList {
    cues: std::vec::IntoIter<TimeRange>,
}

impl CueList {
    pub fn new(cues: Vec<TimeRange>) -> Self {
        Self {
            cues: cues.into_iter(),
        }
    }
}

impl CueSource for CueList {
    fn next_cue(&mut self) -> Result<Option<TimeRange>> {
        Ok(self.cues.next())
    }
}

/// Cue source reading packets of one text subtitle stream.
///
/// Owns its own demuxer, so the subtitle stream can live in the audio file
/// itself or in a separate file (`.srt`, `.ass`, ...).
pub struct SubtitleCueSource {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    codec_id: ffmpeg::codec::Id,
    time_base: ffmpeg::Rational,
    /// Used for packets that carry no duration
    default_duration_ms: i64,
}

impl SubtitleCueSource {
    /// Open `path` and read cues from its stream `stream_index`.
    pub fn open(path: &Path, stream_index: usize, default_duration_ms: i64) -> Result<Self> {
        let input = ffmpeg::format::input(path).map_err(|e| {
            FfmpegError::OpenInput(format!("{}: {}", path.display(), e))
        })?;

        let stream = input.stream(stream_index).ok_or_else(|| {
            CueCutError::StreamNotFound(format!(
                "{} has no stream {}",
                path.display(),
                stream_index
            ))
        })?;
        if stream.parameters().medium() != ffmpeg::media::Type::Subtitle {
            return Err(CueCutError::InvalidInput(format!(
                "stream {} of {} is not a subtitle stream",
                stream_index,
                path.display()
            )));
        }
        let codec_id = stream.parameters().id();
        let time_base = stream.time_base();
        if !is_valid_timebase(time_base) {
            return Err(FfmpegError::InvalidTimebase(format!(
                "subtitle stream {} has timebase {}/{}",
                stream_index,
                time_base.numerator(),
                time_base.denominator()
            ))
            .into());
        }

        tracing::debug!(
            path = %path.display(),
            stream_index,
            codec = ?codec_id,
            "opened cue source"
        );

        Ok(Self {
            input,
            stream_index,
            codec_id,
            time_base,
            default_duration_ms,
        })
    }
}

impl CueSource for SubtitleCueSource {
    fn next_cue(&mut self) -> Result<Option<TimeRange>> {
        loop {
            let mut packet = ffmpeg::Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {}
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(e) => {
                    return Err(FfmpegError::ReadPacket(format!(
                        "subtitle stream {}: {}",
                        self.stream_index, e
                    ))
                    .into())
                }
            }
            if packet.stream() != self.stream_index {
                continue;
            }

            let text = payload_text(self.codec_id, packet.data().unwrap_or(&[]));
            if text.is_empty() {
                tracing::trace!(pts = ?packet.pts(), "skipping blank subtitle event");
                continue;
            }

            let cue = packet_cue(
                self.time_base,
                packet.pts(),
                packet.duration(),
                self.default_duration_ms,
            )
            .map_err(|e| {
                CueCutError::InvalidInput(format!("stream {}: {}", self.stream_index, e))
            })?;

            tracing::trace!(
                start = %format_timestamp(cue.start()),
                end = %format_timestamp(cue.end()),
                "read cue"
            );
            return Ok(Some(cue));
        }
    }
}

/// Millisecond range of a subtitle packet with timestamps in `time_base`.
///
/// Packets without a duration last `default_duration_ms`; every cue is at
/// least 1 ms long.
fn packet_cue(
    time_base: ffmpeg::Rational,
    pts: Option<i64>,
    duration: i64,
    default_duration_ms: i64,
) -> std::result::Result<TimeRange, String> {
    let pts = pts.ok_or("subtitle packet without timestamp")?;
    let start = ticks_to_ms(time_base, pts);
    let end = if duration > 0 {
        ticks_to_ms(time_base, pts.saturating_add(duration))
    } else {
        start + default_duration_ms
    };
    TimeRange::new(start, end.max(start + 1))
        .ok_or_else(|| format!("cue at {} ms has no extent", start))
}

/// Turns cues into effective extraction windows.
///
/// Each cue is widened by the guard margin, then its start is clamped to the
/// previous window's end so no audio is extracted twice.
#[derive(Debug, Clone)]
pub struct CueWindowPlanner {
    margin_ms: i64,
    previous_end: Option<i64>,
}

impl CueWindowPlanner {
    pub fn new(margin_ms: i64) -> Self {
        Self {
            margin_ms,
            previous_end: None,
        }
    }

    /// Effective window for the next cue, or `None` when earlier windows
    /// already cover it entirely.
    pub fn plan(&mut self, cue: TimeRange) -> Option<TimeRange> {
        let expanded = cue.expand(self.margin_ms);
        let start = match self.previous_end {
            Some(end) => expanded.start().max(end),
            None => expanded.start(),
        };
        let window = TimeRange::new(start, expanded.end())?;
        self.previous_end = Some(window.end());
        Some(window)
    }

    /// End of the last window handed out.
    pub fn previous_end(&self) -> Option<i64> {
        self.previous_end
    }
}
