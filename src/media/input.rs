//! Audio packet reader

use std::path::{Path, PathBuf};

use ffmpeg_next as ffmpeg;

use crate::error::{CueCutError, FfmpegError, Result};
use crate::timeline::ms_to_ticks;
use crate::transcode::PacketReader;

/// `AV_TIME_BASE` units: container-level seeks are expressed in microseconds
const AV_TIME_BASE_Q: ffmpeg::Rational = ffmpeg::Rational(1, ffmpeg::ffi::AV_TIME_BASE as i32);

/// Demuxer positioned on one audio stream of a media file.
pub struct AudioInput {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    path: PathBuf,
}

impl AudioInput {
    /// Open `path` for reading packets of stream `stream_index`.
    pub fn open(path: &Path, stream_index: usize) -> Result<Self> {
        let input = ffmpeg::format::input(path)
            .map_err(|e| FfmpegError::OpenInput(format!("{}: {}", path.display(), e)))?;

        let stream = input.stream(stream_index).ok_or_else(|| {
            CueCutError::StreamNotFound(format!(
                "{} has no stream {}",
                path.display(),
                stream_index
            ))
        })?;
        if stream.parameters().medium() != ffmpeg::media::Type::Audio {
            return Err(CueCutError::InvalidInput(format!(
                "stream {} of {} is not an audio stream",
                stream_index,
                path.display()
            )));
        }

        Ok(Self {
            input,
            stream_index,
            path: path.to_path_buf(),
        })
    }

    /// The selected audio stream, for opening its decoder.
    pub fn stream(&self) -> Result<ffmpeg::format::stream::Stream<'_>> {
        self.input.stream(self.stream_index).ok_or_else(|| {
            CueCutError::StreamNotFound(format!(
                "{} has no stream {}",
                self.path.display(),
                self.stream_index
            ))
        })
    }
}

impl PacketReader for AudioInput {
    fn seek_backward(&mut self, position_ms: i64) -> Result<()> {
        let target = ms_to_ticks(AV_TIME_BASE_Q, position_ms.max(0));
        // `..target` bounds the landing point from above: never after `target`
        self.input.seek(target, ..target).map_err(|e| {
            FfmpegError::Seek(format!(
                "{}: seek to {} ms failed: {}",
                self.path.display(),
                position_ms,
                e
            ))
        })?;
        tracing::trace!(position_ms, seek_ts = target, "seeked audio input");
        Ok(())
    }

    fn read_packet(&mut self) -> Result<Option<ffmpeg::Packet>> {
        loop {
            let mut packet = ffmpeg::Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        return Ok(Some(packet));
                    }
                }
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(e) => {
                    return Err(FfmpegError::ReadPacket(format!(
                        "{}: {}",
                        self.path.display(),
                        e
                    ))
                    .into())
                }
            }
        }
    }
}
