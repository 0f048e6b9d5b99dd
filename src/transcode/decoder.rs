//! Audio decoder
//!
//! Wraps an FFmpeg `AVCodecContext` to decode compressed audio packets
//! (MP3, AAC, AC-3, Opus, FLAC, PCM, ...) into raw PCM `AVFrame`s.

use ffmpeg_next as ffmpeg;

use super::{DecodeStatus, FrameDecoder};
use crate::error::{FfmpegError, Result};
use crate::ffmpeg_utils::helpers;
use crate::timeline::timebase::is_valid_timebase;

/// Packets after an open or flush (i.e. right after a seek) whose
/// `AVERROR_INVALIDDATA` is tolerated: decoders reject pre-roll packets that
/// depend on data before the seek point.
pub const PREROLL_PACKETS: usize = 4;

/// Decide whether a `send_packet`/`send_eof` result stops the run.
///
/// `packets_since_flush` counts the packet just sent (1 for the first one);
/// it is 0 for the end-of-stream signal.
fn check_send(
    result: std::result::Result<(), ffmpeg::Error>,
    end_of_stream: bool,
    packets_since_flush: usize,
    stream_index: usize,
) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(ffmpeg::Error::InvalidData)
            if !end_of_stream && packets_since_flush <= PREROLL_PACKETS =>
        {
            tracing::debug!(
                stream_index,
                packet = packets_since_flush,
                "send_packet: skipping pre-roll packet after seek"
            );
            Ok(())
        }
        // Draining was already requested
        Err(ffmpeg::Error::Eof) if end_of_stream => Ok(()),
        Err(ffmpeg::Error::Other { errno })
            if end_of_stream && errno == ffmpeg::error::EAGAIN =>
        {
            Ok(())
        }
        Err(e) => Err(FfmpegError::DecodePacket(format!(
            "{} error on stream {}: {}",
            if end_of_stream { "send_eof" } else { "send_packet" },
            stream_index,
            e
        ))
        .into()),
    }
}

/// Audio decoder backed by an FFmpeg codec context
pub struct AudioDecoder {
    decoder: ffmpeg::decoder::Audio,
    /// Stream index in the source file
    stream_index: usize,
    /// Timebase of the source stream; decoded frames carry packet timestamps
    time_base: ffmpeg::Rational,
    /// Packets submitted since open or the last flush
    packets_since_flush: usize,
}

impl AudioDecoder {
    /// Open a decoder for the given stream from its own codec parameters.
    pub fn open(stream: &ffmpeg::format::stream::Stream) -> Result<Self> {
        let stream_index = stream.index();
        let time_base = stream.time_base();
        if !is_valid_timebase(time_base) {
            return Err(FfmpegError::InvalidTimebase(format!(
                "audio stream {} has timebase {}/{}",
                stream_index,
                time_base.numerator(),
                time_base.denominator()
            ))
            .into());
        }

        let codec_id = stream.parameters().id();
        if !helpers::decoder_exists(codec_id) {
            return Err(FfmpegError::DecoderNotFound(format!(
                "no decoder for {:?} (stream {})",
                codec_id, stream_index
            ))
            .into());
        }

        let context =
            ffmpeg::codec::Context::from_parameters(stream.parameters()).map_err(|e| {
                FfmpegError::DecoderCreate(format!(
                    "Failed to create codec context for stream {}: {}",
                    stream_index, e
                ))
            })?;

        let decoder = context.decoder().audio().map_err(|e| {
            FfmpegError::DecoderCreate(format!(
                "Failed to open audio decoder for stream {}: {}",
                stream_index, e
            ))
        })?;

        tracing::debug!(
            stream_index,
            codec = ?codec_id,
            sample_rate = decoder.rate(),
            channels = decoder.channels(),
            "opened audio decoder"
        );

        Ok(Self {
            decoder,
            stream_index,
            time_base,
            packets_since_flush: 0,
        })
    }
}

impl FrameDecoder for AudioDecoder {
    fn time_base(&self) -> ffmpeg::Rational {
        self.time_base
    }

    fn submit(&mut self, packet: Option<&ffmpeg::Packet>) -> Result<()> {
        let result = match packet {
            Some(packet) => {
                self.packets_since_flush += 1;
                self.decoder.send_packet(packet)
            }
            None => self.decoder.send_eof(),
        };
        let count = if packet.is_some() {
            self.packets_since_flush
        } else {
            0
        };
        check_send(result, packet.is_none(), count, self.stream_index)
    }

    fn receive(&mut self) -> Result<DecodeStatus> {
        let mut frame = ffmpeg::util::frame::Audio::empty();
        match self.decoder.receive_frame(&mut frame) {
            Ok(()) => Ok(DecodeStatus::Frame(frame)),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => {
                Ok(DecodeStatus::NeedsMoreInput)
            }
            Err(ffmpeg::Error::Eof) => Ok(DecodeStatus::EndOfStream),
            Err(e) => Err(FfmpegError::DecodePacket(format!(
                "receive_frame error on stream {}: {}",
                self.stream_index, e
            ))
            .into()),
        }
    }

    fn flush(&mut self) {
        self.decoder.flush();
        self.packets_since_flush = 0;
    }
}
