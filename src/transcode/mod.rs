//! Audio transcoding module
//!
//! This module holds the cue-synchronized extraction core:
//! - Collaborator contracts (packet reader, decoder, resampler, encoder, writer)
//! - FFmpeg-backed decoder, resampler and encoder
//! - Sample region extraction from decoded frames
//! - Frame-size adapting sample FIFO
//! - The cue-driven synchronization loop

pub mod decoder;
pub mod encoder;
pub mod fifo;
pub mod pipeline;
pub mod region;
pub mod resampler;

use ffmpeg_next as ffmpeg;
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::Sample;

use crate::error::Result;

/// Outcome of asking a decoder for a frame.
pub enum DecodeStatus {
    Frame(ffmpeg::util::frame::Audio),
    /// Backpressure: submit another packet first
    NeedsMoreInput,
    /// The decoder has been drained after an end-of-stream signal
    EndOfStream,
}

/// Outcome of asking an encoder for a packet.
pub enum EncodeStatus {
    Packet(ffmpeg::Packet),
    /// Backpressure: submit another frame first
    NeedsMoreInput,
    /// The encoder has been drained after an end-of-stream signal
    EndOfStream,
}

/// Sample format, channel layout and rate of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcmFormat {
    pub format: Sample,
    pub layout: ChannelLayout,
    pub channels: u16,
    pub rate: u32,
}

/// Reads compressed packets of one already-selected audio stream.
pub trait PacketReader {
    /// Position the read cursor at or before `position_ms`, never after.
    fn seek_backward(&mut self, position_ms: i64) -> Result<()>;

    /// Next packet of the audio stream, or `None` at end of stream.
    /// Packets of other streams are skipped.
    fn read_packet(&mut self) -> Result<Option<ffmpeg::Packet>>;
}

/// Decodes packets into PCM frames (push/pull).
pub trait FrameDecoder {
    /// Timebase of decoded frame timestamps.
    fn time_base(&self) -> ffmpeg::Rational;

    /// Submit a packet, or `None` to signal end of stream.
    fn submit(&mut self, packet: Option<&ffmpeg::Packet>) -> Result<()>;

    fn receive(&mut self) -> Result<DecodeStatus>;

    /// Drop any buffered state without closing; also clears end of stream.
    fn flush(&mut self);
}

/// Converts PCM frames to the encoder's format/layout/rate.
pub trait FrameResampler {
    /// Convert one frame. `None` when the resampler buffered everything.
    fn convert(
        &mut self,
        frame: &ffmpeg::util::frame::Audio,
    ) -> Result<Option<ffmpeg::util::frame::Audio>>;

    /// Drain samples still held back by the resampler.
    fn flush(&mut self) -> Result<Option<ffmpeg::util::frame::Audio>>;
}

/// Encodes PCM frames into compressed packets (push/pull).
pub trait FrameEncoder {
    /// Format the encoder expects its input frames in.
    fn input_format(&self) -> PcmFormat;

    /// `Some(n)` if every frame but the last must hold exactly `n` samples.
    fn fixed_frame_size(&self) -> Option<usize>;

    /// Timebase of frame and packet timestamps.
    fn time_base(&self) -> ffmpeg::Rational;

    /// Submit a frame, or `None` to signal end of stream.
    fn submit(&mut self, frame: Option<&ffmpeg::util::frame::Audio>) -> Result<()>;

    fn receive(&mut self) -> Result<EncodeStatus>;
}

/// Writes encoded packets into the output container.
pub trait PacketWriter {
    /// Write one packet whose timestamps are in the encoder timebase.
    fn write_packet(&mut self, packet: ffmpeg::Packet) -> Result<()>;

    /// Finalize the container (trailer).
    fn finish(&mut self) -> Result<()>;
}
