//! Audio encoder
//!
//! Wraps an FFmpeg `AVCodecContext` to encode PCM frames in the configured
//! target format into compressed packets.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::codec;

use super::{EncodeStatus, FrameEncoder, PcmFormat};
use crate::config::EncoderConfig;
use crate::error::{CueCutError, FfmpegError, Result};
use crate::ffmpeg_utils::helpers;

/// Short codec names accepted in configuration, mapped to codec ids.
const CODEC_ALIASES: &[(&str, codec::Id)] = &[
    ("mp3", codec::Id::MP3),
    ("aac", codec::Id::AAC),
    ("mp2", codec::Id::MP2),
    ("flac", codec::Id::FLAC),
    ("opus", codec::Id::OPUS),
    ("vorbis", codec::Id::VORBIS),
    ("pcm_s16le", codec::Id::PCM_S16LE),
];

/// Resolve a configured codec name to an FFmpeg encoder.
///
/// Short aliases are tried first, then any encoder registered under the name
/// (`libmp3lame`, `libopus`, ...).
pub fn find_encoder(name: &str) -> Option<ffmpeg::Codec> {
    let lower = name.to_ascii_lowercase();
    CODEC_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .and_then(|(_, id)| codec::encoder::find(*id))
        .or_else(|| codec::encoder::find_by_name(&lower))
}

/// Audio encoder backed by a real FFmpeg codec context
pub struct AudioEncoder {
    encoder: ffmpeg::codec::encoder::audio::Encoder,
    input_format: PcmFormat,
    fixed_frame_size: Option<usize>,
    time_base: ffmpeg::Rational,
    /// Fallback timestamp for packets the codec leaves unstamped
    next_pts: i64,
}

impl AudioEncoder {
    /// Open an encoder for the configured codec and target format.
    pub fn open(config: &EncoderConfig) -> Result<Self> {
        let codec = find_encoder(&config.codec).ok_or_else(|| {
            FfmpegError::EncoderNotFound(format!(
                "no '{}' encoder in this FFmpeg build",
                config.codec
            ))
        })?;

        let format = helpers::parse_sample_format(&config.sample_format).ok_or_else(|| {
            CueCutError::Config(format!("unknown sample format '{}'", config.sample_format))
        })?;
        let layout = helpers::layout_for_channels(config.channels);
        let time_base = ffmpeg::Rational::new(1, config.sample_rate as i32);

        // Build context and configure the audio encoder BEFORE opening
        let mut context = codec::Context::new_with_codec(codec);
        context.set_time_base(time_base);

        let mut audio_enc = context.encoder().audio().map_err(|e| {
            FfmpegError::EncoderCreate(format!("Cannot get audio encoder handle: {}", e))
        })?;

        audio_enc.set_rate(config.sample_rate as i32);
        audio_enc.set_format(format);
        audio_enc.set_channel_layout(layout);
        audio_enc.set_bit_rate(config.bit_rate as usize);

        let encoder = audio_enc.open_as(codec).map_err(|e| {
            FfmpegError::EncoderCreate(format!(
                "Failed to open {} encoder ({} Hz, {} ch, {}): {}",
                codec.name(),
                config.sample_rate,
                config.channels,
                config.sample_format,
                e
            ))
        })?;

        let variable = codec
            .capabilities()
            .contains(codec::capabilities::Capabilities::VARIABLE_FRAME_SIZE);
        let frame_size = encoder.frame_size() as usize;
        let fixed_frame_size = (frame_size > 0 && !variable).then_some(frame_size);

        tracing::debug!(
            codec = codec.name(),
            sample_rate = config.sample_rate,
            channels = config.channels,
            sample_format = config.sample_format.as_str(),
            bit_rate = config.bit_rate,
            fixed_frame_size = ?fixed_frame_size,
            "opened audio encoder"
        );

        Ok(Self {
            encoder,
            input_format: PcmFormat {
                format,
                layout,
                channels: config.channels,
                rate: config.sample_rate,
            },
            fixed_frame_size,
            time_base,
            next_pts: 0,
        })
    }

    /// Codec parameters for the encoded stream (for muxer stream setup).
    pub fn codec_parameters(&self) -> ffmpeg::codec::Parameters {
        helpers::encoder_codec_parameters(&self.encoder)
    }
}

impl FrameEncoder for AudioEncoder {
    fn input_format(&self) -> PcmFormat {
        self.input_format
    }

    fn fixed_frame_size(&self) -> Option<usize> {
        self.fixed_frame_size
    }

    fn time_base(&self) -> ffmpeg::Rational {
        self.time_base
    }

    fn submit(&mut self, frame: Option<&ffmpeg::util::frame::Audio>) -> Result<()> {
        let result = match frame {
            Some(frame) => self.encoder.send_frame(frame),
            None => self.encoder.send_eof(),
        };
        match result {
            Ok(()) => Ok(()),
            Err(ffmpeg::Error::Eof) if frame.is_none() => Ok(()),
            Err(e) => Err(FfmpegError::EncodeFrame(format!(
                "{} error: {}",
                if frame.is_some() { "send_frame" } else { "send_eof" },
                e
            ))
            .into()),
        }
    }

    fn receive(&mut self) -> Result<EncodeStatus> {
        let mut packet = ffmpeg::Packet::empty();
        match self.encoder.receive_packet(&mut packet) {
            Ok(()) => {
                if packet.pts().is_none() {
                    packet.set_pts(Some(self.next_pts));
                    packet.set_dts(Some(self.next_pts));
                }
                let pts = packet.pts().unwrap_or(self.next_pts);
                self.next_pts = pts + packet.duration().max(0);
                Ok(EncodeStatus::Packet(packet))
            }
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => {
                Ok(EncodeStatus::NeedsMoreInput)
            }
            Err(ffmpeg::Error::Eof) => Ok(EncodeStatus::EndOfStream),
            Err(e) => Err(
                FfmpegError::EncodeFrame(format!("receive_packet error: {}", e)).into(),
            ),
        }
    }
}
