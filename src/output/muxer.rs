//! Single-stream audio muxer
//!
//! Writes encoded packets into the output file. The container is chosen from
//! the file extension unless a format name is given explicitly.

use std::path::{Path, PathBuf};

use ffmpeg_next as ffmpeg;

use crate::error::{FfmpegError, Result};
use crate::ffmpeg_utils::helpers;
use crate::transcode::PacketWriter;

/// Muxer writing one audio stream to a file
pub struct AudioMuxer {
    output: ffmpeg::format::context::Output,
    stream_index: usize,
    /// Timebase of incoming packet timestamps
    encoder_time_base: ffmpeg::Rational,
    /// Timebase the muxer settled on in `write_header`
    stream_time_base: ffmpeg::Rational,
    path: PathBuf,
    trailer_written: bool,
}

impl AudioMuxer {
    /// Create the output file, add the audio stream described by `params` and
    /// write the container header.
    pub fn open(
        path: &Path,
        format: Option<&str>,
        params: &ffmpeg::codec::Parameters,
        encoder_time_base: ffmpeg::Rational,
    ) -> Result<Self> {
        let mut output = match format {
            Some(name) => ffmpeg::format::output_as(path, name),
            None => ffmpeg::format::output(path),
        }
        .map_err(|e| FfmpegError::MuxerCreate(format!("{}: {}", path.display(), e)))?;

        let mut out_stream = output
            .add_stream(ffmpeg::encoder::find(ffmpeg::codec::Id::None))
            .map_err(|e| FfmpegError::MuxerCreate(format!("Failed to add audio stream: {}", e)))?;
        out_stream.set_parameters(params.clone());
        // Let the muxer pick the tag for its own container
        helpers::stream_reset_codec_tag(&mut out_stream);
        out_stream.set_time_base(encoder_time_base);
        let stream_index = out_stream.index();

        output
            .write_header()
            .map_err(|e| FfmpegError::WriteHeader(format!("{}: {}", path.display(), e)))?;

        // The header may replace the requested timebase with the container's own
        let stream_time_base = output
            .stream(stream_index)
            .map(|s| s.time_base())
            .unwrap_or(encoder_time_base);

        tracing::debug!(
            path = %path.display(),
            format = output.format().name(),
            stream_time_base = %format!("{}/{}", stream_time_base.numerator(), stream_time_base.denominator()),
            "opened output"
        );

        Ok(Self {
            output,
            stream_index,
            encoder_time_base,
            stream_time_base,
            path: path.to_path_buf(),
            trailer_written: false,
        })
    }
}

impl PacketWriter for AudioMuxer {
    fn write_packet(&mut self, mut packet: ffmpeg::Packet) -> Result<()> {
        packet.set_stream(self.stream_index);
        packet.set_position(-1);
        packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
        packet
            .write_interleaved(&mut self.output)
            .map_err(|e| FfmpegError::WritePacket(format!("{}: {}", self.path.display(), e)))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.trailer_written {
            return Ok(());
        }
        self.output
            .write_trailer()
            .map_err(|e| FfmpegError::WriteTrailer(format!("{}: {}", self.path.display(), e)))?;
        self.trailer_written = true;
        Ok(())
    }
}
