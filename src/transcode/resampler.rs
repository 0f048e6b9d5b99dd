//! Audio resampler
//!
//! Converts extracted PCM frames to the encoder's sample format, channel
//! layout and rate. The `SwrContext` is configured lazily from the first frame
//! it sees, since the decoded format is only reliably known once decoding has
//! started.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::software::resampling;

use super::{FrameResampler, PcmFormat};
use crate::error::{CueCutError, FfmpegError, Result};
use crate::ffmpeg_utils::helpers;

/// Extra output room on top of the rate-scaled sample count, for samples the
/// resampler held back from earlier calls.
const OUTPUT_HEADROOM: usize = 256;

/// Output capacity used when draining the resampler's delay.
const FLUSH_CAPACITY: usize = 4096;

/// Audio resampler wrapping FFmpeg's `SwrContext`
pub struct AudioResampler {
    context: Option<resampling::Context>,
    target: PcmFormat,
    source_rate: u32,
}

impl AudioResampler {
    /// Create a resampler producing `target`. No FFmpeg state is allocated
    /// until the first frame arrives.
    pub fn new(target: PcmFormat) -> Self {
        Self {
            context: None,
            target,
            source_rate: 0,
        }
    }

    fn context_for(
        &mut self,
        frame: &ffmpeg::util::frame::Audio,
    ) -> Result<&mut resampling::Context> {
        if self.context.is_none() {
            let src_layout = helpers::frame_channel_layout(frame);
            tracing::debug!(
                src_rate = frame.rate(),
                src_channels = frame.channels(),
                src_format = ?frame.format(),
                dst_rate = self.target.rate,
                dst_channels = self.target.channels,
                dst_format = ?self.target.format,
                "creating resampler from first frame"
            );
            let context = resampling::Context::get(
                frame.format(),
                src_layout,
                frame.rate(),
                self.target.format,
                self.target.layout,
                self.target.rate,
            )
            .map_err(|e| {
                FfmpegError::ResamplerCreate(format!(
                    "Failed to create resampling context: {}",
                    e
                ))
            })?;
            self.source_rate = frame.rate();
            self.context = Some(context);
        }
        self.context.as_mut().ok_or_else(|| {
            CueCutError::Ffmpeg(FfmpegError::ResamplerCreate(
                "resampling context unavailable".into(),
            ))
        })
    }

    /// Output samples needed for `samples` input samples at the source rate.
    fn output_capacity(&self, samples: usize) -> usize {
        let source_rate = self.source_rate.max(1) as u64;
        let scaled = (samples as u64 * self.target.rate as u64).div_ceil(source_rate);
        scaled as usize + OUTPUT_HEADROOM
    }

    fn empty_output(&self, capacity: usize) -> ffmpeg::util::frame::Audio {
        let mut out =
            ffmpeg::util::frame::Audio::new(self.target.format, capacity, self.target.layout);
        out.set_rate(self.target.rate);
        out
    }
}

impl FrameResampler for AudioResampler {
    fn convert(
        &mut self,
        frame: &ffmpeg::util::frame::Audio,
    ) -> Result<Option<ffmpeg::util::frame::Audio>> {
        self.context_for(frame)?;
        let mut out = self.empty_output(self.output_capacity(frame.samples()));
        if helpers::audio_plane_data(&out, 0).is_empty() {
            return Err(CueCutError::OutOfMemory(format!(
                "could not allocate {} sample resampler output",
                frame.samples()
            )));
        }

        let context = self.context_for(frame)?;
        context
            .run(frame, &mut out)
            .map_err(|e| FfmpegError::Resample(format!("Resampling error: {}", e)))?;

        if out.samples() == 0 {
            return Ok(None);
        }
        Ok(Some(out))
    }

    /// `None` when nothing was ever converted or nothing is buffered.
    fn flush(&mut self) -> Result<Option<ffmpeg::util::frame::Audio>> {
        if self.context.is_none() {
            return Ok(None);
        }
        let mut out = self.empty_output(FLUSH_CAPACITY);
        let Some(context) = self.context.as_mut() else {
            return Ok(None);
        };
        context
            .flush(&mut out)
            .map_err(|e| FfmpegError::Resample(format!("Resampler flush error: {}", e)))?;

        if out.samples() == 0 {
            return Ok(None);
        }
        Ok(Some(out))
    }
}
