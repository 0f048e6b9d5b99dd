//! Frame-size adapting sample queue
//!
//! Encoders without variable frame size support (MP3, MP2, AAC, ...) demand
//! exactly `frame_size` samples per input frame except the last. Resampled
//! audio arrives in arbitrary chunk sizes, so it is accumulated here per plane
//! and released in fixed-size frames.

use ffmpeg_next as ffmpeg;

use super::PcmFormat;
use crate::error::{CueCutError, Result};
use crate::ffmpeg_utils::helpers;

/// Per-plane FIFO of samples in the encoder's input format.
pub struct SampleFifo {
    format: PcmFormat,
    frame_size: usize,
    /// Bytes per sample instant within one plane
    unit: usize,
    planes: Vec<Vec<u8>>,
}

impl SampleFifo {
    /// Create an empty queue releasing frames of `frame_size` samples.
    pub fn new(format: PcmFormat, frame_size: usize) -> Self {
        let channels = format.channels as usize;
        let plane_count = helpers::plane_count(format.format, channels);
        Self {
            format,
            frame_size: frame_size.max(1),
            unit: helpers::bytes_per_plane_sample(format.format, channels),
            planes: vec![Vec::new(); plane_count],
        }
    }

    /// Number of queued samples (per channel).
    pub fn len(&self) -> usize {
        self.planes.first().map_or(0, |p| p.len() / self.unit)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Append `samples` samples given as one byte slice per plane.
    pub fn enqueue(&mut self, planes: &[&[u8]], samples: usize) -> Result<()> {
        if planes.len() != self.planes.len() {
            return Err(CueCutError::InvalidInput(format!(
                "sample queue expects {} planes, got {}",
                self.planes.len(),
                planes.len()
            )));
        }
        let bytes = samples * self.unit;
        for (queue, data) in self.planes.iter_mut().zip(planes) {
            if data.len() < bytes {
                return Err(CueCutError::InvalidInput(format!(
                    "plane holds {} bytes, expected {}",
                    data.len(),
                    bytes
                )));
            }
            queue.try_reserve(bytes).map_err(|e| {
                CueCutError::OutOfMemory(format!("sample queue growth by {} bytes: {}", bytes, e))
            })?;
            queue.extend_from_slice(&data[..bytes]);
        }
        Ok(())
    }

    /// Append all samples of a frame already in the queue's format.
    pub fn enqueue_frame(&mut self, frame: &ffmpeg::util::frame::Audio) -> Result<()> {
        if frame.format() != self.format.format || frame.channels() != self.format.channels {
            return Err(CueCutError::InvalidInput(format!(
                "frame {:?}/{}ch does not match queue {:?}/{}ch",
                frame.format(),
                frame.channels(),
                self.format.format,
                self.format.channels
            )));
        }
        let planes: Vec<&[u8]> = (0..self.planes.len())
            .map(|i| helpers::audio_plane_data(frame, i))
            .collect();
        self.enqueue(&planes, frame.samples())
    }

    /// Size of the next frame to release, if any.
    ///
    /// A full frame when enough samples are queued; otherwise the remainder,
    /// but only once `end_of_stream` is signalled and something is left.
    fn next_frame_len(&self, end_of_stream: bool) -> Option<usize> {
        let len = self.len();
        if len >= self.frame_size {
            Some(self.frame_size)
        } else if end_of_stream && len > 0 {
            Some(len)
        } else {
            None
        }
    }

    /// Remove the next frame's samples as raw planes.
    ///
    /// `None` means "not enough yet" (or, at end of stream, empty).
    pub fn try_dequeue_planes(&mut self, end_of_stream: bool) -> Option<Vec<Vec<u8>>> {
        let samples = self.next_frame_len(end_of_stream)?;
        let bytes = samples * self.unit;
        Some(
            self.planes
                .iter_mut()
                .map(|p| p.drain(..bytes).collect())
                .collect(),
        )
    }

    /// Remove the next frame as an encoder-ready audio frame.
    pub fn try_dequeue(
        &mut self,
        end_of_stream: bool,
    ) -> Result<Option<ffmpeg::util::frame::Audio>> {
        let Some(planes) = self.try_dequeue_planes(end_of_stream) else {
            return Ok(None);
        };
        let samples = planes[0].len() / self.unit;

        let mut frame =
            ffmpeg::util::frame::Audio::new(self.format.format, samples, self.format.layout);
        frame.set_rate(self.format.rate);
        for (i, data) in planes.iter().enumerate() {
            let dst = helpers::audio_plane_data_mut(&mut frame, i);
            if dst.len() < data.len() {
                return Err(CueCutError::OutOfMemory(format!(
                    "could not allocate {} sample output frame",
                    samples
                )));
            }
            dst[..data.len()].copy_from_slice(data);
        }
        Ok(Some(frame))
    }
}
