//! Cue-driven synchronization loop
//!
//! For each cue: seek the audio backward to the cue window, decode forward,
//! drop frames ending before the window, carve the overlapping samples out of
//! frames that intersect it, and stop at the first frame starting after it.
//! Carved samples are resampled, regrouped into encoder-sized frames when the
//! codec needs that, stamped with a running output timestamp and encoded.
//!
//! ```text
//! cue -> plan window -> seek -> read/decode -> classify
//!     Before      -> discard
//!     Overlapping -> extract -> resample -> enqueue -> dequeue -> encode -> write
//!     After / EOF -> flush decoder, next cue
//! no more cues -> decoder tail -> resampler tail -> queue tail -> encoder tail -> trailer
//! ```

use ffmpeg_next as ffmpeg;

use super::fifo::SampleFifo;
use super::region::extract_region;
use super::{
    DecodeStatus, EncodeStatus, FrameDecoder, FrameEncoder, FrameResampler, PacketReader,
    PacketWriter,
};
use crate::error::Result;
use crate::subtitle::cues::{CueSource, CueWindowPlanner};
use crate::timeline::{rescale, ticks_to_ms, RangePosition, TimeRange};

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub cues_read: u64,
    /// Cues whose window was already fully covered by earlier cues
    pub cues_skipped: u64,
    pub frames_decoded: u64,
    /// Decoded frames entirely outside their cue window
    pub frames_discarded: u64,
    /// Samples carved out of decoded frames, at the source rate
    pub samples_extracted: u64,
    /// Samples handed to the encoder, at the target rate
    pub samples_encoded: u64,
    pub packets_written: u64,
}

/// Whether decoding for the current cue should go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CueProgress {
    InWindow,
    PastWindow,
}

/// Owns every stage of the extraction for one run.
///
/// Fields are declared in reverse acquisition order so that dropping the
/// pipeline, on success or on any early error return, releases the queue
/// first and the input last.
pub struct CueSyncPipeline<C, R, D, S, E, W>
where
    C: CueSource,
    R: PacketReader,
    D: FrameDecoder,
    S: FrameResampler,
    E: FrameEncoder,
    W: PacketWriter,
{
    fifo: Option<SampleFifo>,
    cues: C,
    resampler: S,
    writer: W,
    encoder: E,
    decoder: D,
    reader: R,
    planner: CueWindowPlanner,
    /// Samples submitted to the encoder so far; source of output timestamps
    samples_encoded: i64,
    /// End of the last decoded frame, in decoder ticks, for unstamped frames
    last_frame_end: Option<i64>,
    stats: PipelineStats,
}

impl<C, R, D, S, E, W> CueSyncPipeline<C, R, D, S, E, W>
where
    C: CueSource,
    R: PacketReader,
    D: FrameDecoder,
    S: FrameResampler,
    E: FrameEncoder,
    W: PacketWriter,
{
    /// Assemble a pipeline from already-opened stages.
    ///
    /// A sample queue is created only when the encoder needs fixed-size frames.
    pub fn new(
        reader: R,
        decoder: D,
        encoder: E,
        writer: W,
        resampler: S,
        cues: C,
        planner: CueWindowPlanner,
    ) -> Self {
        let fifo = encoder
            .fixed_frame_size()
            .map(|size| SampleFifo::new(encoder.input_format(), size));
        Self {
            fifo,
            cues,
            resampler,
            writer,
            encoder,
            decoder,
            reader,
            planner,
            samples_encoded: 0,
            last_frame_end: None,
            stats: PipelineStats::default(),
        }
    }

    /// Run every cue through the pipeline, flush all stages and finalize the
    /// output. The first error aborts the run.
    pub fn run(mut self) -> Result<PipelineStats> {
        while let Some(cue) = self.cues.next_cue()? {
            self.stats.cues_read += 1;
            let Some(window) = self.planner.plan(cue) else {
                tracing::debug!(
                    cue_start_ms = cue.start(),
                    cue_end_ms = cue.end(),
                    "cue already covered, skipping"
                );
                self.stats.cues_skipped += 1;
                continue;
            };
            self.process_cue(window)?;
        }

        self.finish()?;

        tracing::info!(
            cues = self.stats.cues_read,
            skipped = self.stats.cues_skipped,
            frames_decoded = self.stats.frames_decoded,
            frames_discarded = self.stats.frames_discarded,
            samples_encoded = self.stats.samples_encoded,
            packets = self.stats.packets_written,
            "extraction complete"
        );
        Ok(self.stats)
    }

    fn process_cue(&mut self, window: TimeRange) -> Result<()> {
        tracing::debug!(
            cue_start_ms = window.start(),
            cue_end_ms = window.end(),
            "processing cue"
        );

        self.reader.seek_backward(window.start())?;
        self.last_frame_end = None;

        loop {
            match self.reader.read_packet()? {
                Some(packet) => {
                    self.decoder.submit(Some(&packet))?;
                    if self.drain_decoder(&window)? == CueProgress::PastWindow {
                        break;
                    }
                }
                None => {
                    tracing::debug!(
                        cue_start_ms = window.start(),
                        "audio ended inside cue window"
                    );
                    self.decoder.submit(None)?;
                    self.drain_decoder(&window)?;
                    break;
                }
            }
        }

        // Buffered frames belong past this window; drop them and clear any
        // end-of-stream state before the next seek.
        self.decoder.flush();
        Ok(())
    }

    /// Pull every frame the decoder has ready and route it by its position
    /// relative to `window`.
    fn drain_decoder(&mut self, window: &TimeRange) -> Result<CueProgress> {
        loop {
            let frame = match self.decoder.receive()? {
                DecodeStatus::Frame(frame) => frame,
                DecodeStatus::NeedsMoreInput | DecodeStatus::EndOfStream => {
                    return Ok(CueProgress::InWindow)
                }
            };
            self.stats.frames_decoded += 1;

            let range = self.frame_range(&frame);
            match range.position_against(window) {
                RangePosition::Before => {
                    self.stats.frames_discarded += 1;
                    tracing::trace!(
                        frame_start_ms = range.start(),
                        frame_end_ms = range.end(),
                        "frame before cue window"
                    );
                }
                RangePosition::After => {
                    self.stats.frames_discarded += 1;
                    tracing::trace!(
                        frame_start_ms = range.start(),
                        cue_end_ms = window.end(),
                        "frame past cue window"
                    );
                    return Ok(CueProgress::PastWindow);
                }
                RangePosition::Overlapping => {
                    let region = range.intersect(window);
                    self.take_region(&frame, range, region)?;
                }
            }
        }
    }

    /// Millisecond range covered by a decoded frame.
    ///
    /// Frames without a timestamp continue from the end of the previous one.
    fn frame_range(&mut self, frame: &ffmpeg::util::frame::Audio) -> TimeRange {
        let time_base = self.decoder.time_base();
        let start_ticks = frame
            .pts()
            .or_else(|| frame.timestamp())
            .or(self.last_frame_end)
            .unwrap_or(0);
        let rate = frame.rate().max(1) as i32;
        let duration_ticks = rescale(
            frame.samples() as i64,
            ffmpeg::Rational::new(1, rate),
            time_base,
        );
        let end_ticks = start_ticks.saturating_add(duration_ticks);
        self.last_frame_end = Some(end_ticks);

        let start = ticks_to_ms(time_base, start_ticks);
        let end = ticks_to_ms(time_base, end_ticks).max(start + 1);
        TimeRange::new(start, end).unwrap_or_else(|| TimeRange::open_ended(start))
    }

    fn take_region(
        &mut self,
        frame: &ffmpeg::util::frame::Audio,
        range: TimeRange,
        region: TimeRange,
    ) -> Result<()> {
        let Some(extracted) = extract_region(frame, range, region)? else {
            return Ok(());
        };
        self.stats.samples_extracted += extracted.samples() as u64;

        if let Some(converted) = self.resampler.convert(&extracted)? {
            self.push(converted)?;
        }
        Ok(())
    }

    /// Hand resampled audio to the queue, or straight to the encoder when the
    /// codec takes frames of any size.
    fn push(&mut self, frame: ffmpeg::util::frame::Audio) -> Result<()> {
        match self.fifo.as_mut() {
            Some(fifo) => {
                fifo.enqueue_frame(&frame)?;
                self.drain_fifo(false)
            }
            None => self.encode_frame(frame),
        }
    }

    /// Encode every frame the queue can release. With `end_of_stream` the
    /// remainder goes out as one short frame.
    fn drain_fifo(&mut self, end_of_stream: bool) -> Result<()> {
        loop {
            let next = match self.fifo.as_mut() {
                Some(fifo) => fifo.try_dequeue(end_of_stream)?,
                None => None,
            };
            let Some(frame) = next else {
                return Ok(());
            };
            self.encode_frame(frame)?;
        }
    }

    /// Stamp a frame with the running output timestamp and encode it.
    ///
    /// The timestamp is derived from the cumulative sample count on every
    /// call rather than accumulated per frame, so it cannot drift.
    fn encode_frame(&mut self, mut frame: ffmpeg::util::frame::Audio) -> Result<()> {
        let sample_rate = self.encoder.input_format().rate.max(1) as i32;
        let pts = rescale(
            self.samples_encoded,
            ffmpeg::Rational::new(1, sample_rate),
            self.encoder.time_base(),
        );
        frame.set_pts(Some(pts));

        let samples = frame.samples();
        self.encoder.submit(Some(&frame))?;
        self.samples_encoded += samples as i64;
        self.stats.samples_encoded += samples as u64;
        tracing::trace!(pts, samples, "encoded frame");

        self.drain_encoder()
    }

    /// Write every packet the encoder has ready.
    fn drain_encoder(&mut self) -> Result<()> {
        loop {
            match self.encoder.receive()? {
                EncodeStatus::Packet(packet) => {
                    self.writer.write_packet(packet)?;
                    self.stats.packets_written += 1;
                }
                EncodeStatus::NeedsMoreInput | EncodeStatus::EndOfStream => return Ok(()),
            }
        }
    }

    /// Flush path: decoder, resampler, queue and encoder tails, then the
    /// container trailer.
    fn finish(&mut self) -> Result<()> {
        let tail = TimeRange::open_ended(self.planner.previous_end().unwrap_or(0));
        self.decoder.submit(None)?;
        self.drain_decoder(&tail)?;

        if let Some(frame) = self.resampler.flush()? {
            self.push(frame)?;
        }
        self.drain_fifo(true)?;

        self.encoder.submit(None)?;
        self.drain_encoder()?;

        self.writer.finish()?;
        tracing::debug!(
            samples_encoded = self.samples_encoded,
            "output finalized"
        );
        Ok(())
    }
}
