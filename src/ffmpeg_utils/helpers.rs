//! Safe wrappers around FFmpeg FFI calls.
//!
//! Every function in this module is `pub` and **safe** to call.  All `unsafe`
//! blocks are contained here with explicit safety arguments.  Callers outside
//! this module should never need to write `unsafe` for routine FFmpeg access.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::{Sample, Type as SampleType};

// ── Codec-parameter field accessors ─────────────────────────────────────────

/// Read `sample_rate` from an `AVCodecParameters` struct.
///
/// `ffmpeg-next` does not expose this field through a safe accessor.
pub fn codec_params_sample_rate(params: &ffmpeg::codec::parameters::Parameters) -> u32 {
    // SAFETY: `params.as_ptr()` returns a valid non-null pointer for the
    // lifetime of `params`.  `sample_rate` is a plain i32 field with no
    // ownership semantics.
    unsafe { (*params.as_ptr()).sample_rate as u32 }
}

/// Read `ch_layout.nb_channels` from an `AVCodecParameters` struct.
pub fn codec_params_channels(params: &ffmpeg::codec::parameters::Parameters) -> u16 {
    // SAFETY: same as `codec_params_sample_rate`.
    unsafe { (*params.as_ptr()).ch_layout.nb_channels as u16 }
}

/// Zero out `codec_tag` on the `AVCodecParameters` attached to an output
/// stream, so the muxer picks the correct tag for the target container.
///
/// Must be called after `out_stream.set_parameters(...)` and before
/// `write_header`.
pub fn stream_reset_codec_tag(out_stream: &mut ffmpeg::format::stream::StreamMut) {
    // SAFETY: `out_stream.as_mut_ptr()` is valid for the lifetime of the
    // stream.  `codecpar` is set by `set_parameters` and is non-null.
    unsafe {
        (*(*out_stream.as_mut_ptr()).codecpar).codec_tag = 0;
    }
}

/// Allocate a fresh `AVCodecParameters`, copy the opened encoder context into
/// it, and return it as a safe `ffmpeg::codec::Parameters`.
pub fn encoder_codec_parameters(
    encoder: &ffmpeg::codec::encoder::audio::Encoder,
) -> ffmpeg::codec::Parameters {
    use std::rc::Rc;
    let ctx: &ffmpeg::codec::Context = encoder;
    // SAFETY: `avcodec_parameters_alloc` returns a valid pointer (allocation
    // only fails under OOM).  `avcodec_parameters_from_context` copies fields
    // from a live, open encoder context.
    unsafe {
        let params = ffmpeg::ffi::avcodec_parameters_alloc();
        ffmpeg::ffi::avcodec_parameters_from_context(params, ctx.as_ptr());
        ffmpeg::codec::Parameters::wrap(params, None::<Rc<dyn std::any::Any>>)
    }
}

/// Returns `true` if a decoder is registered for `codec_id`.
pub fn decoder_exists(codec_id: ffmpeg::codec::Id) -> bool {
    ffmpeg::codec::decoder::find(codec_id).is_some()
}

// ── Audio frame planes ──────────────────────────────────────────────────────

/// Extract an audio plane slice from an `AVFrame`.
///
/// Works around a bug in `ffmpeg-next`'s `Audio::data(index)` method where it
/// stops counting planes if `linesize[1] == 0`. In FFmpeg, planar audio frames
/// often only populate `linesize[0]` to represent the size of *every* plane.
pub fn audio_plane_data(frame: &ffmpeg::util::frame::Audio, index: usize) -> &[u8] {
    // SAFETY: `extended_data` holds one pointer per plane (one per channel for
    // planar formats, a single one for packed), each valid for `linesize[0]`
    // bytes while the frame is alive.  Indices are bounds-checked first.
    unsafe {
        let f = frame.as_ptr();
        let channels = (*f).ch_layout.nb_channels as usize;

        let is_planar = frame.format().is_planar();
        if is_planar {
            if index >= channels {
                return &[];
            }
        } else if index > 0 {
            return &[];
        }

        let ptrs = (*f).extended_data;
        if ptrs.is_null() {
            return &[];
        }

        let plane_ptr = *ptrs.add(index);
        if plane_ptr.is_null() {
            return &[];
        }

        let size = (*f).linesize[0] as usize;
        std::slice::from_raw_parts(plane_ptr, size)
    }
}

/// Mutable version of `audio_plane_data`.
pub fn audio_plane_data_mut(frame: &mut ffmpeg::util::frame::Audio, index: usize) -> &mut [u8] {
    // SAFETY: see `audio_plane_data`; the frame is borrowed mutably so no
    // other reference to its planes exists.
    unsafe {
        let f = frame.as_mut_ptr();
        let channels = (*f).ch_layout.nb_channels as usize;

        let is_planar = frame.format().is_planar();
        if is_planar {
            if index >= channels {
                return &mut [];
            }
        } else if index > 0 {
            return &mut [];
        }

        let ptrs = (*f).extended_data;
        if ptrs.is_null() {
            return &mut [];
        }

        let plane_ptr = *ptrs.add(index);
        if plane_ptr.is_null() {
            return &mut [];
        }

        let size = (*f).linesize[0] as usize;
        std::slice::from_raw_parts_mut(plane_ptr, size)
    }
}

/// Number of data planes an audio frame of this format/channel count has.
pub fn plane_count(format: Sample, channels: usize) -> usize {
    if format.is_planar() {
        channels
    } else {
        1
    }
}

/// Bytes occupied by one sample instant within a single plane.
pub fn bytes_per_plane_sample(format: Sample, channels: usize) -> usize {
    if format.is_planar() {
        format.bytes()
    } else {
        format.bytes() * channels
    }
}

// ── Channel layouts and sample formats ──────────────────────────────────────

/// Default channel layout for a channel count (mono or stereo).
pub fn layout_for_channels(channels: u16) -> ChannelLayout {
    match channels {
        1 => ChannelLayout::MONO,
        _ => ChannelLayout::STEREO,
    }
}

/// Channel layout of a decoded frame, falling back to a default layout when
/// the source did not specify one.
pub fn frame_channel_layout(frame: &ffmpeg::util::frame::Audio) -> ChannelLayout {
    let layout = frame.channel_layout();
    if layout.bits() == 0 {
        layout_for_channels(frame.channels())
    } else {
        layout
    }
}

/// Parse an FFmpeg sample format name (`s16`, `s16p`, `fltp`, ...).
pub fn parse_sample_format(name: &str) -> Option<Sample> {
    let (base, planar) = match name.strip_suffix('p') {
        Some(base) if !base.is_empty() => (base, true),
        _ => (name, false),
    };
    let kind = if planar {
        SampleType::Planar
    } else {
        SampleType::Packed
    };
    match base {
        "u8" => Some(Sample::U8(kind)),
        "s16" => Some(Sample::I16(kind)),
        "s32" => Some(Sample::I32(kind)),
        "s64" => Some(Sample::I64(kind)),
        "flt" => Some(Sample::F32(kind)),
        "dbl" => Some(Sample::F64(kind)),
        _ => None,
    }
}

/// FFmpeg name of a sample format.
pub fn sample_format_name(format: Sample) -> &'static str {
    format.name()
}
