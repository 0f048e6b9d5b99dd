//! Timebase conversion
//!
//! Exact rational rescaling with a single rounding rule: round to nearest,
//! ties away from zero (the same rule as `av_rescale_q`). Using one rule in
//! both directions keeps repeated tick/ms conversions from drifting.

use ffmpeg_next as ffmpeg;

const MILLISECONDS: ffmpeg::Rational = ffmpeg::Rational(1, 1000);

/// Rescale `value` from timebase `from` to timebase `to`.
///
/// Both timebases must have non-zero numerator and denominator. Results that
/// do not fit in an `i64` saturate.
pub fn rescale(value: i64, from: ffmpeg::Rational, to: ffmpeg::Rational) -> i64 {
    debug_assert!(
        from.denominator() != 0 && to.numerator() != 0 && to.denominator() != 0,
        "invalid timebase {:?} -> {:?}",
        from,
        to
    );
    let num = value as i128 * from.numerator() as i128 * to.denominator() as i128;
    let den = from.denominator() as i128 * to.numerator() as i128;
    if den == 0 {
        return 0;
    }
    let q = div_round_half_away(num, den);
    q.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Convert `ticks` in `timebase` to milliseconds.
pub fn ticks_to_ms(timebase: ffmpeg::Rational, ticks: i64) -> i64 {
    rescale(ticks, timebase, MILLISECONDS)
}

/// Convert milliseconds to ticks in `timebase`.
pub fn ms_to_ticks(timebase: ffmpeg::Rational, ms: i64) -> i64 {
    rescale(ms, MILLISECONDS, timebase)
}

/// True if the timebase can be used for conversion at all.
pub fn is_valid_timebase(timebase: ffmpeg::Rational) -> bool {
    timebase.numerator() > 0 && timebase.denominator() > 0
}

fn div_round_half_away(num: i128, den: i128) -> i128 {
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    let half = den / 2;
    if num >= 0 {
        (num + half) / den
    } else {
        -((-num + half) / den)
    }
}
