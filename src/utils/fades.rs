//! Fade curves for head crossfades and de-clicked buffer writes.
//!
//! All curves map a normalized fade progress in range `[0, 1]` to a gain coefficient. Playback
//! and record fades are shaped differently: the buffer's old content is only faded out at the
//! very end of a fade-in (see [`pre_fade_curve`]), while recording only opens up after a delay
//! (see [`rec_fade_curve`]). This avoids clicks and noise buildup on repeated overdubs.

use std::{f32::consts::FRAC_PI_2, sync::LazyLock};

// -------------------------------------------------------------------------------------------------

/// Fraction of the fade progress, nearest to fade start, in which the pre level drops.
pub const PRE_FADE_WINDOW: f32 = 1.0 / 32.0;
/// Fraction of the fade progress which must pass before the rec level starts to open.
pub const REC_FADE_DELAY: f32 = 1.0 / 4.0;

// -------------------------------------------------------------------------------------------------

/// Precomputed cosine fade tables. `N` must be a pow2 value.
struct FadeTables<const N: usize> {
    cos_fade_out: [f32; N],
    raised_cos_fade_in: [f32; N],
}

impl<const N: usize> FadeTables<N> {
    const _VERIFY_N: () = assert!(N.is_power_of_two(), "Fade table size must be a pow2 value");

    fn new() -> Self {
        let mut cos_fade_out = [0.0; N];
        let mut raised_cos_fade_in = [0.0; N];
        let last = (N - 1) as f32;
        #[allow(clippy::needless_range_loop)]
        for i in 0..N {
            let x = i as f32 / last;
            cos_fade_out[i] = (x * FRAC_PI_2).cos();
            raised_cos_fade_in[i] = 0.5 * (1.0 - (x * std::f32::consts::PI).cos());
        }
        // pin endpoints: curves must hit them exactly
        cos_fade_out[0] = 1.0;
        cos_fade_out[N - 1] = 0.0;
        raised_cos_fade_in[0] = 0.0;
        raised_cos_fade_in[N - 1] = 1.0;
        Self {
            cos_fade_out,
            raised_cos_fade_in,
        }
    }

    #[inline]
    fn lookup(table: &[f32; N], x: f32) -> f32 {
        let pos = x.clamp(0.0, 1.0) * (N - 1) as f32;
        let index = (pos as usize).min(N - 2);
        let fraction = pos - index as f32;
        let a = table[index];
        let b = table[index + 1];
        a + (b - a) * fraction
    }
}

static FADE_TABLES: LazyLock<FadeTables<1024>> = LazyLock::new(FadeTables::new);

// -------------------------------------------------------------------------------------------------

/// Table based quarter-cosine fade out: 1 at `x = 0`, 0 at `x = 1`.
#[inline]
pub fn fast_cos_fade_out(x: f32) -> f32 {
    let tables = &*FADE_TABLES;
    FadeTables::lookup(&tables.cos_fade_out, x)
}

/// Table based raised-cosine fade in: 0 at `x = 0`, 1 at `x = 1`.
#[inline]
pub fn raised_cos_fade_in(x: f32) -> f32 {
    let tables = &*FADE_TABLES;
    FadeTables::lookup(&tables.raised_cos_fade_in, x)
}

// -------------------------------------------------------------------------------------------------

/// Shapes how much of the pre level gets replaced by unity gain at the given fade level.
///
/// Returns 1 at fade level 0 (old buffer content is kept untouched) and falls to 0 within
/// [`PRE_FADE_WINDOW`]. Everywhere above the window the natural pre level applies.
#[inline]
pub fn pre_fade_curve(fade: f32) -> f32 {
    if fade > PRE_FADE_WINDOW {
        0.0
    } else {
        fast_cos_fade_out(fade / PRE_FADE_WINDOW)
    }
}

/// Shapes the rec level at the given fade level: closed until [`REC_FADE_DELAY`], then opens
/// with a raised cosine over the remaining fade.
#[inline]
pub fn rec_fade_curve(fade: f32) -> f32 {
    if fade <= REC_FADE_DELAY {
        0.0
    } else {
        raised_cos_fade_in((fade - REC_FADE_DELAY) / (1.0 - REC_FADE_DELAY))
    }
}

/// Equal power gain for a head's output at the given fade level.
#[inline]
pub fn head_mix_gain(fade: f32) -> f32 {
    (fade * FRAC_PI_2).sin()
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_endpoints() {
        assert_eq!(fast_cos_fade_out(0.0), 1.0);
        assert_eq!(fast_cos_fade_out(1.0), 0.0);
        assert_eq!(raised_cos_fade_in(0.0), 0.0);
        assert!((raised_cos_fade_in(1.0) - 1.0).abs() < 1e-6);
        assert!((raised_cos_fade_in(0.5) - 0.5).abs() < 1e-3);
        assert!((fast_cos_fade_out(0.5) - (FRAC_PI_2 * 0.5).cos()).abs() < 1e-3);
    }

    #[test]
    fn curves_are_monotonic() {
        let mut last_out = f32::MAX;
        let mut last_in = f32::MIN;
        for i in 0..=1000 {
            let x = i as f32 / 1000.0;
            let out = fast_cos_fade_out(x);
            let fade_in = raised_cos_fade_in(x);
            assert!(out <= last_out + 1e-7);
            assert!(fade_in >= last_in - 1e-7);
            last_out = out;
            last_in = fade_in;
        }
    }

    #[test]
    fn pre_fade_curve_window() {
        assert_eq!(pre_fade_curve(0.0), 1.0);
        assert_eq!(pre_fade_curve(PRE_FADE_WINDOW), 0.0);
        assert_eq!(pre_fade_curve(PRE_FADE_WINDOW + 1e-4), 0.0);
        assert_eq!(pre_fade_curve(0.5), 0.0);
        assert_eq!(pre_fade_curve(1.0), 0.0);
        let inside = pre_fade_curve(PRE_FADE_WINDOW * 0.5);
        assert!(inside > 0.0 && inside < 1.0);
        // continuous at the window boundary
        assert!(pre_fade_curve(PRE_FADE_WINDOW - 1e-6) < 1e-3);
    }

    #[test]
    fn rec_fade_curve_delay() {
        assert_eq!(rec_fade_curve(0.0), 0.0);
        assert_eq!(rec_fade_curve(0.1), 0.0);
        assert_eq!(rec_fade_curve(REC_FADE_DELAY), 0.0);
        assert!((rec_fade_curve(1.0) - 1.0).abs() < 1e-6);
        let inside = rec_fade_curve(0.6);
        assert!(inside > 0.0 && inside < 1.0);
        // continuous at the delay boundary
        assert!(rec_fade_curve(REC_FADE_DELAY + 1e-6) < 1e-3);
    }

    #[test]
    fn head_mix() {
        assert_eq!(head_mix_gain(0.0), 0.0);
        assert!((head_mix_gain(1.0) - 1.0).abs() < 1e-6);
        // equal power crossfade
        let a = head_mix_gain(0.3);
        let b = head_mix_gain(0.7);
        assert!((a * a + b * b - 1.0).abs() < 1e-5);
    }
}
