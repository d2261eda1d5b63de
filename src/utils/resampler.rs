//! Rate dependent resampling of a constant rate input stream into record subframes.

use crate::utils::interpolate::hermite;

// -------------------------------------------------------------------------------------------------

/// Converts a stream of input frames into a variable number of output subframes per input frame,
/// by accumulating a fractional phase at the given rate.
///
/// With a rate of 1 every input frame produces exactly one subframe, with rates above 1 an input
/// frame may produce multiple subframes (upsampling), with rates below 1 some input frames
/// produce none (downsampling). Subframes are interpolated with 4-point Hermite interpolation,
/// which delays the output by one frame.
#[derive(Debug, Clone)]
pub struct Resampler {
    input: [f32; 4],
    phase: f64,
    rate: f64,
    output: [f32; Self::MAX_SUBFRAMES],
    output_len: usize,
}

impl Resampler {
    /// Maximum absolute rate. Higher rates are clamped.
    pub const MAX_RATE: f64 = 16.0;
    /// Maximum number of subframes a single input frame can produce.
    pub const MAX_SUBFRAMES: usize = Self::MAX_RATE as usize;

    /// Create a new resampler with rate 1 and cleared history.
    pub const fn new() -> Self {
        Self {
            input: [0.0; 4],
            phase: 0.0,
            rate: 1.0,
            output: [0.0; Self::MAX_SUBFRAMES],
            output_len: 0,
        }
    }

    /// The current, absolute resampling rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Set a new resampling rate. Negative rates are not supported here: pass absolute rates
    /// and handle direction in the caller.
    #[inline]
    pub fn set_rate(&mut self, rate: f64) {
        debug_assert!(rate >= 0.0, "Expecting an absolute rate");
        self.rate = rate.clamp(0.0, Self::MAX_RATE);
    }

    /// Current fractional phase in range `[0, 1)`.
    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Set the fractional phase. Usually only used to reset the phase to 0.
    pub fn set_phase(&mut self, phase: f64) {
        debug_assert!((0.0..1.0).contains(&phase), "Invalid resampler phase");
        self.phase = phase;
    }

    /// Clear input history and the last produced subframes.
    pub fn clear_buffers(&mut self) {
        self.input.fill(0.0);
        self.output.fill(0.0);
        self.output_len = 0;
    }

    /// Push a new input frame and produce subframes for it.
    /// Returns the number of subframes which are now available via [`Self::output`].
    pub fn process_frame(&mut self, value: f32) -> usize {
        self.push_sample(value);

        if self.rate <= 0.0 {
            self.output_len = 0;
            return 0;
        }

        let previous_phase = self.phase;
        let next_phase = previous_phase + self.rate;
        let count = (next_phase as usize).min(Self::MAX_SUBFRAMES);
        for index in 0..count {
            // where the phase crossed the subframe boundary within the current input frame
            let crossing = (index + 1) as f64 - previous_phase;
            let fraction = (crossing / self.rate).clamp(0.0, 1.0) as f32;
            self.output[index] = self.interpolate(fraction);
        }
        self.phase = next_phase - count as f64;
        self.output_len = count;
        count
    }

    /// The subframes produced by the last [`Self::process_frame`] call.
    #[inline]
    pub fn output(&self) -> &[f32] {
        &self.output[..self.output_len]
    }

    #[inline]
    fn push_sample(&mut self, value: f32) {
        self.input[3] = self.input[2];
        self.input[2] = self.input[1];
        self.input[1] = self.input[0];
        self.input[0] = value;
    }

    #[inline]
    fn interpolate(&self, fraction: f32) -> f32 {
        hermite(
            fraction,
            self.input[3],
            self.input[2],
            self.input[1],
            self.input[0],
        )
    }
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new()
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_rate_delays_by_one_frame() {
        let mut resampler = Resampler::new();
        resampler.set_rate(1.0);
        let mut produced = Vec::new();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            assert_eq!(resampler.process_frame(value), 1);
            produced.push(resampler.output()[0]);
        }
        assert_eq!(produced, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn subframe_counts_follow_rate() {
        for (rate, frames, expected) in [(2.0, 10, 20), (0.5, 10, 5), (0.25, 16, 4), (3.0, 7, 21)] {
            let mut resampler = Resampler::new();
            resampler.set_rate(rate);
            let total: usize = (0..frames).map(|_| resampler.process_frame(0.0)).sum();
            assert_eq!(total, expected, "rate {rate}");
        }
    }

    #[test]
    fn zero_rate_produces_nothing() {
        let mut resampler = Resampler::new();
        resampler.set_rate(0.0);
        for _ in 0..100 {
            assert_eq!(resampler.process_frame(1.0), 0);
            assert!(resampler.output().is_empty());
        }
    }

    #[test]
    fn rate_is_clamped() {
        let mut resampler = Resampler::new();
        resampler.set_rate(1000.0);
        assert_eq!(resampler.rate(), Resampler::MAX_RATE);
        assert_eq!(resampler.process_frame(1.0), Resampler::MAX_SUBFRAMES);
    }

    #[test]
    fn reset_makes_counts_deterministic() {
        let mut resampler = Resampler::new();
        resampler.set_rate(0.7);
        let first: Vec<usize> = (0..32).map(|_| resampler.process_frame(0.5)).collect();
        resampler.set_phase(0.0);
        resampler.clear_buffers();
        let second: Vec<usize> = (0..32).map(|_| resampler.process_frame(0.5)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn upsampling_a_constant_signal() {
        let mut resampler = Resampler::new();
        resampler.set_rate(4.0);
        for _ in 0..4 {
            resampler.process_frame(0.25);
        }
        assert_eq!(resampler.process_frame(0.25), 4);
        for value in resampler.output() {
            assert!((value - 0.25).abs() < 1e-6);
        }
    }
}
