use std::fmt::{Debug, Display};

// -------------------------------------------------------------------------------------------------

/// Provides smooth transitions between a current and target f32 value.
/// Smoothing usually needs to be applied to avoid clicks in e.g. level or rate changes.
pub trait SmoothedValue: Debug {
    /// Access to the current, possibly ramped value.
    #[must_use]
    fn current(&self) -> f32;
    /// Access to the target value.
    #[must_use]
    fn target(&self) -> f32;

    /// Ramp, if needed, and get the current ramped value, else returns the target value.
    #[must_use]
    fn next(&mut self) -> f32 {
        if self.need_ramp() {
            self.ramp();
            self.current()
        } else {
            self.target()
        }
    }

    /// Test if ramping is necessary. When ramping is not necessary, parameter changes
    /// may be applied in blocks without calling `next` or `ramp`, which usually is faster.
    #[must_use]
    fn need_ramp(&self) -> bool;
    /// Move current to target value, when ramping is necessary, else does nothing.
    fn ramp(&mut self);

    /// Set current and target to the same value.
    fn init(&mut self, amount: f32);
    /// Set a new target value and ramp current, when current is different from the target.
    fn set_target(&mut self, target: f32);

    /// Update sample rate of the smoothed value. Smoothed values are expected to be called
    /// once per audio frame and the ramping scales with the sample rate.
    fn set_sample_rate(&mut self, sample_rate: u32);
}

impl Display for dyn SmoothedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.need_ramp() {
            f.write_fmt(format_args!("{}(->{})", self.current(), self.target()))
        } else {
            f.write_fmt(format_args!("{}", self.target()))
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Exponential smoothed value (a one pole slew) for smooth ramping towards a target.
///
/// Slewing is configured via a slew time in seconds: the time it takes to reach 99.9% of the
/// target value. A slew time of zero disables smoothing.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothedValue {
    current: f32,
    target: f32,
    slew_time: f32,
    inertia: f32,
    sample_rate: u32,
}

impl ExponentialSmoothedValue {
    pub const DEFAULT_SLEW_TIME: f32 = 0.0;

    const UNINITIALIZED_SAMPLE_RATE: u32 = 66666;

    pub fn new(value: f32, sample_rate: u32) -> Self {
        Self::with_slew_time(value, Self::DEFAULT_SLEW_TIME, sample_rate)
    }

    pub fn with_slew_time(value: f32, slew_time: f32, sample_rate: u32) -> Self {
        assert!(slew_time >= 0.0, "Invalid slew time");
        assert!(sample_rate > 0, "Invalid sample rate");

        let current = value;
        let target = value;
        let inertia = Self::calc_inertia(slew_time, sample_rate);

        ExponentialSmoothedValue {
            current,
            target,
            slew_time,
            inertia,
            sample_rate,
        }
    }

    #[inline(always)]
    pub fn slew_time(&self) -> f32 {
        self.slew_time
    }

    pub fn set_slew_time(&mut self, slew_time: f32) {
        self.slew_time = slew_time.max(0.0);
        self.inertia = Self::calc_inertia(self.slew_time, self.sample_rate);
    }

    pub fn reset(&mut self) {
        self.init(self.target);
    }

    fn calc_inertia(slew_time: f32, sample_rate: u32) -> f32 {
        // reach 99.9% of the target (-60dB) after slew_time
        const LN1000: f32 = 6.9078;
        let slew_frames = slew_time * sample_rate as f32;
        if slew_frames <= 1.0 {
            1.0
        } else {
            1.0 - (-LN1000 / slew_frames).exp()
        }
    }
}

impl SmoothedValue for ExponentialSmoothedValue {
    #[inline(always)]
    fn current(&self) -> f32 {
        self.current
    }

    #[inline(always)]
    fn target(&self) -> f32 {
        self.target
    }

    fn need_ramp(&self) -> bool {
        debug_assert!(
            self.sample_rate != Self::UNINITIALIZED_SAMPLE_RATE,
            "Call 'set_sample_rate' for default constructed smoothed values before using them!"
        );
        const EPSILON: f32 = f32::EPSILON * 100.0;
        (self.target - self.current).abs() > EPSILON
    }

    fn ramp(&mut self) {
        self.current += (self.target - self.current) * self.inertia;
        if !self.need_ramp() {
            self.current = self.target;
        }
    }

    fn init(&mut self, amount: f32) {
        self.target = amount;
        self.current = amount;
    }

    fn set_target(&mut self, target: f32) {
        self.target = target;
        if !self.need_ramp() {
            self.current = self.target;
        }
    }

    fn set_sample_rate(&mut self, sample_rate: u32) {
        assert!(sample_rate > 0, "Invalid sample rate");
        self.sample_rate = sample_rate;
        self.inertia = Self::calc_inertia(self.slew_time, sample_rate);
    }
}

impl Default for ExponentialSmoothedValue {
    fn default() -> Self {
        Self::new(0.0, Self::UNINITIALIZED_SAMPLE_RATE)
    }
}

impl From<f32> for ExponentialSmoothedValue {
    fn from(value: f32) -> Self {
        Self::new(value, Self::UNINITIALIZED_SAMPLE_RATE)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_smoothed_value() {
        // Test new
        let val = ExponentialSmoothedValue::new(0.0, 44100);
        assert_eq!(val.current(), 0.0);
        assert_eq!(val.target(), 0.0);
        assert_eq!(val.slew_time(), ExponentialSmoothedValue::DEFAULT_SLEW_TIME);

        // Test zero slew time jumps to target
        let mut val = ExponentialSmoothedValue::new(0.0, 44100);
        val.set_target(1.0);
        assert_eq!(val.next(), 1.0);
        assert!(!val.need_ramp());

        // Test init
        let mut val = ExponentialSmoothedValue::with_slew_time(0.0, 0.1, 44100);
        val.init(1.0);
        assert_eq!(val.current(), 1.0);
        assert_eq!(val.target(), 1.0);
        assert!(!val.need_ramp());

        // Test set_target with ramp
        let mut val = ExponentialSmoothedValue::with_slew_time(0.0, 0.1, 44100);
        val.set_target(1.0);
        assert!(val.need_ramp());
        let first = val.next();
        assert!(first > 0.0 && first < 1.0);
        for _ in 0..100 {
            let _ = val.next();
        }
        assert!(val.current() > first);
        assert!(val.current() < 1.0);
    }

    #[test]
    fn test_smoothed_value_display() {
        let mut val = ExponentialSmoothedValue::with_slew_time(0.0, 0.1, 1000);
        assert_eq!(format!("{}", &val as &dyn SmoothedValue), "0");
        val.set_target(1.0);
        assert_eq!(format!("{}", &val as &dyn SmoothedValue), "0(->1)");
    }

    #[test]
    fn test_exp_smoothed_value_reaches_target() {
        let sample_rate = 1000;
        let mut val = ExponentialSmoothedValue::with_slew_time(0.0, 0.1, sample_rate);
        val.set_target(1.0);
        // 99.9% after slew time
        for _ in 0..100 {
            let _ = val.next();
        }
        assert!((val.current() - 1.0).abs() < 0.0011);
        // and eventually exactly reaches it
        for _ in 0..10000 {
            let _ = val.next();
        }
        assert_eq!(val.current(), 1.0);
        assert!(!val.need_ramp());
    }

    #[test]
    fn test_exp_smoothed_value_slew_changes() {
        let mut slow = ExponentialSmoothedValue::with_slew_time(0.0, 1.0, 44100);
        let mut fast = ExponentialSmoothedValue::with_slew_time(0.0, 0.01, 44100);
        slow.set_target(1.0);
        fast.set_target(1.0);
        assert!(fast.next() > slow.next());

        slow.set_slew_time(0.0);
        assert_eq!(slow.next(), 1.0);
    }
}
