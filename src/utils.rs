//! Common DSP helpers used by the read/write heads and voices.

pub mod buffer;
pub mod fades;
pub mod interpolate;
pub mod resampler;
pub mod smoothed;

// -------------------------------------------------------------------------------------------------

/// Convert a time in seconds into fractional sample frames at the given sample rate.
#[inline]
pub fn seconds_to_frames(seconds: f64, sample_rate: u32) -> f64 {
    seconds * sample_rate as f64
}

/// Convert fractional sample frames into a time in seconds at the given sample rate.
#[inline]
pub fn frames_to_seconds(frames: f64, sample_rate: u32) -> f64 {
    debug_assert!(sample_rate > 0, "Invalid sample rate");
    frames / sample_rate as f64
}

// -------------------------------------------------------------------------------------------------
