//! Dual-head loop reading and writing with click-free crossfades.

mod sub_head;

pub use sub_head::{HeadAction, HeadState, SubHead};

use crate::{
    utils::{fades::head_mix_gain, resampler::Resampler},
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Fractional frame bounds of a loop. Direction of traversal follows the sign of the rate.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LoopRegion {
    pub start: f64,
    pub end: f64,
}

impl LoopRegion {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the loop in frames. Zero or negative for empty or inverted regions.
    #[inline]
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    /// True when the region does not span any frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }

    /// Wrap a phase into the region. Phases within `[start, end]`, including both bounds, are
    /// returned unchanged. Empty regions clamp to the start.
    pub fn wrap_phase(&self, phase: f64) -> f64 {
        if self.is_empty() {
            return self.start;
        }
        let len = self.len();
        if phase > self.end {
            self.start + (phase - self.start).rem_euclid(len)
        } else if phase < self.start {
            self.end - (self.end - phase).rem_euclid(len)
        } else {
            phase
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Reads and writes a voice's buffer with two alternating [`SubHead`]s.
///
/// Whenever the playback position must jump (loop wraparound, explicit cuts, start and stop), the
/// inactive head fades in at the new position while the active one fades out. The orchestrator
/// exclusively owns both heads and mediates all interaction between them.
///
/// All positions are fractional sample frames. The buffer is never owned: it's passed into all
/// processing functions and is mutated in place.
#[derive(Debug, Clone)]
pub struct ReadWriteHead {
    heads: [SubHead; 2],
    active: usize,
    region: LoopRegion,
    loop_flag: bool,
    rate: f64,
    fade_time: f32,
    fade_increment: f32,
    sample_rate: u32,
    pre: f32,
    rec: f32,
    rec_offset: isize,
    queued_crossfade: Option<f64>,
}

impl ReadWriteHead {
    pub const DEFAULT_FADE_TIME: f32 = 0.1;
    /// Compensates the one frame latency of the resampler, and that record writes are placed
    /// ahead of the write index, so overdubs land at the phase that is heard while recording.
    pub const DEFAULT_REC_OFFSET: isize = -2;

    /// Create a new head for the given sample rate. Both sub heads are stopped.
    pub fn new(sample_rate: u32) -> Self {
        assert!(sample_rate > 0, "Invalid sample rate");
        let mut head = Self {
            heads: [SubHead::new(), SubHead::new()],
            active: 0,
            region: LoopRegion::default(),
            loop_flag: true,
            rate: 1.0,
            fade_time: Self::DEFAULT_FADE_TIME,
            fade_increment: 0.0,
            sample_rate,
            pre: 0.0,
            rec: 0.0,
            rec_offset: Self::DEFAULT_REC_OFFSET,
            queued_crossfade: None,
        };
        head.calc_fade_increment();
        head
    }

    /// Reinitialize the head: stops both sub heads and resets loop, rate and fade settings.
    /// Sample rate, levels and rec offset are kept.
    pub fn reset(&mut self) {
        self.heads[0].reset();
        self.heads[1].reset();
        self.active = 0;
        self.region = LoopRegion::default();
        self.rate = 1.0;
        self.fade_time = Self::DEFAULT_FADE_TIME;
        self.queued_crossfade = None;
        self.calc_fade_increment();
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        assert!(sample_rate > 0, "Invalid sample rate");
        self.sample_rate = sample_rate;
        self.calc_fade_increment();
    }

    /// Current signed playback rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Set a new signed playback rate. Rates are clamped to `±Resampler::MAX_RATE`, the fastest
    /// rate writes can follow.
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate.clamp(-Resampler::MAX_RATE, Resampler::MAX_RATE);
        self.calc_fade_increment();
    }

    /// Crossfade time in seconds.
    pub fn fade_time(&self) -> f32 {
        self.fade_time
    }

    pub fn set_fade_time(&mut self, seconds: f32) {
        self.fade_time = seconds;
        self.calc_fade_increment();
    }

    /// Per frame fade level change, derived from rate, fade time and sample rate.
    pub fn fade_increment(&self) -> f32 {
        self.fade_increment
    }

    pub fn loop_region(&self) -> LoopRegion {
        self.region
    }

    pub fn set_loop_start(&mut self, frames: f64) {
        self.region.start = frames;
    }

    pub fn set_loop_end(&mut self, frames: f64) {
        self.region.end = frames;
    }

    pub fn loop_flag(&self) -> bool {
        self.loop_flag
    }

    pub fn set_loop_flag(&mut self, enabled: bool) {
        self.loop_flag = enabled;
    }

    /// Level of the existing buffer content which is kept while recording.
    pub fn pre_level(&self) -> f32 {
        self.pre
    }

    pub fn set_pre_level(&mut self, level: f32) {
        self.pre = level;
    }

    /// Level of the input which is recorded into the buffer.
    pub fn rec_level(&self) -> f32 {
        self.rec
    }

    pub fn set_rec_level(&mut self, level: f32) {
        self.rec = level;
    }

    /// Record offset in frames, applied to the write index when a head gets positioned.
    pub fn rec_offset(&self) -> isize {
        self.rec_offset
    }

    pub fn set_rec_offset(&mut self, frames: isize) {
        self.rec_offset = frames;
    }

    /// Index of the active sub head: 0 or 1.
    pub fn active_head_index(&self) -> usize {
        self.active
    }

    /// Access to a sub head's state for inspection.
    pub fn head(&self, index: usize) -> &SubHead {
        &self.heads[index]
    }

    /// Phase of the active head in frames.
    pub fn active_phase(&self) -> f64 {
        self.heads[self.active].phase()
    }

    /// Pending crossfade target, if any.
    pub fn queued_crossfade(&self) -> Option<f64> {
        self.queued_crossfade
    }

    /// True when any of the sub heads is moving.
    pub fn is_playing(&self) -> bool {
        self.heads
            .iter()
            .any(|head| head.state() != HeadState::Stopped)
    }

    /// True when a moving sub head modifies the buffer when writing.
    pub fn is_recording(&self) -> bool {
        self.is_playing() && (self.rec != 0.0 || self.pre != 1.0)
    }

    /// Request a jump to the given phase. The jump is executed as crossfade as soon as no other
    /// crossfade is in progress. A later request replaces a still pending one.
    pub fn cut_to_phase(&mut self, phase: f64) {
        self.queued_crossfade = Some(phase);
    }

    /// Process a single frame: read and mix both heads, write the input, then move the heads.
    /// Returns the mixed output frame.
    pub fn process_frame(&mut self, buffer: &mut [f32], input: f32) -> Result<f32, Error> {
        self.check_heads()?;
        let output = self.read(buffer);
        self.write(buffer, input);
        self.advance()?;
        Ok(output)
    }

    /// Process a single frame without writing into the buffer. Write positions keep moving
    /// with the heads, so recording can be punched in at any time.
    pub fn process_frame_no_write(&mut self, buffer: &[f32]) -> Result<f32, Error> {
        self.check_heads()?;
        let output = self.read(buffer);
        self.skip_write();
        self.advance()?;
        Ok(output)
    }

    /// Process a single frame without reading from the buffer.
    pub fn process_frame_no_read(&mut self, buffer: &mut [f32], input: f32) -> Result<(), Error> {
        self.check_heads()?;
        self.write(buffer, input);
        self.advance()
    }

    /// Move both heads by a single frame without reading or writing.
    pub fn process_frame_no_io(&mut self) -> Result<(), Error> {
        self.check_heads()?;
        self.skip_write();
        self.advance()
    }

    fn check_heads(&self) -> Result<(), Error> {
        if self.heads[0].state() == HeadState::Playing
            && self.heads[1].state() == HeadState::Playing
        {
            Err(Error::MultipleActiveHeads)
        } else {
            Ok(())
        }
    }

    #[inline]
    fn read(&self, buffer: &[f32]) -> f32 {
        let [head0, head1] = &self.heads;
        head0.read(buffer) * head_mix_gain(head0.fade())
            + head1.read(buffer) * head_mix_gain(head1.fade())
    }

    #[inline]
    fn write(&mut self, buffer: &mut [f32], input: f32) {
        for head in &mut self.heads {
            head.update_levels(self.pre, self.rec);
            head.write(buffer, input);
        }
    }

    #[inline]
    fn skip_write(&mut self) {
        for head in &mut self.heads {
            head.skip_write(0.0);
        }
    }

    fn advance(&mut self) -> Result<(), Error> {
        for head in &mut self.heads {
            head.advance(self.rate, self.fade_increment, &self.region, self.loop_flag);
        }
        match self.heads[self.active].action() {
            HeadAction::LoopPositive => self.queued_crossfade = Some(self.region.start),
            HeadAction::LoopNegative => self.queued_crossfade = Some(self.region.end),
            _ => (),
        }
        self.dequeue_crossfade()
    }

    fn dequeue_crossfade(&mut self) -> Result<(), Error> {
        if let Some(target) = self.queued_crossfade {
            let inactive = self.active ^ 1;
            if !self.heads[self.active].is_mid_fade()
                && self.heads[inactive].state() == HeadState::Stopped
            {
                self.queued_crossfade = None;
                self.execute_crossfade(target)?;
            }
        }
        Ok(())
    }

    fn execute_crossfade(&mut self, target: f64) -> Result<(), Error> {
        let next_active = self.active ^ 1;
        self.heads[next_active].set_position(target, &self.region, self.rate, self.rec_offset)?;
        let current = &mut self.heads[self.active];
        if current.state() != HeadState::Stopped {
            current.start_fade_out();
        }
        self.active = next_active;
        Ok(())
    }

    fn calc_fade_increment(&mut self) {
        let fade_frames = (self.fade_time * self.sample_rate as f32).max(1.0);
        self.fade_increment = (self.rate.abs() as f32 / fade_frames).clamp(0.0, 1.0);
    }
}

// -------------------------------------------------------------------------------------------------
