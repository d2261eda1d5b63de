//! A single read/write cursor of a [`ReadWriteHead`](super::ReadWriteHead).

use assume::assume;

use super::LoopRegion;
use crate::{
    utils::{
        buffer::wrap_buffer_index,
        fades::{pre_fade_curve, rec_fade_curve},
        interpolate::hermite,
        resampler::Resampler,
    },
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Operational state of a [`SubHead`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum HeadState {
    /// Idle: does not move, read output is muted and the buffer is left untouched.
    #[default]
    Stopped,
    /// Active and ramping its fade level up towards 1.
    FadeIn,
    /// Active with a fade level of 1.
    Playing,
    /// Ramping its fade level down towards 0.
    FadeOut,
}

// -------------------------------------------------------------------------------------------------

/// Signal a [`SubHead`] emits when moving from one frame to the next.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum HeadAction {
    #[default]
    None,
    /// Head got repositioned and starts fading in with this frame.
    StartFadeIn,
    DoneFadeIn,
    DoneFadeOut,
    /// Head passed the loop end while playing forwards and loops.
    LoopPositive,
    /// Head passed the loop start while playing backwards and loops.
    LoopNegative,
    /// Head left the loop region with looping disabled.
    FadeOutAndStop,
}

// -------------------------------------------------------------------------------------------------

/// One of two alternating read/write cursors of a voice.
///
/// A sub head holds exactly one frame record (state, phase, fade level, write index). Moving to
/// the next frame via [`Self::advance`] folds the previous record into the current one, so a
/// block is processed as a plain sequence of per-frame steps.
///
/// Sub heads never own the buffer they read from and write into: buffers get passed into the
/// read and write functions.
#[derive(Debug, Clone)]
pub struct SubHead {
    state: HeadState,
    action: HeadAction,
    phase: f64,
    // accumulated in f64: sums of f32 increments stay exact
    fade: f64,
    pre: f32,
    rec: f32,
    write_index: isize,
    direction: isize,
    resampler: Resampler,
}

impl SubHead {
    pub fn new() -> Self {
        Self {
            state: HeadState::Stopped,
            action: HeadAction::None,
            phase: 0.0,
            fade: 0.0,
            pre: 1.0,
            rec: 0.0,
            write_index: 0,
            direction: 1,
            resampler: Resampler::new(),
        }
    }

    /// Stop the head and reset all its state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline]
    pub fn state(&self) -> HeadState {
        self.state
    }

    #[inline]
    pub fn action(&self) -> HeadAction {
        self.action
    }

    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Fade level in range `[0, 1]`.
    #[inline]
    pub fn fade(&self) -> f32 {
        self.fade as f32
    }

    /// Current, fade shaped pre level. See [`Self::update_levels`].
    #[inline]
    pub fn pre_level(&self) -> f32 {
        self.pre
    }

    /// Current, fade shaped rec level. See [`Self::update_levels`].
    #[inline]
    pub fn rec_level(&self) -> f32 {
        self.rec
    }

    /// Unwrapped index of the last written buffer frame.
    #[inline]
    pub fn write_index(&self) -> isize {
        self.write_index
    }

    /// +1 when moving forwards, -1 when moving backwards.
    #[inline]
    pub fn direction(&self) -> isize {
        self.direction
    }

    /// True when the head is fading in or out.
    #[inline]
    pub fn is_fading(&self) -> bool {
        matches!(self.state, HeadState::FadeIn | HeadState::FadeOut)
    }

    /// True when the head is in a fade which started before the current frame. A head which left
    /// its playing state in the current frame is departing and not yet considered mid-fade.
    #[inline]
    pub fn is_mid_fade(&self) -> bool {
        match self.state {
            HeadState::FadeIn => true,
            HeadState::FadeOut => !matches!(
                self.action,
                HeadAction::LoopPositive | HeadAction::LoopNegative | HeadAction::FadeOutAndStop
            ),
            HeadState::Playing | HeadState::Stopped => false,
        }
    }

    /// Set the head to FadeOut. Playing heads keep their fade level and fade from there.
    pub fn start_fade_out(&mut self) {
        debug_assert!(
            self.state != HeadState::Stopped,
            "Only moving heads can fade out"
        );
        self.state = HeadState::FadeOut;
    }

    /// Move a stopped head to the given position and start fading in.
    ///
    /// `position` is wrapped into the given loop region. The write index is placed at the
    /// position plus the record offset in the current direction, so that with the resampler's
    /// latency, record writes line up with reads at the same phase.
    ///
    /// Returns [`Error::HeadNotStopped`] when the head is still moving.
    pub fn set_position(
        &mut self,
        position: f64,
        region: &LoopRegion,
        rate: f64,
        rec_offset: isize,
    ) -> Result<(), Error> {
        if self.state != HeadState::Stopped {
            return Err(Error::HeadNotStopped);
        }
        let phase = region.wrap_phase(position);
        self.direction = if rate < 0.0 { -1 } else { 1 };
        self.phase = phase;
        self.fade = 0.0;
        self.write_index = phase as isize + self.direction * rec_offset;
        self.state = HeadState::FadeIn;
        self.action = HeadAction::StartFadeIn;
        // start each pass with the same subframe history, so fractional rates produce
        // identical write patterns on every pass
        self.resampler.set_phase(0.0);
        self.resampler.clear_buffers();
        Ok(())
    }

    /// Move the head from the previous to the current frame: update phase, fade level and
    /// state and return the action this step produced.
    pub fn advance(
        &mut self,
        rate: f64,
        fade_increment: f32,
        region: &LoopRegion,
        loop_flag: bool,
    ) -> HeadAction {
        self.resampler.set_rate(rate.abs());
        if rate != 0.0 {
            self.direction = if rate < 0.0 { -1 } else { 1 };
        }

        let (state, action) = match self.state {
            HeadState::FadeIn => {
                self.phase += rate;
                self.fade += fade_increment as f64;
                if self.fade >= 1.0 {
                    self.fade = 1.0;
                    (HeadState::Playing, HeadAction::DoneFadeIn)
                } else {
                    (HeadState::FadeIn, HeadAction::None)
                }
            }
            HeadState::FadeOut => {
                self.phase += rate;
                self.fade -= fade_increment as f64;
                if self.fade <= 0.0 {
                    self.fade = 0.0;
                    (HeadState::Stopped, HeadAction::DoneFadeOut)
                } else {
                    (HeadState::FadeOut, HeadAction::None)
                }
            }
            HeadState::Playing => {
                self.phase += rate;
                self.fade = 1.0;
                let left_region = if rate > 0.0 {
                    self.phase > region.end
                } else {
                    self.phase < region.start
                };
                if !left_region {
                    (HeadState::Playing, HeadAction::None)
                } else if !loop_flag {
                    (HeadState::FadeOut, HeadAction::FadeOutAndStop)
                } else if rate > 0.0 {
                    (HeadState::FadeOut, HeadAction::LoopPositive)
                } else {
                    (HeadState::FadeOut, HeadAction::LoopNegative)
                }
            }
            HeadState::Stopped => {
                self.fade = 0.0;
                (HeadState::Stopped, HeadAction::None)
            }
        };
        self.state = state;
        self.action = action;
        action
    }

    /// Calculate this frame's effective pre and rec levels from the given raw levels.
    ///
    /// Playing heads use the raw levels, stopped heads keep the buffer as it is (pre = 1,
    /// rec = 0) and fading heads shape the levels with the pre and rec fade curves.
    pub fn update_levels(&mut self, pre: f32, rec: f32) {
        match self.state {
            HeadState::Stopped => {
                self.pre = 1.0;
                self.rec = 0.0;
            }
            HeadState::Playing => {
                self.pre = pre;
                self.rec = rec;
            }
            HeadState::FadeIn | HeadState::FadeOut => {
                let fade = self.fade();
                self.pre = pre + (1.0 - pre) * pre_fade_curve(fade);
                self.rec = rec * rec_fade_curve(fade);
            }
        }
    }

    /// Feed a new input frame into the resampler and write all resulting subframes into the
    /// buffer, blending them with the buffer's old content via the current pre and rec levels.
    ///
    /// Input is always pushed into the resampler to keep its history continuous, but stopped
    /// heads never touch the buffer.
    pub fn write(&mut self, buffer: &mut [f32], input: f32) {
        if buffer.is_empty() {
            self.skip_write(input);
            return;
        }

        let subframe_count = self.resampler.process_frame(input);
        if self.state == HeadState::Stopped {
            return;
        }

        let len = buffer.len();
        let mut index = self.write_index;
        for &subframe in &self.resampler.output()[..subframe_count] {
            let wrapped = wrap_buffer_index(index + self.direction, len);
            assume!(unsafe: wrapped < len);
            buffer[wrapped] = buffer[wrapped] * self.pre + subframe * self.rec;
            index = wrapped as isize;
        }
        self.write_index = index;
    }

    /// Feed a new input frame into the resampler and move the write index just like
    /// [`Self::write`] does, without touching any buffer. Keeps writes aligned with the phase
    /// while recording is paused.
    pub fn skip_write(&mut self, input: f32) {
        let subframe_count = self.resampler.process_frame(input);
        if self.state != HeadState::Stopped {
            self.write_index += self.direction * subframe_count as isize;
        }
    }

    /// Read the buffer at the head's current fractional phase.
    pub fn read(&self, buffer: &[f32]) -> f32 {
        if buffer.is_empty() {
            return 0.0;
        }

        let len = buffer.len();
        let phase_floor = self.phase.floor();
        let index = phase_floor as isize;
        let fraction = (self.phase - phase_floor) as f32;

        let i0 = wrap_buffer_index(index - 1, len);
        let i1 = wrap_buffer_index(index, len);
        let i2 = wrap_buffer_index(index + 1, len);
        let i3 = wrap_buffer_index(index + 2, len);

        assume!(unsafe: i0 < len);
        let y0 = buffer[i0];
        assume!(unsafe: i1 < len);
        let y1 = buffer[i1];
        assume!(unsafe: i2 < len);
        let y2 = buffer[i2];
        assume!(unsafe: i3 < len);
        let y3 = buffer[i3];

        hermite(fraction, y0, y1, y2, y3)
    }
}

impl Default for SubHead {
    fn default() -> Self {
        Self::new()
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn region(start: f64, end: f64) -> LoopRegion {
        LoopRegion { start, end }
    }

    #[test]
    fn new_heads_are_stopped() {
        let head = SubHead::new();
        assert_eq!(head.state(), HeadState::Stopped);
        assert_eq!(head.action(), HeadAction::None);
        assert_eq!(head.fade(), 0.0);
        assert!(!head.is_fading());
    }

    #[test]
    fn set_position_starts_fade_in() -> Result<(), Error> {
        let mut head = SubHead::new();
        head.set_position(3.5, &region(0.0, 7.0), 1.0, -2)?;
        assert_eq!(head.state(), HeadState::FadeIn);
        assert_eq!(head.action(), HeadAction::StartFadeIn);
        assert_eq!(head.phase(), 3.5);
        assert_eq!(head.write_index(), 1);
        assert_eq!(head.direction(), 1);

        let mut head = SubHead::new();
        head.set_position(3.0, &region(0.0, 7.0), -1.0, -2)?;
        assert_eq!(head.write_index(), 5);
        assert_eq!(head.direction(), -1);
        Ok(())
    }

    #[test]
    fn set_position_wraps_into_loop() -> Result<(), Error> {
        let mut head = SubHead::new();
        head.set_position(10.0, &region(2.0, 6.0), 1.0, 0)?;
        assert_eq!(head.phase(), 2.0);
        Ok(())
    }

    #[test]
    fn set_position_of_moving_head_fails() -> Result<(), Error> {
        let mut head = SubHead::new();
        head.set_position(0.0, &region(0.0, 7.0), 1.0, 0)?;
        assert_eq!(
            head.set_position(1.0, &region(0.0, 7.0), 1.0, 0),
            Err(Error::HeadNotStopped)
        );
        // the failed call left the head untouched
        assert_eq!(head.phase(), 0.0);
        assert_eq!(head.state(), HeadState::FadeIn);
        Ok(())
    }

    #[test]
    fn fade_in_reaches_playing() -> Result<(), Error> {
        let loop_region = region(0.0, 100.0);
        let mut head = SubHead::new();
        head.set_position(0.0, &loop_region, 1.0, 0)?;
        assert_eq!(head.advance(1.0, 0.25, &loop_region, true), HeadAction::None);
        assert_eq!(head.advance(1.0, 0.25, &loop_region, true), HeadAction::None);
        assert_eq!(head.advance(1.0, 0.25, &loop_region, true), HeadAction::None);
        assert_eq!(
            head.advance(1.0, 0.25, &loop_region, true),
            HeadAction::DoneFadeIn
        );
        assert_eq!(head.state(), HeadState::Playing);
        assert_eq!(head.fade(), 1.0);
        assert_eq!(head.phase(), 4.0);
        Ok(())
    }

    #[test]
    fn playing_head_loops_or_stops() -> Result<(), Error> {
        let loop_region = region(0.0, 3.0);
        for (loop_flag, rate, expected_action) in [
            (true, 1.0, HeadAction::LoopPositive),
            (false, 1.0, HeadAction::FadeOutAndStop),
            (true, -1.0, HeadAction::LoopNegative),
            (false, -1.0, HeadAction::FadeOutAndStop),
        ] {
            let mut head = SubHead::new();
            head.set_position(1.0, &loop_region, rate, 0)?;
            head.advance(rate, 1.0, &loop_region, loop_flag);
            assert_eq!(head.state(), HeadState::Playing);
            let mut action = HeadAction::None;
            for _ in 0..4 {
                action = head.advance(rate, 1.0, &loop_region, loop_flag);
                if action != HeadAction::None {
                    break;
                }
            }
            assert_eq!(action, expected_action);
            assert_eq!(head.state(), HeadState::FadeOut);
            assert_eq!(head.fade(), 1.0);
            assert!(!head.is_mid_fade());

            assert_eq!(
                head.advance(rate, 1.0, &loop_region, loop_flag),
                HeadAction::DoneFadeOut
            );
            assert_eq!(head.state(), HeadState::Stopped);
            assert_eq!(head.fade(), 0.0);
        }
        Ok(())
    }

    #[test]
    fn stopped_heads_hold_their_phase() {
        let mut head = SubHead::new();
        for _ in 0..10 {
            assert_eq!(
                head.advance(1.0, 0.5, &region(0.0, 7.0), true),
                HeadAction::None
            );
        }
        assert_eq!(head.phase(), 0.0);
        assert_eq!(head.fade(), 0.0);
    }

    #[test]
    fn levels_follow_state() -> Result<(), Error> {
        let loop_region = region(0.0, 100.0);
        let mut head = SubHead::new();
        head.update_levels(0.5, 0.8);
        assert_eq!((head.pre_level(), head.rec_level()), (1.0, 0.0));

        head.set_position(0.0, &loop_region, 1.0, 0)?;
        head.update_levels(0.5, 0.8);
        // fade level 0: buffer stays untouched
        assert_eq!((head.pre_level(), head.rec_level()), (1.0, 0.0));

        head.advance(1.0, 0.5, &loop_region, true);
        head.update_levels(0.5, 0.8);
        assert_eq!(head.pre_level(), 0.5);
        assert!(head.rec_level() > 0.0 && head.rec_level() < 0.8);

        head.advance(1.0, 0.5, &loop_region, true);
        head.update_levels(0.5, 0.8);
        assert_eq!((head.pre_level(), head.rec_level()), (0.5, 0.8));
        Ok(())
    }

    #[test]
    fn stopped_heads_do_not_write() {
        let mut buffer = vec![0.25; 8];
        let mut head = SubHead::new();
        head.update_levels(0.0, 1.0);
        for _ in 0..32 {
            head.write(&mut buffer, 1.0);
            head.advance(1.0, 0.5, &region(0.0, 7.0), true);
        }
        assert!(buffer.iter().all(|s| *s == 0.25));
    }

    #[test]
    fn playing_heads_overwrite() -> Result<(), Error> {
        let loop_region = region(0.0, 7.0);
        let mut buffer = vec![0.25; 8];
        let mut head = SubHead::new();
        head.set_position(0.0, &loop_region, 1.0, 0)?;
        head.advance(1.0, 1.0, &loop_region, true);
        assert_eq!(head.state(), HeadState::Playing);
        head.update_levels(0.0, 1.0);
        // prime resampler history
        for _ in 0..4 {
            head.write(&mut buffer, 1.0);
        }
        assert_eq!(head.write_index(), 4);
        // resampler output lags the input by one frame
        assert_eq!(&buffer[1..5], &[0.0, 1.0, 1.0, 1.0]);
        assert_eq!(buffer[5], 0.25);
        Ok(())
    }

    #[test]
    fn backwards_writes_wrap() -> Result<(), Error> {
        let loop_region = region(0.0, 7.0);
        let mut buffer = vec![0.0; 8];
        let mut head = SubHead::new();
        head.set_position(1.0, &loop_region, -1.0, 0)?;
        head.advance(-1.0, 1.0, &loop_region, true);
        head.update_levels(1.0, 1.0);
        head.write(&mut buffer, 0.5);
        head.write(&mut buffer, 0.5);
        head.write(&mut buffer, 0.5);
        assert_eq!(head.write_index(), 6);
        assert_eq!(buffer[6], 0.5);
        Ok(())
    }

    #[test]
    fn read_interpolates_wrapped() -> Result<(), Error> {
        let buffer = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let mut head = SubHead::new();
        head.set_position(2.5, &region(0.0, 7.0), 1.0, 0)?;
        assert!((head.read(&buffer) - 2.5).abs() < 1e-6);

        let buffer = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let mut head = SubHead::new();
        head.set_position(7.5, &region(0.0, 7.5), 1.0, 0)?;
        let value = head.read(&buffer);
        // reads indices 6, 7, 0, 1
        assert!(value > 0.0 && value < 1.0);
        Ok(())
    }

    #[test]
    fn skipped_writes_move_the_write_index() -> Result<(), Error> {
        let loop_region = region(0.0, 100.0);
        let mut buffer = vec![0.0; 128];
        let mut writing = SubHead::new();
        let mut skipping = SubHead::new();
        for head in [&mut writing, &mut skipping] {
            head.set_position(10.0, &loop_region, 0.75, -2)?;
        }
        for _ in 0..20 {
            writing.write(&mut buffer, 0.0);
            skipping.skip_write(0.0);
            assert_eq!(writing.write_index(), skipping.write_index());
            writing.advance(0.75, 0.5, &loop_region, true);
            skipping.advance(0.75, 0.5, &loop_region, true);
        }
        assert_eq!(skipping.write_index(), 10 - 2 + 15);

        // stopped heads keep their index
        let mut stopped = SubHead::new();
        stopped.skip_write(1.0);
        assert_eq!(stopped.write_index(), 0);
        Ok(())
    }
}
