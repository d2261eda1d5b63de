use four_cc::FourCC;

use crate::{
    head::ReadWriteHead,
    parameter::{
        BooleanParameter, BooleanParameterValue, FloatParameter, FloatParameterValue,
        ParameterValueUpdate, SmoothedParameterValue,
    },
    utils::{frames_to_seconds, resampler::Resampler, seconds_to_frames},
    ClonableParameter, Error,
};

// -------------------------------------------------------------------------------------------------

/// A single looping record/playback voice.
///
/// Wraps a [`ReadWriteHead`] with a parameter set, per-sample parameter slewing, play and record
/// flags and phase quantization. All times and positions on this level are in seconds, the head
/// operates in sample frames.
///
/// Voices never own the buffer they play and record: it's passed into [`Self::process_block`].
/// Parameters can be changed directly, or via [`Self::process_parameter_update`] with a
/// [`ParameterValueUpdate`] for one of the voice's parameter ids.
#[derive(Debug, Clone)]
pub struct Voice {
    sample_rate: u32,
    head: ReadWriteHead,

    // Parameters
    rate: SmoothedParameterValue,
    loop_start: FloatParameterValue,
    loop_end: FloatParameterValue,
    loop_flag: BooleanParameterValue,
    fade_time: FloatParameterValue,
    rec_level: SmoothedParameterValue,
    pre_level: SmoothedParameterValue,
    rec_flag: BooleanParameterValue,
    play_flag: BooleanParameterValue,
    rec_offset: FloatParameterValue,
    level_slew: FloatParameterValue,
    rate_slew: FloatParameterValue,
    rec_pre_slew: FloatParameterValue,
    phase_quant: FloatParameterValue,
    phase_offset: FloatParameterValue,
    level: SmoothedParameterValue,

    // Runtime data
    quant_phase: f64,
}

impl Voice {
    pub const RATE_ID: FourCC = FourCC(*b"rate");
    pub const LOOP_START_ID: FourCC = FourCC(*b"lpst");
    pub const LOOP_END_ID: FourCC = FourCC(*b"lpen");
    pub const LOOP_FLAG_ID: FourCC = FourCC(*b"loop");
    pub const FADE_TIME_ID: FourCC = FourCC(*b"fade");
    pub const REC_LEVEL_ID: FourCC = FourCC(*b"rec_");
    pub const PRE_LEVEL_ID: FourCC = FourCC(*b"pre_");
    pub const REC_FLAG_ID: FourCC = FourCC(*b"recf");
    pub const PLAY_FLAG_ID: FourCC = FourCC(*b"plyf");
    pub const REC_OFFSET_ID: FourCC = FourCC(*b"roff");
    pub const LEVEL_SLEW_ID: FourCC = FourCC(*b"lslw");
    pub const RATE_SLEW_ID: FourCC = FourCC(*b"rslw");
    pub const REC_PRE_SLEW_ID: FourCC = FourCC(*b"rpsl");
    pub const PHASE_QUANT_ID: FourCC = FourCC(*b"qant");
    pub const PHASE_OFFSET_ID: FourCC = FourCC(*b"qoff");
    pub const LEVEL_ID: FourCC = FourCC(*b"levl");

    const MAX_LOOP_TIME: f32 = 3600.0;
    const MAX_FADE_TIME: f32 = 10.0;
    const MAX_SLEW_TIME: f32 = 10.0;
    const MAX_REC_OFFSET: f32 = 256.0;

    /// Create a new voice with default parameter values.
    pub fn new(sample_rate: u32) -> Self {
        assert!(sample_rate > 0, "Invalid sample rate");

        let to_string_percent = |v: f32| format!("{:.2}", v * 100.0);
        let from_string_percent = |v: &str| v.parse::<f32>().map(|f| f / 100.0).ok();

        let max_rate = Resampler::MAX_RATE as f32;

        let mut voice = Self {
            sample_rate,
            head: ReadWriteHead::new(sample_rate),

            rate: SmoothedParameterValue::from_description(
                FloatParameter::new(Self::RATE_ID, "Rate", -max_rate..=max_rate, 1.0)
                    .with_unit("x"),
            ),
            loop_start: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::LOOP_START_ID,
                    "Loop Start",
                    0.0..=Self::MAX_LOOP_TIME,
                    0.0,
                )
                .with_unit("s"),
            ),
            loop_end: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::LOOP_END_ID,
                    "Loop End",
                    0.0..=Self::MAX_LOOP_TIME,
                    1.0,
                )
                .with_unit("s"),
            ),
            loop_flag: BooleanParameterValue::from_description(BooleanParameter::new(
                Self::LOOP_FLAG_ID,
                "Loop",
                true,
            )),
            fade_time: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::FADE_TIME_ID,
                    "Fade Time",
                    0.0..=Self::MAX_FADE_TIME,
                    ReadWriteHead::DEFAULT_FADE_TIME,
                )
                .with_unit("s"),
            ),
            rec_level: SmoothedParameterValue::from_description(
                FloatParameter::new(Self::REC_LEVEL_ID, "Rec Level", 0.0..=1.0, 0.0)
                    .with_unit("%")
                    .with_display(to_string_percent, from_string_percent),
            ),
            pre_level: SmoothedParameterValue::from_description(
                FloatParameter::new(Self::PRE_LEVEL_ID, "Pre Level", 0.0..=1.0, 0.0)
                    .with_unit("%")
                    .with_display(to_string_percent, from_string_percent),
            ),
            rec_flag: BooleanParameterValue::from_description(BooleanParameter::new(
                Self::REC_FLAG_ID,
                "Record",
                false,
            )),
            play_flag: BooleanParameterValue::from_description(BooleanParameter::new(
                Self::PLAY_FLAG_ID,
                "Play",
                false,
            )),
            rec_offset: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::REC_OFFSET_ID,
                    "Rec Offset",
                    -Self::MAX_REC_OFFSET..=Self::MAX_REC_OFFSET,
                    ReadWriteHead::DEFAULT_REC_OFFSET as f32,
                )
                .with_unit("smp")
                .with_display(
                    |v| format!("{}", v.round() as isize),
                    |s| s.parse::<isize>().map(|v| v as f32).ok(),
                ),
            ),
            level_slew: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::LEVEL_SLEW_ID,
                    "Level Slew",
                    0.0..=Self::MAX_SLEW_TIME,
                    0.0,
                )
                .with_unit("s"),
            ),
            rate_slew: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::RATE_SLEW_ID,
                    "Rate Slew",
                    0.0..=Self::MAX_SLEW_TIME,
                    0.0,
                )
                .with_unit("s"),
            ),
            rec_pre_slew: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::REC_PRE_SLEW_ID,
                    "Rec/Pre Slew",
                    0.0..=Self::MAX_SLEW_TIME,
                    0.0,
                )
                .with_unit("s"),
            ),
            phase_quant: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::PHASE_QUANT_ID,
                    "Phase Quant",
                    0.0..=Self::MAX_LOOP_TIME,
                    0.0,
                )
                .with_unit("s"),
            ),
            phase_offset: FloatParameterValue::from_description(
                FloatParameter::new(
                    Self::PHASE_OFFSET_ID,
                    "Phase Offset",
                    -Self::MAX_LOOP_TIME..=Self::MAX_LOOP_TIME,
                    0.0,
                )
                .with_unit("s"),
            ),
            level: SmoothedParameterValue::from_description(
                FloatParameter::new(Self::LEVEL_ID, "Level", 0.0..=1.0, 1.0)
                    .with_unit("%")
                    .with_display(to_string_percent, from_string_percent),
            ),

            quant_phase: 0.0,
        };
        voice.set_sample_rate(sample_rate);
        voice
    }

    /// Returns a list of parameter descriptors for this voice.
    pub fn parameters(&self) -> Vec<&dyn ClonableParameter> {
        vec![
            self.rate.description(),
            self.loop_start.description(),
            self.loop_end.description(),
            self.loop_flag.description(),
            self.fade_time.description(),
            self.rec_level.description(),
            self.pre_level.description(),
            self.rec_flag.description(),
            self.play_flag.description(),
            self.rec_offset.description(),
            self.level_slew.description(),
            self.rate_slew.description(),
            self.rec_pre_slew.description(),
            self.phase_quant.description(),
            self.phase_offset.description(),
            self.level.description(),
        ]
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Change the voice's sample rate. Loop points and slews are converted to the new rate.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        assert!(sample_rate > 0, "Invalid sample rate");
        self.sample_rate = sample_rate;
        self.head.set_sample_rate(sample_rate);
        for value in [
            &mut self.rate,
            &mut self.rec_level,
            &mut self.pre_level,
            &mut self.level,
        ] {
            value.set_sample_rate(sample_rate);
        }
        self.sync_head();
    }

    /// Access to the voice's head, e.g. to inspect its sub heads.
    pub fn head(&self) -> &ReadWriteHead {
        &self.head
    }

    /// Current playback position of the active sub head in seconds.
    pub fn position(&self) -> f64 {
        frames_to_seconds(self.head.active_phase(), self.sample_rate)
    }

    /// Request a crossfaded jump to the given position in seconds. The jump is applied in one of
    /// the following frames, as soon as no other crossfade is running.
    pub fn set_position(&mut self, seconds: f64) {
        self.head
            .cut_to_phase(seconds_to_frames(seconds, self.sample_rate));
    }

    /// Quantized position in seconds, as calculated after the last processed block.
    ///
    /// Equals `floor((position + offset) / quant) * quant`. Without a phase quant set, this is
    /// the plain, offsetted position.
    pub fn quant_phase(&self) -> f64 {
        self.quant_phase
    }

    /// Target playback rate.
    pub fn rate(&self) -> f32 {
        self.rate.target_value()
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate.set_target_value_clamped(rate);
    }

    /// Loop start in seconds.
    pub fn loop_start(&self) -> f32 {
        self.loop_start.value()
    }

    pub fn set_loop_start(&mut self, seconds: f32) {
        self.loop_start.set_value_clamped(seconds);
        self.sync_head();
    }

    /// Loop end in seconds.
    pub fn loop_end(&self) -> f32 {
        self.loop_end.value()
    }

    pub fn set_loop_end(&mut self, seconds: f32) {
        self.loop_end.set_value_clamped(seconds);
        self.sync_head();
    }

    pub fn loop_flag(&self) -> bool {
        self.loop_flag.value()
    }

    pub fn set_loop_flag(&mut self, enabled: bool) {
        self.loop_flag.set_value(enabled);
        self.sync_head();
    }

    /// Crossfade time in seconds.
    pub fn fade_time(&self) -> f32 {
        self.fade_time.value()
    }

    pub fn set_fade_time(&mut self, seconds: f32) {
        self.fade_time.set_value_clamped(seconds);
        self.sync_head();
    }

    pub fn rec_level(&self) -> f32 {
        self.rec_level.target_value()
    }

    pub fn set_rec_level(&mut self, level: f32) {
        self.rec_level.set_target_value_clamped(level);
    }

    pub fn pre_level(&self) -> f32 {
        self.pre_level.target_value()
    }

    pub fn set_pre_level(&mut self, level: f32) {
        self.pre_level.set_target_value_clamped(level);
    }

    /// When disabled, the voice does not write into its buffer.
    pub fn rec_flag(&self) -> bool {
        self.rec_flag.value()
    }

    pub fn set_rec_flag(&mut self, enabled: bool) {
        self.rec_flag.set_value(enabled);
    }

    /// When disabled, the voice does not read from its buffer and outputs silence.
    pub fn play_flag(&self) -> bool {
        self.play_flag.value()
    }

    pub fn set_play_flag(&mut self, enabled: bool) {
        self.play_flag.set_value(enabled);
    }

    /// Record offset in sample frames.
    pub fn rec_offset(&self) -> isize {
        self.rec_offset.value().round() as isize
    }

    pub fn set_rec_offset(&mut self, frames: isize) {
        self.rec_offset.set_value_clamped(frames as f32);
        self.sync_head();
    }

    /// Output level.
    pub fn level(&self) -> f32 {
        self.level.target_value()
    }

    pub fn set_level(&mut self, level: f32) {
        self.level.set_target_value_clamped(level);
    }

    pub fn set_level_slew_time(&mut self, seconds: f32) {
        self.level_slew.set_value_clamped(seconds);
        self.sync_slew_times();
    }

    pub fn set_rate_slew_time(&mut self, seconds: f32) {
        self.rate_slew.set_value_clamped(seconds);
        self.sync_slew_times();
    }

    pub fn set_rec_pre_slew_time(&mut self, seconds: f32) {
        self.rec_pre_slew.set_value_clamped(seconds);
        self.sync_slew_times();
    }

    /// Phase quantum in seconds. 0 disables quantization.
    pub fn phase_quant(&self) -> f32 {
        self.phase_quant.value()
    }

    pub fn set_phase_quant(&mut self, seconds: f32) {
        self.phase_quant.set_value_clamped(seconds);
        self.update_quant_phase();
    }

    /// Offset in seconds that gets added to the position before quantizing it.
    pub fn phase_offset(&self) -> f32 {
        self.phase_offset.value()
    }

    pub fn set_phase_offset(&mut self, seconds: f32) {
        self.phase_offset.set_value_clamped(seconds);
        self.update_quant_phase();
    }

    /// Stop the voice's heads, drop pending position changes and bypass all running parameter
    /// ramps. Parameter values are kept.
    pub fn reset(&mut self) {
        self.head.reset();
        for value in [
            &mut self.rate,
            &mut self.rec_level,
            &mut self.pre_level,
            &mut self.level,
        ] {
            value.init_value_clamped(value.target_value());
        }
        self.sync_head();
        self.quant_phase = 0.0;
        self.update_quant_phase();
    }

    /// Handles a parameter update.
    pub fn process_parameter_update(
        &mut self,
        id: FourCC,
        value: &ParameterValueUpdate,
    ) -> Result<(), Error> {
        match id {
            Self::RATE_ID => self.rate.apply_update(value),
            Self::LOOP_START_ID => self.loop_start.apply_update(value),
            Self::LOOP_END_ID => self.loop_end.apply_update(value),
            Self::LOOP_FLAG_ID => self.loop_flag.apply_update(value),
            Self::FADE_TIME_ID => self.fade_time.apply_update(value),
            Self::REC_LEVEL_ID => self.rec_level.apply_update(value),
            Self::PRE_LEVEL_ID => self.pre_level.apply_update(value),
            Self::REC_FLAG_ID => self.rec_flag.apply_update(value),
            Self::PLAY_FLAG_ID => self.play_flag.apply_update(value),
            Self::REC_OFFSET_ID => self.rec_offset.apply_update(value),
            Self::LEVEL_SLEW_ID => self.level_slew.apply_update(value),
            Self::RATE_SLEW_ID => self.rate_slew.apply_update(value),
            Self::REC_PRE_SLEW_ID => self.rec_pre_slew.apply_update(value),
            Self::PHASE_QUANT_ID => self.phase_quant.apply_update(value),
            Self::PHASE_OFFSET_ID => self.phase_offset.apply_update(value),
            Self::LEVEL_ID => self.level.apply_update(value),
            _ => {
                return Err(Error::ParameterError(format!(
                    "Unknown voice parameter: '{id}'"
                )))
            }
        };
        match id {
            Self::LOOP_START_ID
            | Self::LOOP_END_ID
            | Self::LOOP_FLAG_ID
            | Self::FADE_TIME_ID
            | Self::REC_OFFSET_ID => self.sync_head(),
            Self::LEVEL_SLEW_ID | Self::RATE_SLEW_ID | Self::REC_PRE_SLEW_ID => {
                self.sync_slew_times()
            }
            Self::PHASE_QUANT_ID | Self::PHASE_OFFSET_ID => self.update_quant_phase(),
            _ => (),
        }
        Ok(())
    }

    /// Process a block of frames: record `input` into and play back from `buffer`, writing the
    /// voice's output into `output`. Input and output must have the same length.
    ///
    /// Which of reading and writing is applied depends on the play and rec flags. When both are
    /// disabled, the heads still move.
    pub fn process_block(
        &mut self,
        buffer: &mut [f32],
        input: &[f32],
        output: &mut [f32],
    ) -> Result<(), Error> {
        debug_assert_eq!(input.len(), output.len(), "Input/output length mismatch");
        let play = self.play_flag.value();
        let rec = self.rec_flag.value();
        for (input, output) in input.iter().zip(output.iter_mut()) {
            self.head.set_rate(self.rate.next_value() as f64);
            self.head.set_pre_level(self.pre_level.next_value());
            self.head.set_rec_level(self.rec_level.next_value());
            let level = self.level.next_value();
            *output = match (play, rec) {
                (true, true) => self.head.process_frame(buffer, *input)? * level,
                (true, false) => self.head.process_frame_no_write(buffer)? * level,
                (false, true) => {
                    self.head.process_frame_no_read(buffer, *input)?;
                    0.0
                }
                (false, false) => {
                    self.head.process_frame_no_io()?;
                    0.0
                }
            };
        }
        self.update_quant_phase();
        Ok(())
    }

    fn update_quant_phase(&mut self) {
        let quant = self.phase_quant.value() as f64;
        let phase = self.position() + self.phase_offset.value() as f64;
        let quant_phase = if quant > 0.0 {
            (phase / quant).floor() * quant
        } else {
            phase
        };
        self.quant_phase = quant_phase;
    }

    fn sync_head(&mut self) {
        let start = seconds_to_frames(self.loop_start.value() as f64, self.sample_rate);
        let end = seconds_to_frames(self.loop_end.value() as f64, self.sample_rate);
        if end < start {
            log::warn!("Loop end is before loop start: the loop is empty");
        }
        self.head.set_loop_start(start);
        self.head.set_loop_end(end);
        self.head.set_loop_flag(self.loop_flag.value());
        self.head.set_fade_time(self.fade_time.value());
        self.head.set_rec_offset(self.rec_offset());
        self.head.set_rate(self.rate.current_value() as f64);
        self.head.set_pre_level(self.pre_level.current_value());
        self.head.set_rec_level(self.rec_level.current_value());
        self.sync_slew_times();
    }

    fn sync_slew_times(&mut self) {
        self.rate.set_slew_time(self.rate_slew.value());
        self.level.set_slew_time(self.level_slew.value());
        self.rec_level.set_slew_time(self.rec_pre_slew.value());
        self.pre_level.set_slew_time(self.rec_pre_slew.value());
    }
}

// -------------------------------------------------------------------------------------------------
