//! Multi-voice looper engine, owning buffers and voices.

use std::sync::Arc;

use crossbeam_channel::Sender;
use crossbeam_queue::ArrayQueue;

use crate::{utils::buffer::clear_buffer, voice::Voice, Error};

// -------------------------------------------------------------------------------------------------

mod handle;
mod message;
mod status;

pub use handle::LoopEngineHandle;
pub use message::EngineMessage;
pub use status::VoiceStatusEvent;

// -------------------------------------------------------------------------------------------------

/// Runs a fixed set of [`Voice`]s over a set of shared mono sample buffers.
///
/// Each voice gets assigned one of the engine's buffers. Several voices may share a buffer, e.g.
/// to play back what another voice records. Voices without a buffer still move, but are silent.
///
/// The engine is meant to be driven from a single audio thread via [`Self::process_block`]. Other
/// threads control voices through [`LoopEngineHandle`]s: their messages get applied at the start
/// of every processed block, so parameters never change within a block.
pub struct LoopEngine {
    sample_rate: u32,
    voices: Vec<Voice>,
    voice_buffers: Vec<Option<usize>>,
    buffers: Vec<Box<[f32]>>,
    message_queue: Arc<ArrayQueue<EngineMessage>>,
    status_sender: Option<Sender<VoiceStatusEvent>>,
}

impl LoopEngine {
    /// Number of control messages which can be queued between two processed blocks.
    pub const MESSAGE_QUEUE_SIZE: usize = 1024;

    /// Create a new engine with the given number of voices.
    pub fn new(voice_count: usize, sample_rate: u32) -> Self {
        assert!(sample_rate > 0, "Invalid sample rate");
        log::debug!("Creating loop engine with {voice_count} voices at {sample_rate} Hz");
        Self {
            sample_rate,
            voices: (0..voice_count).map(|_| Voice::new(sample_rate)).collect(),
            voice_buffers: vec![None; voice_count],
            buffers: Vec::new(),
            message_queue: Arc::new(ArrayQueue::new(Self::MESSAGE_QUEUE_SIZE)),
            status_sender: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Change the sample rate of all voices. Loop points, fade and slew times, which are set in
    /// seconds, get rescaled to the new rate. Buffers are kept as they are.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        assert!(sample_rate > 0, "Invalid sample rate");
        log::debug!("Changing loop engine sample rate to {sample_rate} Hz");
        self.sample_rate = sample_rate;
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Create a new handle to control the engine's voices from other threads.
    pub fn handle(&self) -> LoopEngineHandle {
        LoopEngineHandle::new(self.voices.len(), Arc::clone(&self.message_queue))
    }

    /// Set or remove a channel sender for voice status events.
    pub fn set_status_sender(&mut self, sender: Option<Sender<VoiceStatusEvent>>) {
        self.status_sender = sender;
    }

    /// Access a voice.
    pub fn voice(&self, voice: usize) -> Result<&Voice, Error> {
        self.voices
            .get(voice)
            .ok_or(Error::VoiceNotFoundError(voice))
    }

    /// Mutable access to a voice.
    pub fn voice_mut(&mut self, voice: usize) -> Result<&mut Voice, Error> {
        self.voices
            .get_mut(voice)
            .ok_or(Error::VoiceNotFoundError(voice))
    }

    /// Allocate a new, silent buffer with the given number of frames.
    /// Returns the index of the new buffer.
    pub fn add_buffer(&mut self, frames: usize) -> usize {
        self.buffers.push(vec![0.0; frames].into_boxed_slice());
        let index = self.buffers.len() - 1;
        log::debug!("Added buffer #{index} with {frames} frames");
        index
    }

    /// Access a buffer's content.
    pub fn buffer(&self, buffer: usize) -> Result<&[f32], Error> {
        self.buffers
            .get(buffer)
            .map(|buffer| &buffer[..])
            .ok_or(Error::BufferNotFoundError(buffer))
    }

    /// Mutable access to a buffer's content, e.g. to load or clear it.
    pub fn buffer_mut(&mut self, buffer: usize) -> Result<&mut [f32], Error> {
        self.buffers
            .get_mut(buffer)
            .map(|buffer| &mut buffer[..])
            .ok_or(Error::BufferNotFoundError(buffer))
    }

    /// Silence a buffer's content. Voices using the buffer keep running.
    pub fn clear_buffer(&mut self, buffer: usize) -> Result<(), Error> {
        clear_buffer(self.buffer_mut(buffer)?);
        Ok(())
    }

    /// The buffer index assigned to the given voice, if any.
    pub fn voice_buffer(&self, voice: usize) -> Result<Option<usize>, Error> {
        self.voice_buffers
            .get(voice)
            .copied()
            .ok_or(Error::VoiceNotFoundError(voice))
    }

    /// Assign a buffer to a voice.
    pub fn set_voice_buffer(&mut self, voice: usize, buffer: usize) -> Result<(), Error> {
        if voice >= self.voices.len() {
            return Err(Error::VoiceNotFoundError(voice));
        }
        if buffer >= self.buffers.len() {
            return Err(Error::BufferNotFoundError(buffer));
        }
        self.voice_buffers[voice] = Some(buffer);
        Ok(())
    }

    /// Move voice `follow` to the current position of voice `lead` plus `offset` seconds.
    pub fn sync_voice(&mut self, follow: usize, lead: usize, offset: f64) -> Result<(), Error> {
        let position = self.voice(lead)?.position() + offset;
        self.voice_mut(follow)?.set_position(position);
        Ok(())
    }

    /// Reset all voices. Buffers and buffer assignments are kept.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
    }

    /// Apply pending control messages, then process a block of the given voice: records `input`
    /// into and plays back from the voice's buffer, writing the voice's output into `output`.
    ///
    /// Errors from voice processing are logged and passed to the caller.
    pub fn process_block(
        &mut self,
        voice: usize,
        input: &[f32],
        output: &mut [f32],
    ) -> Result<(), Error> {
        Self::assert_no_alloc(|| {
            self.process_messages();

            let buffer_index = *self
                .voice_buffers
                .get(voice)
                .ok_or(Error::VoiceNotFoundError(voice))?;
            let buffer: &mut [f32] = match buffer_index {
                Some(index) => &mut self.buffers[index][..],
                None => &mut [],
            };
            let voice_state = &mut self.voices[voice];
            let previous_quant_phase = voice_state.quant_phase();
            if let Err(err) = voice_state.process_block(buffer, input, output) {
                Self::permit_alloc(|| log::error!("Voice #{voice} processing failed: {err}"));
                return Err(err);
            }

            // positions are only reported for quantized voices
            if voice_state.phase_quant() > 0.0
                && voice_state.quant_phase() != previous_quant_phase
            {
                if let Some(sender) = &self.status_sender {
                    let position = voice_state.quant_phase();
                    Self::permit_alloc(|| {
                        // NB: try_send: ignore full channels and never block
                        if let Err(err) =
                            sender.try_send(VoiceStatusEvent::Position { voice, position })
                        {
                            log::warn!("Failed to send voice status event: {err}");
                        }
                    });
                }
            }
            Ok(())
        })
    }

    /// Apply all pending control messages.
    pub fn process_messages(&mut self) {
        while let Some(message) = self.message_queue.pop() {
            if let Err(err) = self.process_message(message) {
                Self::permit_alloc(|| log::warn!("Failed to apply engine message: {err}"));
            }
        }
    }

    fn process_message(&mut self, message: EngineMessage) -> Result<(), Error> {
        match message {
            EngineMessage::SetParameter {
                voice,
                parameter_id,
                update,
            } => self
                .voice_mut(voice)?
                .process_parameter_update(parameter_id, &update),
            EngineMessage::SetPosition { voice, position } => {
                self.voice_mut(voice)?.set_position(position);
                Ok(())
            }
            EngineMessage::SyncVoice {
                follow,
                lead,
                offset,
            } => self.sync_voice(follow, lead, offset),
            EngineMessage::SetVoiceBuffer { voice, buffer } => {
                self.set_voice_buffer(voice, buffer)
            }
            EngineMessage::ClearBuffer { buffer } => self.clear_buffer(buffer),
            EngineMessage::ResetVoice { voice } => {
                self.voice_mut(voice)?.reset();
                Ok(())
            }
            EngineMessage::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    #[inline]
    fn assert_no_alloc<T, F: FnOnce() -> T>(func: F) -> T {
        #[cfg(feature = "assert-allocs")]
        return assert_no_alloc::assert_no_alloc::<T, F>(func);

        #[cfg(not(feature = "assert-allocs"))]
        return func();
    }

    #[inline]
    fn permit_alloc<T, F: FnOnce() -> T>(func: F) -> T {
        #[cfg(feature = "assert-allocs")]
        return assert_no_alloc::permit_alloc::<T, F>(func);

        #[cfg(not(feature = "assert-allocs"))]
        return func();
    }
}

// -------------------------------------------------------------------------------------------------
