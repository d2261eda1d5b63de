use std::sync::Arc;

use crossbeam_queue::ArrayQueue;
use four_cc::FourCC;

use super::EngineMessage;
use crate::{error::Error, parameter::ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// Control a [`LoopEngine`](super::LoopEngine)'s voices from any thread.
///
/// Handles are `Send` and `Sync` so they can be sent across threads. Changes are queued and get
/// applied by the engine in the audio thread before it processes the next block.
#[derive(Debug, Clone)]
pub struct LoopEngineHandle {
    voice_count: usize,
    message_queue: Arc<ArrayQueue<EngineMessage>>,
}

impl LoopEngineHandle {
    pub(crate) fn new(voice_count: usize, message_queue: Arc<ArrayQueue<EngineMessage>>) -> Self {
        Self {
            voice_count,
            message_queue,
        }
    }

    /// Number of voices in the engine.
    pub fn voice_count(&self) -> usize {
        self.voice_count
    }

    /// Set a voice parameter's value via the given plain or normalized value update definition.
    ///
    /// Note: Value update (id, value) tuples can be created safely via `value_update` functions
    /// in [FloatParameter](crate::parameters::FloatParameter) and
    /// [BooleanParameter](crate::parameters::BooleanParameter).
    pub fn set_parameter(
        &self,
        voice: usize,
        (parameter_id, update): (FourCC, ParameterValueUpdate),
    ) -> Result<(), Error> {
        self.check_voice(voice)?;
        if let ParameterValueUpdate::Normalized(normalized_value) = update {
            if !(0.0..=1.0).contains(&normalized_value) {
                return Err(Error::ParameterError(format!(
                    "Invalid parameter update: value should be a normalized value, but is: '{normalized_value}'"
                )));
            }
        }
        self.push(
            EngineMessage::SetParameter {
                voice,
                parameter_id,
                update,
            },
            "set_parameter",
        )
    }

    /// Crossfade a voice to the given position in seconds.
    pub fn set_position(&self, voice: usize, position: f64) -> Result<(), Error> {
        self.check_voice(voice)?;
        self.push(
            EngineMessage::SetPosition { voice, position },
            "set_position",
        )
    }

    /// Move voice `follow` to the position of voice `lead` plus `offset` seconds.
    pub fn sync_voice(&self, follow: usize, lead: usize, offset: f64) -> Result<(), Error> {
        self.check_voice(follow)?;
        self.check_voice(lead)?;
        self.push(
            EngineMessage::SyncVoice {
                follow,
                lead,
                offset,
            },
            "sync_voice",
        )
    }

    /// Assign one of the engine's buffers to a voice. Invalid buffer indices are rejected by the
    /// engine when applying the message.
    pub fn set_voice_buffer(&self, voice: usize, buffer: usize) -> Result<(), Error> {
        self.check_voice(voice)?;
        self.push(
            EngineMessage::SetVoiceBuffer { voice, buffer },
            "set_voice_buffer",
        )
    }

    /// Silence the content of one of the engine's buffers. Invalid buffer indices are rejected
    /// by the engine when applying the message.
    pub fn clear_buffer(&self, buffer: usize) -> Result<(), Error> {
        self.push(EngineMessage::ClearBuffer { buffer }, "clear_buffer")
    }

    /// Stop a single voice and drop its pending position changes.
    pub fn reset_voice(&self, voice: usize) -> Result<(), Error> {
        self.check_voice(voice)?;
        self.push(EngineMessage::ResetVoice { voice }, "reset_voice")
    }

    /// Stop all voices.
    pub fn reset(&self) -> Result<(), Error> {
        self.push(EngineMessage::Reset, "reset")
    }

    fn check_voice(&self, voice: usize) -> Result<(), Error> {
        if voice < self.voice_count {
            Ok(())
        } else {
            Err(Error::VoiceNotFoundError(voice))
        }
    }

    fn push(&self, message: EngineMessage, event_name: &str) -> Result<(), Error> {
        if self.message_queue.push(message).is_err() {
            Err(Self::message_queue_error(event_name))
        } else {
            Ok(())
        }
    }

    fn message_queue_error(event_name: &str) -> Error {
        log::warn!("Engine's message queue is full. Failed to send a {event_name} event.");
        log::warn!("Process blocks more frequently to prevent this from happening...");
        Error::SendError("Engine message queue is full".to_string())
    }
}

// -------------------------------------------------------------------------------------------------
