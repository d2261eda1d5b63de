use four_cc::FourCC;

use crate::parameter::ParameterValueUpdate;

// -------------------------------------------------------------------------------------------------

/// Control messages, sent from a [`LoopEngineHandle`](super::LoopEngineHandle) to the engine.
///
/// Messages are applied in the audio thread, before the next block gets processed.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Apply a parameter update to a voice.
    SetParameter {
        voice: usize,
        parameter_id: FourCC,
        update: ParameterValueUpdate,
    },
    /// Crossfade a voice's playback position to the given position in seconds.
    SetPosition { voice: usize, position: f64 },
    /// Move the follower voice to the leader's position plus an offset in seconds.
    SyncVoice {
        follow: usize,
        lead: usize,
        offset: f64,
    },
    /// Assign a buffer to a voice.
    SetVoiceBuffer { voice: usize, buffer: usize },
    /// Silence a buffer's content.
    ClearBuffer { buffer: usize },
    /// Reset a single voice.
    ResetVoice { voice: usize },
    /// Reset all voices.
    Reset,
}
