// -------------------------------------------------------------------------------------------------

/// Events send back from the engine to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceStatusEvent {
    Position {
        /// Index of the voice.
        voice: usize,
        /// The voice's quantized playback position in seconds.
        position: f64,
    },
}
