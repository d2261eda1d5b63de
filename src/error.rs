use std::{error, fmt};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by tapehead.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// A head got repositioned while it still was moving (fading or playing).
    HeadNotStopped,
    /// Both heads of a voice are playing at the same time.
    MultipleActiveHeads,
    VoiceNotFoundError(usize),
    BufferNotFoundError(usize),
    ParameterError(String),
    SendError(String),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeadNotStopped => write!(f, "Can not set the position of a moving head"),
            Self::MultipleActiveHeads => write!(f, "Multiple heads are playing at the same time"),
            Self::VoiceNotFoundError(voice_index) => {
                write!(f, "Voice with index {voice_index} not found")
            }
            Self::BufferNotFoundError(buffer_index) => {
                write!(f, "Buffer with index {buffer_index} not found")
            }
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
            Self::SendError(str) => write!(f, "Failed to send channel message: {str}"),
        }
    }
}

impl<T> From<crossbeam_channel::TrySendError<T>> for Error {
    fn from(err: crossbeam_channel::TrySendError<T>) -> Self {
        Error::SendError(err.to_string())
    }
}
