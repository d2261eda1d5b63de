#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod engine;
mod error;
mod head;
mod parameter;
mod voice;

// public, flat re-exports
pub use error::Error;

pub use engine::{EngineMessage, LoopEngine, LoopEngineHandle, VoiceStatusEvent};
pub use head::{HeadAction, HeadState, LoopRegion, ReadWriteHead, SubHead};
pub use voice::Voice;

pub use parameter::{ClonableParameter, Parameter, ParameterType, ParameterValueUpdate};

// public mods
pub mod utils;

pub mod parameters {
    //! Parameter descriptors and value wrappers, as used by voices.

    pub use super::parameter::{
        BooleanParameter, BooleanParameterValue, FloatParameter, FloatParameterValue,
        SmoothedParameterValue,
    };
}
