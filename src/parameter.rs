//! Voice parameter descriptors and value wrappers.

use std::fmt::Debug;

use four_cc::FourCC;

// -------------------------------------------------------------------------------------------------

/// Describes the type of a [`Parameter`] to e.g. select a proper visual representation in a UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterType {
    /// A continuous floating-point value.
    Float {
        range: std::ops::RangeInclusive<f32>,
        default: f32,
    },
    /// A boolean toggle.
    Boolean { default: bool },
}

// -------------------------------------------------------------------------------------------------

/// Describes a single parameter of a [`Voice`](crate::Voice) for use in UIs or for automation.
pub trait Parameter: Debug {
    /// The unique id of the parameter.
    fn id(&self) -> FourCC;

    /// The name of the parameter.
    fn name(&self) -> &'static str;

    /// The parameter type.
    fn parameter_type(&self) -> ParameterType;

    /// Default value of parameter, expressed as normalized floating point value in range \[0,1\].
    fn default_normalized_value(&self) -> f32;

    /// Convert the given normalized floating point value to a string value.
    fn normalized_value_to_string(&self, normalized: f32, include_unit: bool) -> String;

    /// Convert the given string value to a normalized floating point value.
    /// Returns `None` when conversion failed, else a valid normalized value.
    fn string_to_normalized_value(&self, string: String) -> Option<f32>;
}

/// Allows creating `dyn Parameter` clones.
pub trait ClonableParameter: Parameter {
    /// Create a dyn Parameter clone, wrapped into a box.
    fn dyn_clone(&self) -> Box<dyn Parameter>;
}

impl<P> ClonableParameter for P
where
    P: Parameter + Clone + 'static,
{
    fn dyn_clone(&self) -> Box<dyn Parameter> {
        Box::new(Self::clone(self))
    }
}

// -------------------------------------------------------------------------------------------------

/// An update for a [`Parameter`]'s value, consumed by [`Voice`](crate::Voice)s in audio time.
///
/// Updates are plain values, so they can be passed through lock-free queues without allocating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValueUpdate {
    /// A plain float value, in the parameter's value range.
    Float(f32),
    /// A plain boolean value.
    Boolean(bool),
    /// A float value in range `0.0..=1.0`.
    Normalized(f32),
}

// -------------------------------------------------------------------------------------------------

mod float;
pub use float::{FloatParameter, FloatParameterValue};

mod smoothed;
pub use smoothed::SmoothedParameterValue;

mod boolean;
pub use boolean::{BooleanParameter, BooleanParameterValue};
