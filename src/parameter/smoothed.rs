use std::fmt::{Debug, Display};

use crate::utils::smoothed::{ExponentialSmoothedValue, SmoothedValue};

use super::{FloatParameter, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// Holds a float parameter value and its description, using a [`SmoothedValue`] instance to
/// smoothly update the value on changes.
///
/// The smoothed value needs a valid sample rate set. So make sure to call [`Self::set_sample_rate`]
/// as soon as the parameter's voice gets initialized.
#[derive(Debug, Clone)]
pub struct SmoothedParameterValue<Value: SmoothedValue = ExponentialSmoothedValue> {
    /// The parameter's description and constraints.
    description: FloatParameter,
    /// The smoothed value of the parameter.
    value: Value,
}

impl<Value: SmoothedValue> SmoothedParameterValue<Value> {
    /// Create a new SmoothedParameterValue with the given parameter, using
    /// a default instance of a smoother, initialized to the parameter's default value.
    ///
    /// NB: Call `set_sample_rate` before using the parameter value to property set up
    /// the default constructed smoother!
    pub fn from_description(description: FloatParameter) -> Self
    where
        Value: From<f32>,
    {
        let value = Value::from(description.default_value());
        Self { value, description }
    }

    /// Access the parameter value's description.
    pub fn description(&self) -> &FloatParameter {
        &self.description
    }

    /// Set a sample rate for the smoother. Must be called before using the value!
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.value.set_sample_rate(sample_rate)
    }

    /// Test if ramping is necessary. When not, `target_value` can be used directly without
    /// ramping to avoid processing overhead.
    pub fn value_need_ramp(&self) -> bool {
        self.value.need_ramp()
    }

    /// Apply smoothing, if needed, and return current value. This should be called once
    /// per sample frame.
    #[inline(always)]
    pub fn next_value(&mut self) -> f32 {
        self.value.next()
    }

    /// Access to the smoothed current value.
    #[inline(always)]
    pub fn current_value(&self) -> f32 {
        self.value.current()
    }

    /// Access to the smoothed target value.
    #[inline(always)]
    pub fn target_value(&self) -> f32 {
        self.value.target()
    }

    /// Set a new smoothed target value, clamping the given value into the
    /// parameter's value bounds if necessary.
    pub fn set_target_value_clamped(&mut self, value: f32) {
        self.value.set_target(self.description.clamp_value(value));
    }

    /// Initialize the smoothed value so that no smoothing is performed, clamping the
    /// given value into the parameter's value bounds if necessary.
    pub fn init_value_clamped(&mut self, value: f32) {
        self.value.init(self.description.clamp_value(value));
    }

    /// Applies a parameter update by setting a new target value. Invalid updates are logged
    /// and ignored.
    pub fn apply_update(&mut self, update: &ParameterValueUpdate) {
        if let Some(value) = self.description.resolve_update(update) {
            self.value.set_target(value);
        }
    }
}

impl SmoothedParameterValue<ExponentialSmoothedValue> {
    /// Slew time of the exponential smoother in seconds.
    pub fn slew_time(&self) -> f32 {
        self.value.slew_time()
    }

    /// Set a new slew time for the exponential smoother in seconds. 0 disables smoothing.
    pub fn set_slew_time(&mut self, slew_time: f32) {
        self.value.set_slew_time(slew_time);
    }
}

impl<Value: SmoothedValue> From<FloatParameter> for SmoothedParameterValue<Value>
where
    Value: From<f32>,
{
    fn from(description: FloatParameter) -> Self {
        Self::from_description(description)
    }
}

impl<Value: SmoothedValue> Display for SmoothedParameterValue<Value> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let include_unit = true;
        f.write_str(
            &self
                .description
                .value_to_string(self.value.target(), include_unit),
        )
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use four_cc::FourCC;

    use super::*;

    #[test]
    fn smoothed_updates() {
        let mut value: SmoothedParameterValue = SmoothedParameterValue::from_description(
            FloatParameter::new(FourCC(*b"levl"), "Level", 0.0..=1.0, 1.0),
        );
        value.set_sample_rate(1000);
        assert_eq!(value.next_value(), 1.0);

        // without slew, updates apply immediately
        value.apply_update(&ParameterValueUpdate::Float(0.5));
        assert_eq!(value.next_value(), 0.5);

        value.set_slew_time(0.1);
        value.apply_update(&ParameterValueUpdate::Normalized(0.0));
        assert_eq!(value.target_value(), 0.0);
        assert!(value.value_need_ramp());
        let first = value.next_value();
        assert!(first < 0.5 && first > 0.0);

        value.init_value_clamped(2.0);
        assert_eq!(value.current_value(), 1.0);
        assert!(!value.value_need_ramp());
    }
}
