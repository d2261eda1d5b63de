use std::{
    fmt::{Debug, Display},
    ops::RangeInclusive,
    sync::Arc,
};

use four_cc::FourCC;

use super::{Parameter, ParameterType, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// A continuous (float) parameter descriptor.
#[derive(Clone)]
pub struct FloatParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<f32>,
    default: f32,
    unit: &'static str,
    #[allow(clippy::type_complexity)]
    value_to_string: Option<Arc<dyn Fn(f32) -> String + Send + Sync>>,
    #[allow(clippy::type_complexity)]
    string_to_value: Option<Arc<dyn Fn(&str) -> Option<f32> + Send + Sync>>,
}

impl Debug for FloatParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloatParameter")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("range", &self.range)
            .field("default", &self.default)
            .field("unit", &self.unit)
            .field("value_to_string", &self.value_to_string.is_some())
            .field("string_to_value", &self.string_to_value.is_some())
            .finish()
    }
}

impl FloatParameter {
    /// Create a new float parameter descriptor.
    pub const fn new(
        id: FourCC,
        name: &'static str,
        range: RangeInclusive<f32>,
        default: f32,
    ) -> Self {
        assert!(
            *range.start() < *range.end(),
            "Invalid parameter value range"
        );
        assert!(
            default >= *range.start() && default <= *range.end(),
            "Invalid parameter default value"
        );
        Self {
            id,
            name,
            range,
            default,
            unit: "",
            value_to_string: None,
            string_to_value: None,
        }
    }

    /// Optional unit for string displays.
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// Optional custom conversion functions to convert a plain value to a string and string
    /// to a plain value.
    ///
    /// Returned strings should not contain a unit, if a unit already was set for this parameter.
    /// If strings cannot be parsed, the callback should return `None`. Returned values will be
    /// clamped automatically.
    pub fn with_display<
        ValueToString: Fn(f32) -> String + Send + Sync + 'static,
        StringToValue: Fn(&str) -> Option<f32> + Send + Sync + 'static,
    >(
        mut self,
        value_to_string: ValueToString,
        string_to_value: StringToValue,
    ) -> Self {
        self.value_to_string = Some(Arc::new(value_to_string));
        self.string_to_value = Some(Arc::new(string_to_value));
        self
    }

    /// Create a plain value update for this parameter.
    #[must_use]
    pub fn value_update(&self, value: f32) -> (FourCC, ParameterValueUpdate) {
        (self.id, ParameterValueUpdate::Float(value))
    }

    /// The parameter's identifier.
    pub const fn id(&self) -> FourCC {
        self.id
    }

    /// The parameter's value range.
    pub fn range(&self) -> &RangeInclusive<f32> {
        &self.range
    }

    /// The parameter's default value.
    pub fn default_value(&self) -> f32 {
        self.default
    }

    /// Clamp the given plain value to the parameter's range.
    pub fn clamp_value(&self, value: f32) -> f32 {
        value.clamp(*self.range.start(), *self.range.end())
    }

    /// Normalize the given plain value to a 0.0-1.0 range.
    pub fn normalize_value(&self, value: f32) -> f32 {
        (self.clamp_value(value) - *self.range.start()) / (*self.range.end() - *self.range.start())
    }

    /// Denormalize a 0.0-1.0 ranged value to the corresponding plain value.
    pub fn denormalize_value(&self, normalized: f32) -> f32 {
        assert!((0.0..=1.0).contains(&normalized));
        *self.range.start() + normalized * (*self.range.end() - *self.range.start())
    }

    /// Convert the given plain value to a string, using a custom conversion function if provided.
    pub fn value_to_string(&self, value: f32, include_unit: bool) -> String {
        match (&self.value_to_string, include_unit && !self.unit.is_empty()) {
            (Some(f), true) => format!("{} {}", f(value), self.unit),
            (Some(f), false) => f(value),
            (None, true) => format!("{:.2} {}", value, self.unit),
            (None, false) => format!("{:.2}", value),
        }
    }

    /// Convert the given string to a plain value, using a custom conversion function if provided.
    pub fn string_to_value(&self, string: &str) -> Option<f32> {
        let value = match &self.string_to_value {
            Some(f) => f(string.trim()),
            None => string
                .trim()
                .trim_end_matches(self.unit)
                .trim()
                .parse()
                .ok(),
        }?;
        Some(self.clamp_value(value))
    }

    /// Resolve a value update into a plain value. Returns `None` for updates of the wrong type
    /// or invalid values.
    pub(crate) fn resolve_update(&self, update: &ParameterValueUpdate) -> Option<f32> {
        match *update {
            ParameterValueUpdate::Float(value) if !value.is_nan() => Some(self.clamp_value(value)),
            ParameterValueUpdate::Normalized(normalized) if !normalized.is_nan() => {
                Some(self.denormalize_value(normalized.clamp(0.0, 1.0)))
            }
            _ => {
                log::warn!(
                    "Invalid value update for float parameter '{}': {:?}",
                    self.id,
                    update
                );
                None
            }
        }
    }
}

impl Parameter for FloatParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Float {
            range: self.range.clone(),
            default: self.default,
        }
    }

    fn default_normalized_value(&self) -> f32 {
        self.normalize_value(self.default)
    }

    fn normalized_value_to_string(&self, normalized: f32, include_unit: bool) -> String {
        let value = self.denormalize_value(normalized.clamp(0.0, 1.0));
        self.value_to_string(value, include_unit)
    }

    fn string_to_normalized_value(&self, string: String) -> Option<f32> {
        let value = self.string_to_value(&string)?;
        Some(self.normalize_value(value))
    }
}

// -------------------------------------------------------------------------------------------------

/// Holds a float parameter value and its description.
#[derive(Debug, Clone)]
pub struct FloatParameterValue {
    /// The parameter's description and constraints.
    description: FloatParameter,
    /// The current value of the parameter.
    value: f32,
}

impl FloatParameterValue {
    /// Create a new parameter value with the given parameter description, initialized to the
    /// parameter's default value.
    pub fn from_description(description: FloatParameter) -> Self {
        let value = description.default_value();
        Self { value, description }
    }

    /// Access the parameter value's description.
    pub fn description(&self) -> &FloatParameter {
        &self.description
    }

    /// Access to the current value.
    #[inline(always)]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Set a new value.
    pub fn set_value(&mut self, value: f32) {
        assert!(
            self.description.range().contains(&value),
            "Value out of bounds"
        );
        self.value = value;
    }

    /// Set a new value, clamping the given value into the parameter's value bounds if necessary.
    pub fn set_value_clamped(&mut self, value: f32) {
        self.value = self.description.clamp_value(value);
    }

    /// Applies a parameter update. Invalid updates are logged and ignored.
    pub fn apply_update(&mut self, update: &ParameterValueUpdate) {
        if let Some(value) = self.description.resolve_update(update) {
            self.value = value;
        }
    }
}

impl From<FloatParameter> for FloatParameterValue {
    fn from(description: FloatParameter) -> Self {
        Self::from_description(description)
    }
}

impl Display for FloatParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let include_unit = true;
        f.write_str(&self.description.value_to_string(self.value, include_unit))
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_parameter() -> FloatParameter {
        FloatParameter::new(FourCC(*b"test"), "Test", -2.0..=2.0, 1.0).with_unit("x")
    }

    #[test]
    fn normalization() {
        let parameter = test_parameter();
        assert_eq!(parameter.normalize_value(-2.0), 0.0);
        assert_eq!(parameter.normalize_value(0.0), 0.5);
        assert_eq!(parameter.normalize_value(10.0), 1.0);
        assert_eq!(parameter.denormalize_value(0.75), 1.0);
        assert_eq!(parameter.default_normalized_value(), 0.75);
    }

    #[test]
    fn string_conversion() {
        let parameter = test_parameter();
        assert_eq!(parameter.value_to_string(1.5, true), "1.50 x");
        assert_eq!(parameter.value_to_string(1.5, false), "1.50");
        assert_eq!(parameter.string_to_value(" 0.5 x"), Some(0.5));
        assert_eq!(parameter.string_to_value("12"), Some(2.0));
        assert_eq!(parameter.string_to_value("abc"), None);
        assert_eq!(
            parameter.string_to_normalized_value("0".to_string()),
            Some(0.5)
        );

        let percent = FloatParameter::new(FourCC(*b"prct"), "Percent", 0.0..=1.0, 0.5)
            .with_unit("%")
            .with_display(
                |v| format!("{:.0}", v * 100.0),
                |s| s.parse::<f32>().map(|f| f / 100.0).ok(),
            );
        assert_eq!(percent.value_to_string(0.25, true), "25 %");
        assert_eq!(percent.string_to_value("50"), Some(0.5));
    }

    #[test]
    fn value_updates() {
        let parameter = test_parameter();
        let mut value = FloatParameterValue::from_description(parameter.clone());
        assert_eq!(value.value(), 1.0);

        let (id, update) = parameter.value_update(-1.0);
        assert_eq!(id, parameter.id());
        value.apply_update(&update);
        assert_eq!(value.value(), -1.0);

        value.apply_update(&ParameterValueUpdate::Float(5.0));
        assert_eq!(value.value(), 2.0);

        value.apply_update(&ParameterValueUpdate::Normalized(0.0));
        assert_eq!(value.value(), -2.0);

        // invalid updates are ignored
        value.apply_update(&ParameterValueUpdate::Boolean(true));
        value.apply_update(&ParameterValueUpdate::Float(f32::NAN));
        assert_eq!(value.value(), -2.0);

        assert_eq!(value.to_string(), "-2.00 x");
    }
}
