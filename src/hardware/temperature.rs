// src/hardware/temperature.rs
use std::fmt;

/// Convert degrees Celsius to degrees Fahrenheit.
pub fn c_to_f(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Convert degrees Fahrenheit to degrees Celsius.
pub fn f_to_c(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

/// A temperature reading tagged with the unit it was taken in.
///
/// Sensors report in their native unit (Celsius for every driver we ship),
/// the firing logic works in Fahrenheit. Conversions are exact and total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    value: f64,
    unit: TemperatureUnit,
}

impl Temperature {
    pub fn celsius(value: f64) -> Self {
        Self { value, unit: TemperatureUnit::Celsius }
    }

    pub fn fahrenheit(value: f64) -> Self {
        Self { value, unit: TemperatureUnit::Fahrenheit }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn as_celsius(&self) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => self.value,
            TemperatureUnit::Fahrenheit => f_to_c(self.value),
        }
    }

    pub fn as_fahrenheit(&self) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => c_to_f(self.value),
            TemperatureUnit::Fahrenheit => self.value,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            TemperatureUnit::Celsius => write!(f, "{:.1}°C", self.value),
            TemperatureUnit::Fahrenheit => write!(f, "{:.1}°F", self.value),
        }
    }
}
