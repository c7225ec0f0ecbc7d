//! Display unit conversions.
//!
//! Snapshots always carry metric values; conversion happens at display time
//! according to the user's temperature unit preference.

use serde::{Deserialize, Serialize};

const KM_TO_MI: f64 = 0.621371;
const MM_TO_IN: f64 = 0.0394;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TemperatureUnit {
    #[serde(rename = "C", alias = "c")]
    Celsius,
    #[default]
    #[serde(rename = "F", alias = "f")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    /// Convert a (rounded) Celsius value into this unit.
    pub fn convert(&self, temp_c: i32) -> i32 {
        match self {
            Self::Celsius => temp_c,
            Self::Fahrenheit => round_half_up(f64::from(temp_c) * 9.0 / 5.0 + 32.0),
        }
    }

    pub fn format_temperature(&self, temp_c: i32) -> String {
        format!("{}°{}", self.convert(temp_c), self.symbol())
    }

    pub fn format_wind_speed(&self, kph: i32) -> String {
        match self {
            Self::Celsius => format!("{kph} km/h"),
            Self::Fahrenheit => format!("{} mph", round_half_up(f64::from(kph) * KM_TO_MI)),
        }
    }

    pub fn format_visibility(&self, km: f64) -> String {
        match self {
            Self::Celsius => format!("{km} km"),
            Self::Fahrenheit => format!("{} mi", round_half_up(km * KM_TO_MI)),
        }
    }

    pub fn format_precipitation(&self, mm: f64) -> String {
        match self {
            Self::Celsius => format!("{mm} mm"),
            Self::Fahrenheit => format!("{:.2} in", mm * MM_TO_IN),
        }
    }
}

impl std::str::FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(Self::Celsius),
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            _ => Err(format!("Unknown temperature unit '{s}'. Use C or F.")),
        }
    }
}

/// Round to the nearest integer, ties towards positive infinity (`-2.5 → -2`).
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_half_up_ties_go_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
        assert_eq!(round_half_up(0.49), 0);
    }

    #[test]
    fn fahrenheit_conversion_rounds() {
        assert_eq!(TemperatureUnit::Fahrenheit.convert(0), 32);
        assert_eq!(TemperatureUnit::Fahrenheit.convert(21), 70);
        assert_eq!(TemperatureUnit::Fahrenheit.convert(-40), -40);
        assert_eq!(TemperatureUnit::Celsius.convert(21), 21);
    }

    #[test]
    fn formats_with_unit_symbol() {
        assert_eq!(TemperatureUnit::Fahrenheit.format_temperature(22), "72°F");
        assert_eq!(TemperatureUnit::Celsius.format_temperature(-3), "-3°C");
    }

    #[test]
    fn imperial_formats_convert_distances() {
        let f = TemperatureUnit::Fahrenheit;
        assert_eq!(f.format_wind_speed(20), "12 mph");
        assert_eq!(f.format_visibility(10.0), "6 mi");
        assert_eq!(f.format_precipitation(2.5), "0.10 in");

        let c = TemperatureUnit::Celsius;
        assert_eq!(c.format_wind_speed(20), "20 km/h");
        assert_eq!(c.format_visibility(10.0), "10 km");
        assert_eq!(c.format_precipitation(0.0), "0 mm");
    }

    #[test]
    fn parses_and_toggles() {
        assert_eq!("c".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Celsius));
        assert_eq!("Fahrenheit".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
        assert_eq!(TemperatureUnit::Celsius.toggle(), TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn serializes_as_single_letter() {
        let json = serde_json::to_string(&TemperatureUnit::Celsius).expect("serialize");
        assert_eq!(json, "\"C\"");
    }
}
