//! Text-driven classification of forecast data for display.
//!
//! All classifiers are pure and order-sensitive: the first matching rule wins.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Coarse weather category derived from a free-text condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionCategory {
    Sunny,
    Stormy,
    Rainy,
    Snowy,
    Foggy,
    Cloudy,
}

impl ConditionCategory {
    pub fn from_description(description: &str) -> Self {
        let text = description.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

        if has(&["clear", "sunny"]) {
            Self::Sunny
        } else if has(&["thunder", "storm", "lightning"]) {
            Self::Stormy
        } else if has(&["rain", "shower", "drizzle"]) {
            Self::Rainy
        } else if has(&["snow", "blizzard", "sleet", "ice"]) {
            Self::Snowy
        } else if has(&["mist", "fog", "haze"]) {
            Self::Foggy
        } else {
            // "cloudy", "overcast" and anything unrecognized
            Self::Cloudy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Stormy => "stormy",
            Self::Rainy => "rainy",
            Self::Snowy => "snowy",
            Self::Foggy => "foggy",
            Self::Cloudy => "cloudy",
        }
    }
}

/// Ten fixed Celsius bands, lower bound inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemperatureBand {
    Scorching,
    VeryHot,
    Hot,
    Warm,
    Pleasant,
    Mild,
    Cool,
    Cold,
    VeryCold,
    Freezing,
}

impl TemperatureBand {
    const THRESHOLDS: [(f64, TemperatureBand); 9] = [
        (38.0, Self::Scorching),
        (32.0, Self::VeryHot),
        (27.0, Self::Hot),
        (21.0, Self::Warm),
        (16.0, Self::Pleasant),
        (10.0, Self::Mild),
        (4.0, Self::Cool),
        (-1.0, Self::Cold),
        (-7.0, Self::VeryCold),
    ];

    pub fn from_celsius(temp_c: f64) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(lower, _)| temp_c >= *lower)
            .map(|(_, band)| *band)
            .unwrap_or(Self::Freezing)
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Scorching => "temp-scorching",
            Self::VeryHot => "temp-very-hot",
            Self::Hot => "temp-hot",
            Self::Warm => "temp-warm",
            Self::Pleasant => "temp-pleasant",
            Self::Mild => "temp-mild",
            Self::Cool => "temp-cool",
            Self::Cold => "temp-cold",
            Self::VeryCold => "temp-very-cold",
            Self::Freezing => "temp-freezing",
        }
    }
}

const DAWN_LEAD_MINUTES: i32 = 30;
const DAWN_TRAIL_MINUTES: i32 = 15;
const DUSK_LEAD_MINUTES: i32 = 30;
const DUSK_TRAIL_MINUTES: i32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Dawn,
    Day,
    Dusk,
    Night,
}

impl DayPeriod {
    /// Classify minutes since midnight against sunrise/sunset, also in minutes.
    pub fn from_minutes(now: i32, sunrise: i32, sunset: i32) -> Self {
        let dawn_start = sunrise - DAWN_LEAD_MINUTES;
        let dawn_end = sunrise + DAWN_TRAIL_MINUTES;
        let dusk_start = sunset - DUSK_LEAD_MINUTES;
        let dusk_end = sunset + DUSK_TRAIL_MINUTES;

        if (dawn_start..=dawn_end).contains(&now) {
            Self::Dawn
        } else if now > dawn_end && now < dusk_start {
            Self::Day
        } else if (dusk_start..=dusk_end).contains(&now) {
            Self::Dusk
        } else {
            Self::Night
        }
    }

    /// Classify a local timestamp (`YYYY-MM-DD HH:MM`) against provider
    /// sunrise/sunset strings (`hh:mm AM`). Unparseable input yields `Night`.
    pub fn classify(local_time: &str, sunrise: &str, sunset: &str) -> Self {
        match (
            local_minutes(local_time),
            clock_minutes(sunrise),
            clock_minutes(sunset),
        ) {
            (Some(now), Some(rise), Some(set)) => Self::from_minutes(now, rise, set),
            _ => {
                tracing::debug!(local_time, sunrise, sunset, "unparseable time for day period");
                Self::Night
            }
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Dawn => "time-dawn",
            Self::Day => "time-day",
            Self::Dusk => "time-dusk",
            Self::Night => "time-night",
        }
    }
}

/// Minutes since midnight of a `YYYY-MM-DD HH:MM` timestamp.
pub fn local_minutes(local_time: &str) -> Option<i32> {
    let dt = NaiveDateTime::parse_from_str(local_time.trim(), "%Y-%m-%d %H:%M").ok()?;
    Some(minutes_of(dt.time()))
}

/// Minutes since midnight of a 12-hour clock string such as `"05:45 AM"`.
pub fn clock_minutes(clock: &str) -> Option<i32> {
    let t = NaiveTime::parse_from_str(clock.trim(), "%I:%M %p").ok()?;
    Some(minutes_of(t))
}

fn minutes_of(t: NaiveTime) -> i32 {
    (t.hour() * 60 + t.minute()) as i32
}

/// Glyph shown next to a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherIcon {
    Sun,
    Moon,
    SunBehindCloud,
    Cloud,
    Fog,
    Rain,
    SunBehindRain,
    Thunderstorm,
    HeavySnow,
    Snowflake,
    Ice,
    Wind,
    SunBehindSmallCloud,
}

impl WeatherIcon {
    /// Pick an icon from the condition text; the provider icon URL decides
    /// between day and night variants.
    pub fn from_condition(description: &str, icon_url: &str) -> Self {
        let text = description.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));
        let night = icon_url.contains("/night/") || icon_url.starts_with("night/");

        if has(&["clear", "sunny"]) {
            return if night { Self::Moon } else { Self::Sun };
        }
        if has(&["partly cloudy", "partly overcast"]) {
            return if night { Self::Cloud } else { Self::SunBehindCloud };
        }
        if has(&["cloudy", "overcast"]) {
            return Self::Cloud;
        }
        if has(&["mist", "fog", "haze"]) {
            return Self::Fog;
        }
        // heaviest rain first
        if has(&["heavy rain", "torrential", "moderate rain"]) {
            return Self::Rain;
        }
        if has(&["patchy rain", "light rain", "drizzle"]) {
            return Self::SunBehindRain;
        }
        if has(&["rain", "shower"]) {
            return Self::Rain;
        }
        if has(&["thunder", "storm", "lightning"]) {
            return Self::Thunderstorm;
        }
        if has(&["heavy snow", "blizzard"]) {
            return Self::HeavySnow;
        }
        if has(&["snow"]) {
            return Self::Snowflake;
        }
        if has(&["sleet", "ice pellets", "hail"]) {
            return Self::Ice;
        }
        if has(&["windy", "gale", "breezy"]) {
            return Self::Wind;
        }
        if has(&["freezing"]) {
            return Self::Ice;
        }

        if night { Self::Moon } else { Self::SunBehindSmallCloud }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Sun => "\u{2600}\u{fe0f}",
            Self::Moon => "\u{1f319}",
            Self::SunBehindCloud => "\u{26c5}",
            Self::Cloud => "\u{2601}\u{fe0f}",
            Self::Fog => "\u{1f32b}\u{fe0f}",
            Self::Rain => "\u{1f327}\u{fe0f}",
            Self::SunBehindRain => "\u{1f326}\u{fe0f}",
            Self::Thunderstorm => "\u{26c8}\u{fe0f}",
            Self::HeavySnow => "\u{1f328}\u{fe0f}",
            Self::Snowflake => "\u{2744}\u{fe0f}",
            Self::Ice => "\u{1f9ca}",
            Self::Wind => "\u{1f4a8}",
            Self::SunBehindSmallCloud => "\u{1f324}\u{fe0f}",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_and_sunny_are_sunny() {
        for text in ["Clear", "Sunny", "clear sky"] {
            assert_eq!(ConditionCategory::from_description(text), ConditionCategory::Sunny);
        }
    }

    #[test]
    fn storms_are_checked_before_rain() {
        for text in ["Thunderstorm", "Lightning storm", "Heavy thunder"] {
            assert_eq!(ConditionCategory::from_description(text), ConditionCategory::Stormy);
        }
        assert_eq!(
            ConditionCategory::from_description("Patchy light rain with thunder"),
            ConditionCategory::Stormy
        );
    }

    #[test]
    fn precipitation_categories() {
        for text in ["Rain", "Light rain shower", "Drizzle"] {
            assert_eq!(ConditionCategory::from_description(text), ConditionCategory::Rainy);
        }
        for text in ["Snow", "Blizzard", "Sleet", "Ice pellets"] {
            assert_eq!(ConditionCategory::from_description(text), ConditionCategory::Snowy);
        }
        for text in ["Fog", "Mist", "Haze"] {
            assert_eq!(ConditionCategory::from_description(text), ConditionCategory::Foggy);
        }
    }

    #[test]
    fn unknown_defaults_to_cloudy() {
        for text in ["Cloudy", "Overcast", "Partly cloudy", "Unknown", ""] {
            assert_eq!(ConditionCategory::from_description(text), ConditionCategory::Cloudy);
        }
    }

    #[test]
    fn temperature_bands() {
        let cases = [
            (40.0, TemperatureBand::Scorching),
            (35.0, TemperatureBand::VeryHot),
            (28.0, TemperatureBand::Hot),
            (22.0, TemperatureBand::Warm),
            (18.0, TemperatureBand::Pleasant),
            (12.0, TemperatureBand::Mild),
            (6.0, TemperatureBand::Cool),
            (0.0, TemperatureBand::Cold),
            (-5.0, TemperatureBand::VeryCold),
            (-10.0, TemperatureBand::Freezing),
        ];
        for (temp, band) in cases {
            assert_eq!(TemperatureBand::from_celsius(temp), band, "temp {temp}");
        }
    }

    #[test]
    fn temperature_band_lower_bounds_are_inclusive() {
        assert_eq!(TemperatureBand::from_celsius(38.0), TemperatureBand::Scorching);
        assert_eq!(TemperatureBand::from_celsius(37.9), TemperatureBand::VeryHot);
        assert_eq!(TemperatureBand::from_celsius(-1.0), TemperatureBand::Cold);
        assert_eq!(TemperatureBand::from_celsius(-0.5), TemperatureBand::Cold);
        assert_eq!(TemperatureBand::from_celsius(-7.0), TemperatureBand::VeryCold);
        assert_eq!(TemperatureBand::from_celsius(-7.1), TemperatureBand::Freezing);
        assert_eq!(TemperatureBand::Scorching.css_class(), "temp-scorching");
    }

    #[test]
    fn parses_clock_strings() {
        assert_eq!(clock_minutes("05:45 AM"), Some(5 * 60 + 45));
        assert_eq!(clock_minutes("12:00 AM"), Some(0));
        assert_eq!(clock_minutes("12:00 PM"), Some(12 * 60));
        assert_eq!(clock_minutes("06:00 PM"), Some(18 * 60));
        assert_eq!(clock_minutes("No sunrise"), None);
        assert_eq!(local_minutes("2024-01-01 9:05"), Some(9 * 60 + 5));
    }

    #[test]
    fn dawn_window_starts_thirty_minutes_before_sunrise() {
        assert_eq!(
            DayPeriod::classify("2024-01-01 05:15", "05:45 AM", "06:00 PM"),
            DayPeriod::Dawn
        );
        assert_eq!(
            DayPeriod::classify("2024-01-01 06:00", "05:45 AM", "06:00 PM"),
            DayPeriod::Dawn
        );
        assert_eq!(
            DayPeriod::classify("2024-01-01 05:14", "05:45 AM", "06:00 PM"),
            DayPeriod::Night
        );
    }

    #[test]
    fn day_between_dawn_and_dusk() {
        assert_eq!(
            DayPeriod::classify("2024-01-01 12:00", "06:00 AM", "06:00 PM"),
            DayPeriod::Day
        );
        assert_eq!(
            DayPeriod::classify("2024-01-01 06:16", "06:00 AM", "06:00 PM"),
            DayPeriod::Day
        );
    }

    #[test]
    fn dusk_window_ends_fifteen_minutes_after_sunset() {
        assert_eq!(
            DayPeriod::classify("2024-01-01 17:30", "06:00 AM", "06:00 PM"),
            DayPeriod::Dusk
        );
        assert_eq!(
            DayPeriod::classify("2024-01-01 18:15", "06:00 AM", "06:00 PM"),
            DayPeriod::Dusk
        );
        assert_eq!(
            DayPeriod::classify("2024-01-01 18:16", "06:00 AM", "06:00 PM"),
            DayPeriod::Night
        );
    }

    #[test]
    fn night_outside_windows_and_on_bad_input() {
        assert_eq!(
            DayPeriod::classify("2024-01-01 22:00", "06:00 AM", "06:00 PM"),
            DayPeriod::Night
        );
        assert_eq!(
            DayPeriod::classify("2024-01-01 03:00", "06:00 AM", "06:00 PM"),
            DayPeriod::Night
        );
        assert_eq!(DayPeriod::classify("garbage", "06:00 AM", "06:00 PM"), DayPeriod::Night);
    }

    #[test]
    fn icons_respect_day_and_night() {
        assert_eq!(WeatherIcon::from_condition("Clear", "//cdn/64x64/day/113.png"), WeatherIcon::Sun);
        assert_eq!(WeatherIcon::from_condition("Clear", "//cdn/64x64/night/113.png"), WeatherIcon::Moon);
        assert_eq!(
            WeatherIcon::from_condition("Partly cloudy", "//cdn/64x64/day/116.png"),
            WeatherIcon::SunBehindCloud
        );
        assert_eq!(
            WeatherIcon::from_condition("Partly cloudy", "//cdn/64x64/night/116.png"),
            WeatherIcon::Cloud
        );
        assert_eq!(WeatherIcon::from_condition("Unknown", "day/x.png"), WeatherIcon::SunBehindSmallCloud);
        assert_eq!(WeatherIcon::from_condition("Unknown", "night/x.png"), WeatherIcon::Moon);
    }

    #[test]
    fn icon_rules_are_ordered() {
        let day = "day/1.png";
        assert_eq!(WeatherIcon::from_condition("Heavy rain", day), WeatherIcon::Rain);
        assert_eq!(WeatherIcon::from_condition("Light rain", day), WeatherIcon::SunBehindRain);
        assert_eq!(WeatherIcon::from_condition("Patchy rain", day), WeatherIcon::SunBehindRain);
        assert_eq!(WeatherIcon::from_condition("Heavy snow", day), WeatherIcon::HeavySnow);
        assert_eq!(WeatherIcon::from_condition("Light snow", day), WeatherIcon::Snowflake);
        assert_eq!(WeatherIcon::from_condition("Sleet", day), WeatherIcon::Ice);
        assert_eq!(WeatherIcon::from_condition("Hail", day), WeatherIcon::Ice);
        assert_eq!(WeatherIcon::from_condition("Thunderstorm", day), WeatherIcon::Thunderstorm);
        assert_eq!(WeatherIcon::from_condition("Mist", day), WeatherIcon::Fog);
        assert_eq!(WeatherIcon::from_condition("Windy", day), WeatherIcon::Wind);
        assert_eq!(WeatherIcon::Sun.glyph(), "\u{2600}\u{fe0f}");
    }
}
