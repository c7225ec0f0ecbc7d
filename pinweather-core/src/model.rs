use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A place returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    /// Admin region or state, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    /// Identity key used for pinning and snapshot lookup: `"{name}, {country}"`.
    pub fn key(&self) -> String {
        location_key(&self.name, &self.country)
    }

    /// Human-friendly label including the region when present.
    pub fn label(&self) -> String {
        match self.state.as_deref().filter(|s| !s.is_empty()) {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => self.key(),
        }
    }
}

pub fn location_key(name: &str, country: &str) -> String {
    format!("{name}, {country}")
}

/// One fetched forecast for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub fetched_at: DateTime<Utc>,
    pub current: CurrentConditions,
    pub astronomy: Astronomy,
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
}

impl WeatherSnapshot {
    pub fn key(&self) -> String {
        self.location.key()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp_c: i32,
    pub feels_like_c: i32,
    pub description: String,
    pub icon: String,
    pub humidity_pct: u8,
    pub pressure_mb: i32,
    pub wind_kph: i32,
    pub wind_direction: String,
    pub wind_degree: u16,
    /// US EPA index (1-6), 0 when the provider did not report one.
    pub air_quality: u8,
    pub uv_index: f64,
    pub cloud_cover_pct: u8,
    pub precipitation_mm: f64,
    pub dew_point_c: i32,
    pub visibility_km: f64,
}

/// Provider-formatted astronomy strings, e.g. `"05:45 AM"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Astronomy {
    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
    pub moon_phase: String,
    /// Local wall-clock time at the location, `YYYY-MM-DD HH:MM`.
    pub local_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    /// Display label such as `"3 PM"`.
    pub time: String,
    /// Raw local datetime, kept for day-period classification.
    pub datetime: String,
    pub temp_c: i32,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Display label such as `"Mon, Jan 1"`.
    pub label: String,
    pub date: String,
    pub high_c: i32,
    pub low_c: i32,
    pub description: String,
    pub icon: String,
    pub humidity_pct: f64,
    pub chance_of_rain: u8,
    pub wind_kph: i32,
}
