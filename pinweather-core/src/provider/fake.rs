//! In-process provider for exercising search, selection and refresh.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use crate::{
    error::WeatherError,
    model::{Astronomy, CurrentConditions, Location, WeatherSnapshot},
};

use super::WeatherProvider;

#[derive(Debug, Default)]
pub(crate) struct FakeProvider {
    search_delays: Mutex<HashMap<String, Duration>>,
    forecast_delays: Mutex<HashMap<String, Duration>>,
    failing: Mutex<HashSet<String>>,
    temps: Mutex<HashMap<String, i32>>,
    pub(crate) searches: Mutex<Vec<String>>,
    pub(crate) forecasts: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn delay_search(&self, query: &str, delay: Duration) {
        self.search_delays.lock().insert(query.to_string(), delay);
    }

    pub(crate) fn delay_forecast(&self, key: &str, delay: Duration) {
        self.forecast_delays.lock().insert(key.to_string(), delay);
    }

    pub(crate) fn fail(&self, key: &str) {
        self.failing.lock().insert(key.to_string());
    }

    pub(crate) fn recover(&self, key: &str) {
        self.failing.lock().remove(key);
    }

    pub(crate) fn set_temp(&self, key: &str, temp_c: i32) {
        self.temps.lock().insert(key.to_string(), temp_c);
    }

    pub(crate) fn search_count(&self) -> usize {
        self.searches.lock().len()
    }

    pub(crate) fn forecast_count(&self) -> usize {
        self.forecasts.lock().len()
    }
}

pub(crate) fn location(name: &str, country: &str) -> Location {
    Location { name: name.into(), country: country.into(), state: None, lat: 0.0, lon: 0.0 }
}

pub(crate) fn snapshot(location: &Location, temp_c: i32) -> WeatherSnapshot {
    WeatherSnapshot {
        location: location.clone(),
        fetched_at: Utc::now(),
        current: CurrentConditions {
            temp_c,
            feels_like_c: temp_c,
            description: "Sunny".into(),
            icon: "//cdn/day/113.png".into(),
            humidity_pct: 50,
            pressure_mb: 1013,
            wind_kph: 10,
            wind_direction: "N".into(),
            wind_degree: 0,
            air_quality: 1,
            uv_index: 3.0,
            cloud_cover_pct: 0,
            precipitation_mm: 0.0,
            dew_point_c: 5,
            visibility_km: 10.0,
        },
        astronomy: Astronomy {
            sunrise: "06:00 AM".into(),
            sunset: "06:00 PM".into(),
            moonrise: "08:00 PM".into(),
            moonset: "07:00 AM".into(),
            moon_phase: "Full Moon".into(),
            local_time: "2024-01-01 12:00".into(),
        },
        hourly: Vec::new(),
        daily: Vec::new(),
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, WeatherError> {
        self.searches.lock().push(query.to_string());
        let delay = self.search_delays.lock().get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().contains(query) {
            return Err(WeatherError::MissingData("search"));
        }
        Ok(vec![location(query, "Testland")])
    }

    async fn get_forecast(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        let key = location.key();
        self.forecasts.lock().push(key.clone());
        let delay = self.forecast_delays.lock().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().contains(&key) {
            return Err(WeatherError::Status { endpoint: "forecast", status: 500, body: "boom".into() });
        }
        let temp = self.temps.lock().get(&key).copied().unwrap_or(20);
        Ok(snapshot(location, temp))
    }
}
