use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::WeatherError,
    model::{
        Astronomy, CurrentConditions, DailyForecast, HourlyForecast, Location, WeatherSnapshot,
    },
    units::round_half_up,
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

const MAX_HOURLY: usize = 24;
const MAX_DAILY: u8 = 7;
const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    forecast_days: u8,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            forecast_days: 7,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_forecast_days(mut self, days: u8) -> Self {
        self.forecast_days = days.clamp(1, MAX_DAILY);
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{endpoint}.json", self.base_url);
        tracing::debug!(endpoint, "requesting WeatherAPI");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|source| WeatherError::Request { endpoint, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| WeatherError::Request { endpoint, source })?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                endpoint,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| WeatherError::Parse { endpoint, source })
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let found: Vec<WaSearchResult> = self.get_json("search", &[("q", query.to_string())]).await?;

        Ok(found.into_iter().map(Location::from).collect())
    }

    async fn get_forecast(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        let parsed: WaForecastResponse = self
            .get_json(
                "forecast",
                &[
                    ("q", format!("{},{}", location.lat, location.lon)),
                    ("days", self.forecast_days.to_string()),
                    ("aqi", "yes".to_string()),
                    ("alerts", "no".to_string()),
                ],
            )
            .await?;

        normalize_forecast(location, parsed, Utc::now())
    }
}

#[derive(Debug, Deserialize)]
struct WaSearchResult {
    name: String,
    #[serde(default)]
    region: String,
    country: String,
    lat: f64,
    lon: f64,
}

impl From<WaSearchResult> for Location {
    fn from(r: WaSearchResult) -> Self {
        Location {
            name: r.name,
            country: r.country,
            state: Some(r.region).filter(|s| !s.is_empty()),
            lat: r.lat,
            lon: r.lon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    localtime: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct WaAirQuality {
    #[serde(rename = "us-epa-index", default)]
    us_epa_index: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    condition: WaCondition,
    humidity: u8,
    #[serde(default)]
    pressure_mb: f64,
    #[serde(default)]
    wind_kph: f64,
    #[serde(default)]
    wind_dir: String,
    #[serde(default)]
    wind_degree: u16,
    #[serde(default)]
    air_quality: Option<WaAirQuality>,
    #[serde(default)]
    uv: f64,
    #[serde(default)]
    cloud: u8,
    #[serde(default)]
    precip_mm: Option<f64>,
    #[serde(default)]
    dewpoint_c: Option<f64>,
    #[serde(default)]
    vis_km: f64,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    #[serde(default)]
    avghumidity: f64,
    #[serde(default)]
    daily_chance_of_rain: Option<u8>,
    #[serde(default)]
    maxwind_kph: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaAstro {
    sunrise: String,
    sunset: String,
    #[serde(default)]
    moonrise: String,
    #[serde(default)]
    moonset: String,
    #[serde(default)]
    moon_phase: String,
}

#[derive(Debug, Deserialize)]
struct WaHour {
    time: String,
    temp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: String,
    day: WaDay,
    astro: WaAstro,
    #[serde(default)]
    hour: Vec<WaHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    current: WaCurrent,
    forecast: WaForecast,
}

fn parse_local(ts: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(ts.trim(), LOCAL_TIME_FORMAT)
        .map_err(|_| WeatherError::Timestamp(ts.to_string()))
}

/// Reshape a raw forecast response into a snapshot for `location`.
fn normalize_forecast(
    location: &Location,
    parsed: WaForecastResponse,
    fetched_at: DateTime<Utc>,
) -> Result<WeatherSnapshot, WeatherError> {
    let WaForecastResponse { location: wa_location, current, forecast } = parsed;

    let first_day = forecast.forecastday.first().ok_or(WeatherError::MissingData("forecastday"))?;
    let astronomy = Astronomy {
        sunrise: first_day.astro.sunrise.clone(),
        sunset: first_day.astro.sunset.clone(),
        moonrise: first_day.astro.moonrise.clone(),
        moonset: first_day.astro.moonset.clone(),
        moon_phase: first_day.astro.moon_phase.clone(),
        local_time: wa_location.localtime.clone(),
    };

    let local_now = parse_local(&wa_location.localtime)?;

    let mut hourly = Vec::with_capacity(MAX_HOURLY);
    'days: for day in &forecast.forecastday {
        for hour in &day.hour {
            if hourly.len() == MAX_HOURLY {
                break 'days;
            }
            let Ok(at) = parse_local(&hour.time) else {
                tracing::debug!(time = %hour.time, "skipping hour with unparseable time");
                continue;
            };
            if at < local_now {
                continue;
            }
            hourly.push(HourlyForecast {
                time: at.format("%-I %p").to_string(),
                datetime: hour.time.clone(),
                temp_c: round_half_up(hour.temp_c),
                description: hour.condition.text.clone(),
                icon: hour.condition.icon.clone(),
            });
        }
    }

    let daily = forecast
        .forecastday
        .iter()
        .take(usize::from(MAX_DAILY))
        .map(|day| {
            let label = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d")
                .map(|d| d.format("%a, %b %-d").to_string())
                .map_err(|_| WeatherError::Timestamp(day.date.clone()))?;

            Ok(DailyForecast {
                label,
                date: day.date.clone(),
                high_c: round_half_up(day.day.maxtemp_c),
                low_c: round_half_up(day.day.mintemp_c),
                description: day.day.condition.text.clone(),
                icon: day.day.condition.icon.clone(),
                humidity_pct: day.day.avghumidity,
                chance_of_rain: day.day.daily_chance_of_rain.unwrap_or(0),
                wind_kph: round_half_up(day.day.maxwind_kph),
            })
        })
        .collect::<Result<Vec<_>, WeatherError>>()?;

    let current = CurrentConditions {
        temp_c: round_half_up(current.temp_c),
        feels_like_c: round_half_up(current.feelslike_c),
        description: current.condition.text,
        icon: current.condition.icon,
        humidity_pct: current.humidity,
        pressure_mb: round_half_up(current.pressure_mb),
        wind_kph: round_half_up(current.wind_kph),
        wind_direction: current.wind_dir,
        wind_degree: current.wind_degree,
        air_quality: current.air_quality.and_then(|aq| aq.us_epa_index).unwrap_or(0),
        uv_index: current.uv,
        cloud_cover_pct: current.cloud,
        precipitation_mm: current.precip_mm.unwrap_or(0.0),
        dew_point_c: current.dewpoint_c.map(round_half_up).unwrap_or(0),
        visibility_km: current.vis_km,
    };

    Ok(WeatherSnapshot {
        location: location.clone(),
        fetched_at,
        current,
        astronomy,
        hourly,
        daily,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
