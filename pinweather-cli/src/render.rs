//! Plain-text rendering of weather cards.

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use pinweather_core::{
    ConditionCategory, DayPeriod, ForecastMode, Location, Preferences, TemperatureBand,
    WeatherIcon, WeatherSnapshot, preferences::CardStates,
};

pub fn location_line(index: usize, location: &Location) -> String {
    format!("{:>2}. {}  ({:.2}, {:.2})", index + 1, location.label(), location.lat, location.lon)
}

pub fn last_refresh(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => format!("Updated {}", at.with_timezone(&Local).format("%H:%M")),
        None => "Not refreshed yet".to_string(),
    }
}

/// Lay two rendered cards out in columns.
pub fn side_by_side(left: &str, right: &str) -> String {
    let width = left.lines().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
    let mut lhs = left.lines();
    let mut rhs = right.lines();
    let mut out = String::new();

    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => break,
            (l, r) => {
                let l = l.unwrap_or("");
                let pad = width.saturating_sub(l.chars().count());
                let _ = writeln!(out, "{l}{:pad$}{}", "", r.unwrap_or("").trim_end());
            }
        }
    }
    out
}

pub fn card(snapshot: &WeatherSnapshot, prefs: &Preferences, cards: Option<&CardStates>) -> String {
    let key = snapshot.key();
    let collapsed = cards.is_some_and(|c| c.is_collapsed(&key));
    let mode = cards.map(|c| c.forecast_mode(&key)).unwrap_or_default();
    let unit = prefs.temperature_unit;
    let current = &snapshot.current;
    let astro = &snapshot.astronomy;

    let icon = WeatherIcon::from_condition(&current.description, &current.icon);
    let category = ConditionCategory::from_description(&current.description);
    let band = TemperatureBand::from_celsius(f64::from(current.temp_c));
    let period = DayPeriod::classify(&astro.local_time, &astro.sunrise, &astro.sunset);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}  {}  {}",
        icon.glyph(),
        key,
        unit.format_temperature(current.temp_c),
        current.description
    );
    let _ = writeln!(
        out,
        "   {} · {} · {} · local time {}",
        category.as_str(),
        band.css_class().trim_start_matches("temp-"),
        period.css_class().trim_start_matches("time-"),
        astro.local_time
    );
    if collapsed {
        return out;
    }

    let _ = writeln!(out, "   Feels like     {}", unit.format_temperature(current.feels_like_c));
    let _ = writeln!(out, "   Humidity       {}%", current.humidity_pct);
    let _ = writeln!(
        out,
        "   Wind           {} {}",
        unit.format_wind_speed(current.wind_kph),
        current.wind_direction
    );
    let _ = writeln!(out, "   Visibility     {}", unit.format_visibility(current.visibility_km));
    let _ = writeln!(out, "   UV index       {}", current.uv_index);
    let _ = writeln!(out, "   Cloud cover    {}%", current.cloud_cover_pct);
    let _ = writeln!(out, "   Precipitation  {}", unit.format_precipitation(current.precipitation_mm));
    if current.air_quality > 0 {
        let _ = writeln!(out, "   Air quality    {} (US EPA)", current.air_quality);
    }
    let _ = writeln!(
        out,
        "   Sun            {} / {}   Moon {}",
        astro.sunrise, astro.sunset, astro.moon_phase
    );

    match mode {
        ForecastMode::Hourly => {
            let _ = writeln!(out, "   24-hour forecast");
            for hour in &snapshot.hourly {
                let glyph = WeatherIcon::from_condition(&hour.description, &hour.icon).glyph();
                let period = DayPeriod::classify(&hour.datetime, &astro.sunrise, &astro.sunset);
                let _ = writeln!(
                    out,
                    "     {:>5}  {} {:>6}  {:<5}  {}",
                    hour.time,
                    glyph,
                    unit.format_temperature(hour.temp_c),
                    period.css_class().trim_start_matches("time-"),
                    hour.description
                );
            }
        }
        ForecastMode::Daily => {
            let _ = writeln!(out, "   {}-day forecast", snapshot.daily.len());
            for day in &snapshot.daily {
                let glyph = WeatherIcon::from_condition(&day.description, &day.icon).glyph();
                let _ = writeln!(
                    out,
                    "     {:<11} {} {:>6} / {:>6}  rain {:>3}%  {}",
                    day.label,
                    glyph,
                    unit.format_temperature(day.high_c),
                    unit.format_temperature(day.low_c),
                    day.chance_of_rain,
                    day.description
                );
            }
        }
    }
    out
}
