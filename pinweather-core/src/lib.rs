//! Core library for the `pinweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The WeatherAPI.com provider and forecast normalization
//! - Debounced location search
//! - Pinned locations, preferences and their persistence
//! - Selection, refresh and auto-refresh over the dashboard state
//! - Condition, temperature and time-of-day classification
//!
//! It is used by `pinweather-cli`, but has no terminal dependencies of its own.

pub mod classify;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod pinned;
pub mod preferences;
pub mod provider;
pub mod refresh;
pub mod search;
pub mod store;
pub mod units;

pub use classify::{ConditionCategory, DayPeriod, TemperatureBand, WeatherIcon};
pub use config::Config;
pub use dashboard::{Dashboard, RefreshSummary};
pub use error::{PinError, StoreError, WeatherError};
pub use model::{Location, WeatherSnapshot};
pub use preferences::{ForecastMode, LayoutMode, Preferences, Theme};
pub use provider::{WeatherProvider, provider_from_config, weatherapi::WeatherApiProvider};
pub use refresh::{AutoRefresh, spawn_auto_refresh};
pub use search::{LocationSearch, SearchState};
pub use store::{FileStore, MemoryStore, Store};
pub use units::TemperatureUnit;
