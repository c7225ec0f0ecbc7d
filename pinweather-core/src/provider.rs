use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    error::WeatherError,
    model::{Location, WeatherSnapshot},
    provider::weatherapi::WeatherApiProvider,
};

#[cfg(test)]
pub(crate) mod fake;
pub mod weatherapi;

/// Remote source of locations and forecasts.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Free-text location search. A blank query yields no results.
    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, WeatherError>;

    /// Fetch and normalize the forecast for one location. No retries.
    async fn get_forecast(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError>;
}

/// Construct the WeatherAPI.com provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;

    let provider = WeatherApiProvider::new(api_key)
        .with_base_url(config.base_url())
        .with_forecast_days(config.forecast_days);

    Ok(Arc::new(provider))
}
