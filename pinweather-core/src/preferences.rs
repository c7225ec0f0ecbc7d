//! Persisted user preferences and per-location card state.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    error::StoreError,
    store::{self, CARDS_KEY, PREFERENCES_KEY, Store},
    units::TemperatureUnit,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    Stacked,
    SideBySide,
}

impl LayoutMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Stacked => Self::SideBySide,
            Self::SideBySide => Self::Stacked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    #[default]
    Hourly,
    Daily,
}

impl ForecastMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Hourly => Self::Daily,
            Self::Daily => Self::Hourly,
        }
    }
}

/// Scalar display preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
    #[serde(default)]
    pub layout: LayoutMode,
}

impl Preferences {
    pub fn load(store: &dyn Store) -> Self {
        store::load_json(store, PREFERENCES_KEY).unwrap_or_default()
    }

    pub fn save(&self, store: &dyn Store) -> Result<(), StoreError> {
        store::save_json(store, PREFERENCES_KEY, self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct CardMaps {
    #[serde(default)]
    collapsed: BTreeMap<String, bool>,
    #[serde(default)]
    forecast_mode: BTreeMap<String, ForecastMode>,
}

/// Collapsed flag and forecast mode per location key.
#[derive(Debug)]
pub struct CardStates {
    store: Arc<dyn Store>,
    maps: CardMaps,
}

impl CardStates {
    pub fn load(store: Arc<dyn Store>) -> Self {
        let maps = store::load_json(store.as_ref(), CARDS_KEY).unwrap_or_default();
        Self { store, maps }
    }

    pub fn is_collapsed(&self, key: &str) -> bool {
        self.maps.collapsed.get(key).copied().unwrap_or(false)
    }

    pub fn set_collapsed(&mut self, key: &str, collapsed: bool) -> Result<(), StoreError> {
        let mut next = self.maps.clone();
        next.collapsed.insert(key.to_string(), collapsed);
        self.commit(next)
    }

    pub fn toggle_collapsed(&mut self, key: &str) -> Result<bool, StoreError> {
        let collapsed = !self.is_collapsed(key);
        self.set_collapsed(key, collapsed)?;
        Ok(collapsed)
    }

    pub fn forecast_mode(&self, key: &str) -> ForecastMode {
        self.maps.forecast_mode.get(key).copied().unwrap_or_default()
    }

    pub fn set_forecast_mode(&mut self, key: &str, mode: ForecastMode) -> Result<(), StoreError> {
        let mut next = self.maps.clone();
        next.forecast_mode.insert(key.to_string(), mode);
        self.commit(next)
    }

    pub fn toggle_forecast_mode(&mut self, key: &str) -> Result<ForecastMode, StoreError> {
        let mode = self.forecast_mode(key).toggle();
        self.set_forecast_mode(key, mode)?;
        Ok(mode)
    }

    /// Drop all state for a location, e.g. after it was unpinned.
    pub fn forget(&mut self, key: &str) -> Result<(), StoreError> {
        let mut next = self.maps.clone();
        let had_collapsed = next.collapsed.remove(key).is_some();
        let had_mode = next.forecast_mode.remove(key).is_some();
        if had_collapsed || had_mode {
            self.commit(next)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove(CARDS_KEY)?;
        self.maps = CardMaps::default();
        Ok(())
    }

    fn commit(&mut self, next: CardMaps) -> Result<(), StoreError> {
        store::save_json(self.store.as_ref(), CARDS_KEY, &next)?;
        self.maps = next;
        Ok(())
    }
}
