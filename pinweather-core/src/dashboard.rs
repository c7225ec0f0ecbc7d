//! Application state: the active selection, pinned locations and their
//! cached snapshots.
//!
//! Network I/O never happens while the state is borrowed mutably by more than
//! one caller: a refresh is captured as a [`RefreshPlan`], executed without
//! touching the dashboard, and committed with [`Dashboard::apply_refresh`].

use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::task::JoinSet;

use crate::{
    error::{PinError, StoreError, WeatherError},
    model::{Location, WeatherSnapshot},
    pinned::PinnedLocations,
    preferences::{CardStates, Preferences},
    provider::WeatherProvider,
    store::Store,
};

pub const SELECTION_ERROR: &str = "Failed to load weather data. Please try again.";

/// Proof that a selection was started; finishing a stale ticket is a no-op.
#[derive(Debug, Clone)]
pub struct SelectTicket {
    generation: u64,
    location: Location,
}

impl SelectTicket {
    pub fn location(&self) -> &Location {
        &self.location
    }
}

#[derive(Debug)]
pub struct Dashboard {
    provider: Arc<dyn WeatherProvider>,
    store: Arc<dyn Store>,
    pinned: PinnedLocations,
    cards: CardStates,
    preferences: Preferences,
    selection: Option<Location>,
    selection_snapshot: Option<WeatherSnapshot>,
    selection_generation: u64,
    snapshots: HashMap<String, WeatherSnapshot>,
    loading: bool,
    error: Option<String>,
    last_refresh: Option<DateTime<Utc>>,
}

impl Dashboard {
    /// Build the dashboard, reading persisted state from `store`.
    pub fn load(provider: Arc<dyn WeatherProvider>, store: Arc<dyn Store>) -> Self {
        let pinned = PinnedLocations::load(Arc::clone(&store));
        let cards = CardStates::load(Arc::clone(&store));
        let preferences = Preferences::load(store.as_ref());

        Self {
            provider,
            store,
            pinned,
            cards,
            preferences,
            selection: None,
            selection_snapshot: None,
            selection_generation: 0,
            snapshots: HashMap::new(),
            loading: false,
            error: None,
            last_refresh: None,
        }
    }

    pub fn provider(&self) -> Arc<dyn WeatherProvider> {
        Arc::clone(&self.provider)
    }

    pub fn pinned(&self) -> &PinnedLocations {
        &self.pinned
    }

    pub fn cards(&self) -> &CardStates {
        &self.cards
    }

    pub fn cards_mut(&mut self) -> &mut CardStates {
        &mut self.cards
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn set_preferences(&mut self, preferences: Preferences) -> Result<(), StoreError> {
        self.preferences = preferences;
        preferences.save(self.store.as_ref())
    }

    pub fn selection(&self) -> Option<&Location> {
        self.selection.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// User-facing error from the last selection attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    pub fn snapshot(&self, key: &str) -> Option<&WeatherSnapshot> {
        self.snapshots.get(key)
    }

    /// Pinned locations in order, each with its cached snapshot if loaded.
    pub fn pinned_cards(&self) -> impl Iterator<Item = (&Location, Option<&WeatherSnapshot>)> {
        self.pinned.iter().map(|loc| (loc, self.snapshots.get(&loc.key())))
    }

    /// The selection's snapshot, unless it is still loading or already shown as a pin.
    pub fn selection_card(&self) -> Option<&WeatherSnapshot> {
        if self.loading {
            return None;
        }
        self.selection_snapshot.as_ref().filter(|snap| !self.pinned.is_pinned(&snap.key()))
    }

    // ---- selection ----

    pub fn begin_select(&mut self, location: Location) -> SelectTicket {
        self.selection_generation += 1;
        self.loading = true;
        self.error = None;
        SelectTicket { generation: self.selection_generation, location }
    }

    /// Commit a selection result. Returns `false` when a newer selection
    /// started in the meantime and the result was ignored.
    pub fn finish_select(
        &mut self,
        ticket: SelectTicket,
        result: &Result<WeatherSnapshot, WeatherError>,
    ) -> bool {
        if ticket.generation != self.selection_generation {
            tracing::debug!(location = %ticket.location.key(), "ignoring superseded selection");
            return false;
        }
        self.loading = false;

        match result {
            Ok(snapshot) => {
                self.selection = Some(ticket.location);
                self.selection_snapshot = Some(snapshot.clone());
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(location = %ticket.location.key(), error = %e, "failed to load weather");
                self.error = Some(SELECTION_ERROR.to_string());
            }
        }
        true
    }

    /// Fetch weather for `location` and make it the active selection.
    pub async fn select(&mut self, location: Location) -> Result<&WeatherSnapshot, WeatherError> {
        let ticket = self.begin_select(location);
        let result = self.provider.get_forecast(ticket.location()).await;
        self.finish_select(ticket, &result);

        result?;
        self.selection_snapshot.as_ref().ok_or(WeatherError::MissingData("selection"))
    }

    // ---- pins ----

    pub fn is_pinned(&self, key: &str) -> bool {
        self.pinned.is_pinned(key)
    }

    /// Pin a location. Returns `false` if it was already pinned.
    pub fn pin(&mut self, location: Location) -> Result<bool, StoreError> {
        let key = location.key();
        if !self.pinned.pin(location)? {
            return Ok(false);
        }
        if let Some(snap) = self.selection_snapshot.as_ref().filter(|s| s.key() == key) {
            self.snapshots.insert(key, snap.clone());
        }
        Ok(true)
    }

    /// Pin the active selection, if any.
    pub fn pin_selection(&mut self) -> Result<bool, StoreError> {
        match self.selection.clone() {
            Some(location) => self.pin(location),
            None => Ok(false),
        }
    }

    /// Unpin by key, dropping its cached snapshot and card state.
    pub fn unpin(&mut self, key: &str) -> Result<bool, StoreError> {
        if !self.pinned.unpin(key)? {
            return Ok(false);
        }
        self.snapshots.remove(key);
        self.cards.forget(key)?;
        Ok(true)
    }

    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), PinError> {
        self.pinned.reorder(from, to)
    }

    pub fn clear_pinned(&mut self) -> Result<(), StoreError> {
        self.pinned.clear()?;
        self.snapshots.clear();
        self.cards.clear()
    }

    // ---- refresh ----

    /// Capture everything a refresh needs without holding on to `self`.
    pub fn refresh_plan(&self) -> RefreshPlan {
        RefreshPlan {
            provider: Arc::clone(&self.provider),
            selection: self.selection.clone().map(|loc| (self.selection_generation, loc)),
            pinned: self.pinned.locations().to_vec(),
        }
    }

    /// Commit a finished refresh in one step.
    pub fn apply_refresh(&mut self, outcome: RefreshOutcome) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        if let Some((generation, key, result)) = outcome.selection {
            match result {
                Ok(snap) if generation == self.selection_generation => {
                    self.selection_snapshot = Some(snap);
                    summary.refreshed += 1;
                }
                Ok(_) => tracing::debug!(location = %key, "selection changed during refresh"),
                Err(e) => {
                    tracing::warn!(location = %key, error = %e, "failed to refresh current weather");
                    summary.failed.push(key);
                }
            }
        }

        let mut fresh: HashMap<String, WeatherSnapshot> = HashMap::new();
        for (key, result) in outcome.pinned {
            match result {
                Ok(snap) => {
                    fresh.insert(key, snap);
                }
                Err(e) => {
                    tracing::warn!(location = %key, error = %e, "failed to refresh pinned weather");
                    summary.failed.push(key);
                }
            }
        }

        let mut next = HashMap::with_capacity(self.pinned.len());
        for loc in self.pinned.iter() {
            let key = loc.key();
            if let Some(snap) = fresh.remove(&key) {
                summary.refreshed += 1;
                next.insert(key, snap);
            } else if let Some(stale) = self.snapshots.remove(&key) {
                next.insert(key, stale);
            }
        }
        self.snapshots = next;
        self.last_refresh = Some(Utc::now());
        summary
    }

    /// Refresh the selection and all pinned locations concurrently.
    pub async fn refresh_all(&mut self) -> RefreshSummary {
        let outcome = self.refresh_plan().run().await;
        self.apply_refresh(outcome)
    }
}

/// Locations to refresh, detached from the dashboard.
#[derive(Debug, Clone)]
pub struct RefreshPlan {
    provider: Arc<dyn WeatherProvider>,
    selection: Option<(u64, Location)>,
    pinned: Vec<Location>,
}

impl RefreshPlan {
    pub fn is_empty(&self) -> bool {
        self.selection.is_none() && self.pinned.is_empty()
    }

    /// Fetch every location concurrently; one failure never blocks the others.
    pub async fn run(self) -> RefreshOutcome {
        let mut tasks = JoinSet::new();

        if let Some((generation, location)) = self.selection {
            let provider = Arc::clone(&self.provider);
            tasks.spawn(async move {
                let result = provider.get_forecast(&location).await;
                (Slot::Selection(generation), location.key(), result)
            });
        }
        for (index, location) in self.pinned.into_iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            tasks.spawn(async move {
                let result = provider.get_forecast(&location).await;
                (Slot::Pinned(index), location.key(), result)
            });
        }

        let mut selection = None;
        let mut pinned = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((Slot::Selection(generation), key, result)) => {
                    selection = Some((generation, key, result));
                }
                Ok((Slot::Pinned(index), key, result)) => pinned.push((index, key, result)),
                Err(e) => tracing::error!(error = %e, "weather fetch task failed"),
            }
        }
        pinned.sort_by_key(|(index, _, _)| *index);

        RefreshOutcome {
            selection,
            pinned: pinned.into_iter().map(|(_, key, result)| (key, result)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Selection(u64),
    Pinned(usize),
}

/// Per-location results of a [`RefreshPlan`].
#[derive(Debug)]
pub struct RefreshOutcome {
    selection: Option<(u64, String, Result<WeatherSnapshot, WeatherError>)>,
    pinned: Vec<(String, Result<WeatherSnapshot, WeatherError>)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    /// Keys whose fetch failed; their previous snapshot was kept.
    pub failed: Vec<String>,
}
