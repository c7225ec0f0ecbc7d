//! Debounced location search.
//!
//! Every query change cancels the pending timer and any in-flight request,
//! then restarts the debounce. Results are committed only when the request
//! that produced them is still the newest one.

use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{model::Location, provider::WeatherProvider};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Location>,
    /// A request for `query` is in flight.
    pub loading: bool,
    /// A timer or request for `query` has not settled yet.
    pub pending: bool,
}

#[derive(Debug, Default)]
struct Inflight {
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl Inflight {
    /// Cancel whatever is outstanding and start a new generation.
    fn supersede(&mut self) -> u64 {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.generation += 1;
        self.generation
    }
}

#[derive(Debug)]
pub struct LocationSearch {
    provider: Arc<dyn WeatherProvider>,
    debounce: Duration,
    inflight: Arc<Mutex<Inflight>>,
    state: Arc<watch::Sender<SearchState>>,
}

impl LocationSearch {
    pub fn new(provider: Arc<dyn WeatherProvider>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            provider,
            debounce,
            inflight: Arc::new(Mutex::new(Inflight::default())),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Record a new query. Must be called from within a tokio runtime.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let mut inflight = self.inflight.lock();
        let generation = inflight.supersede();

        if query.trim().is_empty() {
            self.state.send_modify(|s| {
                s.query = query;
                s.results.clear();
                s.loading = false;
                s.pending = false;
            });
            return;
        }

        let token = CancellationToken::new();
        inflight.cancel = Some(token.clone());

        self.state.send_modify(|s| {
            s.query = query.clone();
            s.pending = true;
        });

        let provider = Arc::clone(&self.provider);
        let debounce = self.debounce;
        let shared = Arc::clone(&self.inflight);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }

            {
                let current = shared.lock();
                if current.generation != generation || token.is_cancelled() {
                    return;
                }
                state.send_if_modified(|s| {
                    let changed = !s.loading;
                    s.loading = true;
                    changed
                });
            }

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                outcome = provider.search_locations(&query) => outcome,
            };

            let results = outcome.unwrap_or_else(|e| {
                tracing::warn!(query = %query, error = %e, "location search failed");
                Vec::new()
            });

            // Compare under the same lock `set_query` uses to bump the generation.
            let current = shared.lock();
            if current.generation != generation || token.is_cancelled() {
                tracing::debug!(query = %query, "dropping superseded search results");
                return;
            }
            state.send_modify(|s| {
                s.results = results;
                s.loading = false;
                s.pending = false;
            });
        });
    }

    /// Cancel outstanding work and reset query and results.
    pub fn clear(&self) {
        self.inflight.lock().supersede();
        self.state.send_replace(SearchState::default());
    }

    /// Wait until the current query has settled and return the state.
    pub async fn settled(&self) -> SearchState {
        let mut rx = self.subscribe();
        match rx.wait_for(|s| !s.pending).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }
}

impl Drop for LocationSearch {
    fn drop(&mut self) {
        if let Some(token) = self.inflight.lock().cancel.take() {
            token.cancel();
        }
    }
}
