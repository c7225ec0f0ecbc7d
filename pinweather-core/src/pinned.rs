use serde::Deserialize;
use std::{collections::HashSet, sync::Arc};

use crate::{
    error::{PinError, StoreError},
    model::Location,
    store::{self, PINNED_KEY, Store},
};

/// Stored entry as read back from disk. Older releases pinned whole weather
/// payloads; those carry a `current` object and are rejected.
#[derive(Debug, Deserialize)]
struct StoredLocation {
    #[serde(flatten)]
    location: Location,
    #[serde(default)]
    current: Option<serde_json::Value>,
}

/// Ordered set of user-pinned locations, unique by identity key and written
/// back to the store after every mutation.
#[derive(Debug)]
pub struct PinnedLocations {
    store: Arc<dyn Store>,
    locations: Vec<Location>,
}

impl PinnedLocations {
    /// Load the pinned list, falling back to empty on any shape mismatch.
    pub fn load(store: Arc<dyn Store>) -> Self {
        let stored = store::load_json_with(store.as_ref(), PINNED_KEY, |entries: &Vec<StoredLocation>| {
            entries.iter().all(|e| e.current.is_none())
        })
        .unwrap_or_default();

        let mut seen = HashSet::new();
        let locations: Vec<Location> = stored
            .into_iter()
            .map(|e| e.location)
            .filter(|loc| seen.insert(loc.key()))
            .collect();

        tracing::debug!(count = locations.len(), "loaded pinned locations");
        Self { store, locations }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Location> {
        self.locations.iter().find(|loc| loc.key() == key)
    }

    pub fn is_pinned(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Append `location` unless its key is already pinned. Returns whether it was added.
    pub fn pin(&mut self, location: Location) -> Result<bool, StoreError> {
        if self.is_pinned(&location.key()) {
            return Ok(false);
        }
        let mut next = self.locations.clone();
        next.push(location);
        self.commit(next)?;
        Ok(true)
    }

    /// Remove by identity key. Returns whether anything was removed.
    pub fn unpin(&mut self, key: &str) -> Result<bool, StoreError> {
        if !self.is_pinned(key) {
            return Ok(false);
        }
        let next = self.locations.iter().filter(|loc| loc.key() != key).cloned().collect();
        self.commit(next)?;
        Ok(true)
    }

    /// Move the entry at `from` so that it ends up at index `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), PinError> {
        let len = self.locations.len();
        for index in [from, to] {
            if index >= len {
                return Err(PinError::OutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(());
        }

        let mut next = self.locations.clone();
        let moved = next.remove(from);
        next.insert(to, moved);
        self.commit(next)?;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove(PINNED_KEY)?;
        self.locations.clear();
        Ok(())
    }

    /// Write `next` to the store, then adopt it. A failed write leaves the list untouched.
    fn commit(&mut self, next: Vec<Location>) -> Result<(), StoreError> {
        store::save_json(self.store.as_ref(), PINNED_KEY, &next)?;
        self.locations = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FailingStore, MemoryStore};

    fn loc(name: &str, country: &str) -> Location {
        Location { name: name.into(), country: country.into(), state: None, lat: 1.0, lon: 2.0 }
    }

    fn keys(pinned: &PinnedLocations) -> Vec<String> {
        pinned.iter().map(Location::key).collect()
    }

    fn empty() -> (Arc<MemoryStore>, PinnedLocations) {
        let store = Arc::new(MemoryStore::new());
        let pinned = PinnedLocations::load(store.clone());
        (store, pinned)
    }

    #[test]
    fn pinning_twice_keeps_one_entry() {
        let (_, mut pinned) = empty();

        assert!(pinned.pin(loc("London", "UK")).expect("pin"));
        assert!(!pinned.pin(loc("London", "UK")).expect("pin again"));

        assert_eq!(pinned.len(), 1);
        assert!(pinned.is_pinned("London, UK"));
    }

    #[test]
    fn same_name_in_other_country_is_distinct() {
        let (_, mut pinned) = empty();
        pinned.pin(loc("London", "UK")).expect("pin");
        pinned.pin(loc("London", "Canada")).expect("pin");
        assert_eq!(keys(&pinned), ["London, UK", "London, Canada"]);
    }

    #[test]
    fn unpin_removes_by_key() {
        let (_, mut pinned) = empty();
        pinned.pin(loc("Paris", "France")).expect("pin");
        pinned.pin(loc("Rome", "Italy")).expect("pin");

        assert!(pinned.unpin("Paris, France").expect("unpin"));
        assert!(!pinned.unpin("Paris, France").expect("unpin missing"));
        assert_eq!(keys(&pinned), ["Rome, Italy"]);
    }

    #[test]
    fn reorder_moves_single_entry() {
        let (_, mut pinned) = empty();
        for name in ["A", "B", "C", "D"] {
            pinned.pin(loc(name, "X")).expect("pin");
        }

        pinned.reorder(0, 2).expect("reorder");
        assert_eq!(keys(&pinned), ["B, X", "C, X", "A, X", "D, X"]);

        pinned.reorder(3, 0).expect("reorder");
        assert_eq!(keys(&pinned), ["D, X", "B, X", "C, X", "A, X"]);
    }

    #[test]
    fn reorder_rejects_out_of_range() {
        let (_, mut pinned) = empty();
        pinned.pin(loc("A", "X")).expect("pin");

        let err = pinned.reorder(0, 5).unwrap_err();
        assert!(matches!(err, PinError::OutOfRange { index: 5, len: 1 }));
    }

    #[test]
    fn mutations_persist_and_reload() {
        let (store, mut pinned) = empty();
        pinned.pin(loc("Oslo", "Norway")).expect("pin");
        pinned.pin(loc("Bergen", "Norway")).expect("pin");
        pinned.reorder(1, 0).expect("reorder");

        let reloaded = PinnedLocations::load(store);
        assert_eq!(keys(&reloaded), ["Bergen, Norway", "Oslo, Norway"]);
    }

    #[test]
    fn clear_removes_stored_entry() {
        let (store, mut pinned) = empty();
        pinned.pin(loc("Oslo", "Norway")).expect("pin");
        pinned.clear().expect("clear");

        assert!(pinned.is_empty());
        assert_eq!(store.get(PINNED_KEY).expect("get"), None);
    }

    #[test]
    fn corrupt_storage_falls_back_to_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(PINNED_KEY, "not json at all").expect("set");

        let pinned = PinnedLocations::load(store.clone());
        assert!(pinned.is_empty());
        assert_eq!(store.get(PINNED_KEY).expect("get"), None);
    }

    #[test]
    fn legacy_weather_payloads_are_discarded() {
        let store = Arc::new(MemoryStore::new());
        let legacy = serde_json::json!([{
            "name": "Oslo",
            "country": "Norway",
            "lat": 59.9,
            "lon": 10.7,
            "current": { "temp": 3 }
        }]);
        store.set(PINNED_KEY, &legacy.to_string()).expect("set");

        let pinned = PinnedLocations::load(store.clone());
        assert!(pinned.is_empty());
        assert_eq!(store.get(PINNED_KEY).expect("get"), None);
    }

    #[test]
    fn entries_missing_fields_are_discarded() {
        let store = Arc::new(MemoryStore::new());
        store.set(PINNED_KEY, r#"[{"location": "Oslo, Norway"}]"#).expect("set");

        let pinned = PinnedLocations::load(store);
        assert!(pinned.is_empty());
    }

    #[test]
    fn duplicate_keys_on_disk_keep_first() {
        let store = Arc::new(MemoryStore::new());
        let dupes = serde_json::json!([
            { "name": "Oslo", "country": "Norway", "lat": 1.0, "lon": 1.0 },
            { "name": "Oslo", "country": "Norway", "lat": 2.0, "lon": 2.0 }
        ]);
        store.set(PINNED_KEY, &dupes.to_string()).expect("set");

        let pinned = PinnedLocations::load(store);
        assert_eq!(pinned.len(), 1);
        assert_eq!(pinned.locations()[0].lat, 1.0);
    }

    #[test]
    fn failed_write_leaves_list_unchanged() {
        let store = Arc::new(FailingStore::new());
        let mut pinned = PinnedLocations::load(store.clone());
        pinned.pin(loc("Rome", "Italy")).expect("pin");
        pinned.pin(loc("Oslo", "Norway")).expect("pin");

        store.set_failing(true);
        assert!(pinned.pin(loc("Paris", "France")).is_err());
        assert!(!pinned.is_pinned("Paris, France"));
        assert!(pinned.unpin("Rome, Italy").is_err());
        assert!(pinned.is_pinned("Rome, Italy"));
        assert!(matches!(pinned.reorder(0, 1).unwrap_err(), PinError::Store(_)));
        assert!(pinned.clear().is_err());
        assert_eq!(keys(&pinned), ["Rome, Italy", "Oslo, Norway"]);

        store.set_failing(false);
        assert!(pinned.pin(loc("Paris", "France")).expect("retry pin"));
        let reloaded = PinnedLocations::load(store);
        assert_eq!(keys(&reloaded), ["Rome, Italy", "Oslo, Norway", "Paris, France"]);
    }
}
