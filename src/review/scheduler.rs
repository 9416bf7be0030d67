//! Review scheduler: applies feedback and picks items to review

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rand::Rng;

use super::algorithm::{apply_feedback, select_indices};
use super::models::{clamp_weight, Feedback, ItemKey, ItemState};
use super::stats::{self, ReviewStats};
use super::storage::ItemStateStore;
use crate::error::{Result, ReviewError};

/// Owns the item state store and serializes every read-modify-persist cycle
///
/// Construct once per process and share by reference (or `Arc`).
pub struct Scheduler {
    store: Mutex<ItemStateStore>,
}

impl Scheduler {
    pub fn new(store: ItemStateStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Open the state file at `path`; an unreadable file yields an empty store
    pub fn open(path: PathBuf) -> Self {
        Self::new(ItemStateStore::open(path))
    }

    fn lock(&self) -> MutexGuard<'_, ItemStateStore> {
        // States are plain values, a panic elsewhere cannot leave them half-written
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state of an item (defaults if never seen)
    pub fn state(&self, key: &ItemKey) -> ItemState {
        self.lock().get(key)
    }

    pub fn weight(&self, key: &ItemKey) -> f64 {
        self.state(key).weight
    }

    /// Track newly discovered items, persisting only if any were new
    pub fn register_items(&self, keys: &[ItemKey]) -> Result<usize> {
        let mut store = self.lock();
        let added = store.observe(keys);
        if added > 0 {
            store.save()?;
            log::info!("Registered {} new items", added);
        }
        Ok(added)
    }

    /// Record feedback reviewed now
    ///
    /// Not idempotent: every call moves the weight and review time again, so
    /// callers must not blindly retry after an ambiguous failure.
    pub fn record_feedback(&self, key: &ItemKey, feedback: impl Into<Feedback>) -> Result<ItemState> {
        self.record_feedback_at(key, feedback, Utc::now())
    }

    /// Record feedback reviewed at `now`
    ///
    /// On a persistence error the in-memory state already holds the update.
    pub fn record_feedback_at(
        &self,
        key: &ItemKey,
        feedback: impl Into<Feedback>,
        now: DateTime<Utc>,
    ) -> Result<ItemState> {
        let feedback = feedback.into();
        let mut store = self.lock();

        let previous = store.get(key);
        let updated = apply_feedback(&previous, feedback, now);
        store.put(key.clone(), updated);
        store.save()?;

        log::info!(
            "Recorded {} for {}: weight {:.4} -> {:.4}, interval {:.2} -> {:.2} days",
            feedback,
            key,
            previous.weight,
            updated.weight,
            previous.interval,
            updated.interval
        );
        Ok(updated)
    }

    /// Overwrite only the weight of an item, leaving its review timing alone
    pub fn set_weight(&self, key: &ItemKey, weight: f64) -> Result<ItemState> {
        if !weight.is_finite() {
            return Err(ReviewError::InvalidWeight(weight));
        }

        let mut store = self.lock();
        let mut state = store.get(key);
        state.weight = clamp_weight(weight);
        store.put(key.clone(), state);
        store.save()?;

        log::info!("Set weight of {} to {:.4}", key, state.weight);
        Ok(state)
    }

    /// Pick up to `count` distinct items to review now
    pub fn select_for_review(&self, keys: &[ItemKey], count: usize) -> Vec<ItemKey> {
        self.select_for_review_with(keys, count, Utc::now(), &mut rand::thread_rng())
    }

    /// Pick up to `count` distinct items as of `now`, drawing from `rng`
    pub fn select_for_review_with<R: Rng + ?Sized>(
        &self,
        keys: &[ItemKey],
        count: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<ItemKey> {
        if keys.is_empty() {
            return Vec::new();
        }

        let states: Vec<ItemState> = {
            let store = self.lock();
            keys.iter().map(|key| store.get(key)).collect()
        };

        let selected: Vec<ItemKey> = select_indices(&states, count, now, rng)
            .into_iter()
            .map(|i| keys[i].clone())
            .collect();

        log::debug!("Selected {} of {} items for review", selected.len(), keys.len());
        selected
    }

    /// Keys ordered by weight, least familiar first
    pub fn rank_by_weight(&self, keys: &[ItemKey]) -> Vec<(ItemKey, ItemState)> {
        let store = self.lock();
        let mut ranked: Vec<(ItemKey, ItemState)> =
            keys.iter().map(|key| (key.clone(), store.get(key))).collect();
        ranked.sort_by(|a, b| b.1.weight.total_cmp(&a.1.weight));
        ranked
    }

    pub fn stats(&self, keys: &[ItemKey]) -> ReviewStats {
        let store = self.lock();
        stats::compute(keys.iter().map(|key| (key, store.get(key))))
    }

    /// Display name recorded for an encoded collection id
    pub fn collection_name(&self, code: &str) -> Option<String> {
        self.lock().collection_name(code).map(str::to_string)
    }

    /// Encoded id recorded for a collection name
    pub fn collection_code(&self, name: &str) -> Option<String> {
        self.lock().collection_code(name).map(str::to_string)
    }

    pub fn is_tracked(&self, key: &ItemKey) -> bool {
        self.lock().contains(key)
    }

    /// Every key with stored state in one collection, present on disk or not
    pub fn tracked_keys(&self, collection: &str) -> Vec<ItemKey> {
        self.lock().keys_in_collection(collection)
    }
}
