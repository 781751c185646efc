//! Aggregate store: currency code → observations, shared by all workers of a run.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;

use crate::domain::Observation;

/// Append-only, mutex-guarded accumulator.
///
/// Writers hold the lock only for the map mutation. Readers are expected to
/// run after every writer has been joined.
#[derive(Debug, Default)]
pub struct AggregateStore {
    series: Mutex<HashMap<String, Vec<Observation>>>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    // The map is append-only, so a panic in another writer cannot leave it
    // half-updated; keep going with the inner value.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Observation>>> {
        self.series.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an empty series for `code` unless one exists.
    pub fn ensure_key(&self, code: &str) {
        let mut series = self.lock();
        if !series.contains_key(code) {
            series.insert(code.to_string(), Vec::new());
        }
    }

    /// Append an observation, creating its series if missing.
    pub fn append(&self, obs: Observation) {
        self.lock().entry(obs.code.clone()).or_default().push(obs);
    }

    /// Append a batch under a single lock acquisition.
    pub fn extend(&self, observations: impl IntoIterator<Item = Observation>) {
        let mut series = self.lock();
        for obs in observations {
            series.entry(obs.code.clone()).or_default().push(obs);
        }
    }

    /// Number of currency codes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn observation_count(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.lock().keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Observations for one code, ordered by date.
    pub fn series(&self, code: &str) -> Option<Vec<Observation>> {
        let mut obs = self.lock().get(code)?.clone();
        obs.sort_by_key(|o| o.date);
        Some(obs)
    }

    /// Every series, codes ascending and observations by date.
    pub fn sorted_series(&self) -> BTreeMap<String, Vec<Observation>> {
        self.lock()
            .iter()
            .map(|(code, obs)| {
                let mut obs = obs.clone();
                obs.sort_by_key(|o| o.date);
                (code.clone(), obs)
            })
            .collect()
    }

    /// Observations whose `(code, date)` pair was already present.
    pub fn duplicate_count(&self) -> usize {
        self.lock()
            .values()
            .map(|obs| {
                let distinct: HashSet<NaiveDate> = obs.iter().map(|o| o.date).collect();
                obs.len() - distinct.len()
            })
            .sum()
    }
}
