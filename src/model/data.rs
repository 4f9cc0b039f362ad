//! Collected simulation data and key filtering.

use std::collections::btree_map::{self, BTreeMap, Entry};

use serde::{Deserialize, Serialize};

use super::{Dataset, Value};

/// Datasets gathered from one simulation (archive mode) or from many
/// simulations aggregated per key (filter mode).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimData {
    datasets: BTreeMap<String, Dataset>,
}

impl SimData {
    /// Create empty data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to `key`, creating the dataset with `units` if needed.
    ///
    /// Units of an existing dataset are kept.
    pub fn insert_value(&mut self, key: impl Into<String>, units: &str, value: Value) {
        self.datasets
            .entry(key.into())
            .or_insert_with(|| Dataset::new(units))
            .push(value);
    }

    /// Create an empty dataset carrying only units, unless the key exists.
    pub fn insert_units(&mut self, key: impl Into<String>, units: &str) {
        self.datasets
            .entry(key.into())
            .or_insert_with(|| Dataset::new(units));
    }

    /// Insert a complete dataset, replacing any existing one.
    pub fn insert_dataset(&mut self, key: impl Into<String>, dataset: Dataset) {
        self.datasets.insert(key.into(), dataset);
    }

    /// Append every value of `other`, keeping units of existing datasets.
    pub fn merge(&mut self, other: SimData) {
        for (key, dataset) in other {
            match self.datasets.entry(key) {
                Entry::Occupied(mut entry) => entry.get_mut().values.extend(dataset.values),
                Entry::Vacant(entry) => {
                    entry.insert(dataset);
                }
            }
        }
    }

    /// Remove a dataset.
    pub fn remove(&mut self, key: &str) -> Option<Dataset> {
        self.datasets.remove(key)
    }

    /// Get a dataset.
    pub fn get(&self, key: &str) -> Option<&Dataset> {
        self.datasets.get(key)
    }

    /// Whether a dataset exists.
    pub fn contains(&self, key: &str) -> bool {
        self.datasets.contains_key(key)
    }

    /// First value of a dataset, if any.
    pub fn first_value(&self, key: &str) -> Option<&Value> {
        self.datasets.get(key).and_then(|ds| ds.values.first())
    }

    /// Keep only datasets whose key satisfies the predicate.
    pub fn retain<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        self.datasets.retain(|k, _| keep(k));
    }

    /// Iterate datasets in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Dataset> {
        self.datasets.iter()
    }

    /// Dataset keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(|k| k.as_str())
    }

    /// Number of datasets.
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Whether there are no datasets.
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl IntoIterator for SimData {
    type Item = (String, Dataset);
    type IntoIter = btree_map::IntoIter<String, Dataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.datasets.into_iter()
    }
}

impl<'a> IntoIterator for &'a SimData {
    type Item = (&'a String, &'a Dataset);
    type IntoIter = btree_map::Iter<'a, String, Dataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.datasets.iter()
    }
}

/// Which keys to keep while processing simulation files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyFilter {
    /// Keep every key
    #[default]
    All,
    /// Keep only the listed keys
    Include(Vec<String>),
    /// Keep every key except the listed ones
    Exclude(Vec<String>),
}

impl KeyFilter {
    /// Build a filter from include and exclude lists (include wins).
    pub fn from_lists(include: &[String], exclude: &[String]) -> Self {
        if !include.is_empty() {
            KeyFilter::Include(include.to_vec())
        } else if !exclude.is_empty() {
            KeyFilter::Exclude(exclude.to_vec())
        } else {
            KeyFilter::All
        }
    }

    /// Filter accepting exactly one key.
    pub fn only(key: impl Into<String>) -> Self {
        KeyFilter::Include(vec![key.into()])
    }

    /// Whether `key` passes the filter.
    pub fn accepts(&self, key: &str) -> bool {
        match self {
            KeyFilter::All => true,
            KeyFilter::Include(keys) => keys.iter().any(|k| k == key),
            KeyFilter::Exclude(keys) => !keys.iter().any(|k| k == key),
        }
    }
}
