//! Shared result table
//!
//! Entries are created by the discovery handler and completed by the merge
//! handler of the child job that shares their key. Writers always target
//! distinct keys; the mutex only serializes the table's structural operations.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ordered `language -> share` pairs, serialized as a JSON object
///
/// Keeps the order in which the repository page lists its languages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageStats {
    pairs: Vec<(String, String)>,
}

impl LanguageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs even offsets with the following odd offset
    ///
    /// A trailing unpaired value is dropped. A repeated name keeps its first
    /// position and takes the later value.
    ///
    /// # Example
    ///
    /// ```
    /// use gitfan::output::LanguageStats;
    ///
    /// let stats = LanguageStats::from_flat(vec![
    ///     "Go".to_string(), "80.0".to_string(),
    ///     "Rust".to_string(), "20.0".to_string(),
    /// ]);
    /// assert_eq!(stats.get("Rust"), Some("20.0"));
    /// ```
    pub fn from_flat(values: Vec<String>) -> Self {
        let mut stats = Self::new();
        let mut values = values.into_iter();
        while let (Some(name), Some(share)) = (values.next(), values.next()) {
            stats.insert(name, share);
        }
        stats
    }

    /// Sets `name` to `share`, replacing any previous value
    pub fn insert(&mut self, name: String, share: String) {
        match self.pairs.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, value)) => *value = share,
            None => self.pairs.push((name, share)),
        }
    }

    /// Folds every pair of `other` into `self`
    pub fn merge(&mut self, other: LanguageStats) {
        for (name, share) in other.pairs {
            self.insert(name, share);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, share)| share.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, s)| (n.as_str(), s.as_str()))
    }
}

impl Serialize for LanguageStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (name, share) in &self.pairs {
            map.serialize_entry(name, share)?;
        }
        map.end()
    }
}

/// Per-repository details
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extra {
    pub owner: String,

    /// Absent until the repository's own job has completed successfully
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_stats: Option<LanguageStats>,
}

/// One discovered repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultEntry {
    pub url: String,
    pub extra: Extra,
}

impl ResultEntry {
    pub fn new(url: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extra: Extra {
                owner: owner.into(),
                language_stats: None,
            },
        }
    }
}

#[derive(Default)]
struct TableInner {
    index: HashMap<String, usize>,
    entries: Vec<ResultEntry>,
}

/// Concurrent map from job id to result entry, in discovery order
#[derive(Default)]
pub struct ResultTable {
    inner: Mutex<TableInner>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TableInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts `entry` under `key` unless the key is already present
    ///
    /// Returns true if the entry was inserted.
    pub fn insert_if_absent(&self, key: &str, entry: ResultEntry) -> bool {
        let mut inner = self.lock();
        if inner.index.contains_key(key) {
            return false;
        }

        let position = inner.entries.len();
        inner.entries.push(entry);
        inner.index.insert(key.to_string(), position);
        true
    }

    /// Merges `stats` into the language stats of entry `key`
    ///
    /// Returns false if no entry has that key.
    pub fn merge_language_stats(&self, key: &str, stats: LanguageStats) -> bool {
        let mut inner = self.lock();
        let Some(&position) = inner.index.get(key) else {
            return false;
        };

        let extra = &mut inner.entries[position].extra;
        match extra.language_stats.as_mut() {
            Some(existing) => existing.merge(stats),
            None => extra.language_stats = Some(stats),
        }
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<ResultEntry> {
        let inner = self.lock();
        inner
            .index
            .get(key)
            .map(|&position| inner.entries[position].clone())
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies every entry out, in discovery order
    pub fn entries(&self) -> Vec<ResultEntry> {
        self.lock().entries.clone()
    }
}
