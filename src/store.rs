//! In-memory mapping from filename keys to canonical marketplace URLs.
//!
//! Entries keep insertion order; the fuzzy matcher breaks ties by that order.
//! Every mutation is saved through the injected [`MappingPersistence`] before
//! it becomes visible in memory, so a failed save leaves the store untouched.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::model::{CatalogError, LearnOutcome, MappingEntry, MergeReport};
use crate::storage::MappingPersistence;

pub struct MappingStore<P: MappingPersistence> {
    entries: Vec<MappingEntry>,
    index: HashMap<String, usize>,
    persistence: P,
}

impl<P: MappingPersistence> MappingStore<P> {
    /// Loads the persisted mapping. Duplicate keys in the backing data keep
    /// the last URL at the position of the first occurrence.
    pub fn open(persistence: P) -> Result<Self, CatalogError> {
        let loaded = persistence.load()?;
        let mut entries: Vec<MappingEntry> = Vec::with_capacity(loaded.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(loaded.len());
        for entry in loaded {
            match index.get(&entry.key) {
                Some(&i) => entries[i] = entry,
                None => {
                    index.insert(entry.key.clone(), entries.len());
                    entries.push(entry);
                }
            }
        }
        info!("Mapping store opened with {} entries", entries.len());
        Ok(Self {
            entries,
            index,
            persistence,
        })
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].url.as_str())
    }

    /// `(key, url)` pairs in insertion order.
    pub fn all(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|e| (e.key.as_str(), e.url.as_str()))
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Upserts one mapping. Relearning an identical pair writes nothing.
    pub fn learn(&mut self, key: &str, url: &str) -> Result<LearnOutcome, CatalogError> {
        let key = require_non_empty("key", key)?;
        let url = require_non_empty("url", url)?;

        if self.lookup(key) == Some(url) {
            debug!("Mapping '{}' already points at {}", key, url);
            return Ok(LearnOutcome::Unchanged);
        }

        let mut next = self.entries.clone();
        let outcome = match self.index.get(key) {
            Some(&i) => {
                next[i] = MappingEntry::new(key, url);
                LearnOutcome::Updated
            }
            None => {
                next.push(MappingEntry::new(key, url));
                LearnOutcome::Inserted
            }
        };

        self.commit(next)?;
        info!("Learned mapping '{}' -> {} ({:?})", key, url, outcome);
        Ok(outcome)
    }

    /// Inserts only keys the store does not know yet. Existing keys, and keys
    /// repeated within the batch, are counted as skipped and never overwritten.
    pub fn bulk_merge<I, K, U>(&mut self, batch: I) -> Result<MergeReport, CatalogError>
    where
        I: IntoIterator<Item = (K, U)>,
        K: Into<String>,
        U: Into<String>,
    {
        let mut next = self.entries.clone();
        let mut known: HashMap<String, usize> = self.index.clone();
        let mut report = MergeReport::default();

        for (key, url) in batch {
            let key: String = key.into();
            let url: String = url.into();
            if key.trim().is_empty() || url.trim().is_empty() {
                return Err(CatalogError::InvalidInput(format!(
                    "bulk merge entry with empty key or url: '{key}' -> '{url}'"
                )));
            }
            if known.contains_key(&key) {
                report.skipped += 1;
                continue;
            }
            known.insert(key.clone(), next.len());
            next.push(MappingEntry::new(key, url));
            report.added += 1;
        }

        if report.added > 0 {
            self.commit(next)?;
        }
        info!(
            "Bulk merge finished: {} added, {} skipped",
            report.added, report.skipped
        );
        Ok(report)
    }

    /// Removes one mapping. Returns `false` when the key was unknown.
    pub fn forget(&mut self, key: &str) -> Result<bool, CatalogError> {
        let Some(&i) = self.index.get(key) else {
            return Ok(false);
        };
        let mut next = self.entries.clone();
        next.remove(i);
        self.commit(next)?;
        info!("Forgot mapping '{}'", key);
        Ok(true)
    }

    /// Drops every mapping and returns how many were removed.
    pub fn reset(&mut self) -> Result<usize, CatalogError> {
        let removed = self.entries.len();
        if removed == 0 {
            return Ok(0);
        }
        self.commit(Vec::new())?;
        info!("Mapping store reset, {} entries removed", removed);
        Ok(removed)
    }

    fn commit(&mut self, next: Vec<MappingEntry>) -> Result<(), CatalogError> {
        self.persistence.save(&next)?;
        self.index = build_index(&next);
        self.entries = next;
        Ok(())
    }
}

fn build_index(entries: &[MappingEntry]) -> HashMap<String, usize> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.key.clone(), i))
        .collect()
}

fn require_non_empty<'a>(what: &str, value: &'a str) -> Result<&'a str, CatalogError> {
    if value.trim().is_empty() {
        Err(CatalogError::InvalidInput(format!("{what} must not be empty")))
    } else {
        Ok(value)
    }
}
