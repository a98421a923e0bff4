//! Synonym caches: where finished equivalence classes are persisted.
//!
//! Every class is stored once per member, keyed by the member's upper curie,
//! so a lookup by any identifier returns the whole class.

use crate::curie::{upper_curie, Synonymous};
use crate::partition::Partition;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Key-value store for synonym sets.
pub trait SynonymCache<T> {
    fn get(&self, key: &str) -> Result<Option<BTreeSet<T>>, CacheError>;
    fn set(&mut self, key: &str, value: BTreeSet<T>) -> Result<(), CacheError>;
}

/// Write every class of `partition` into `sink`, once per member.
///
/// Returns the number of keys written.
pub fn dump<T, C>(partition: &Partition<T>, sink: &mut C) -> Result<usize, CacheError>
where
    T: Synonymous,
    C: SynonymCache<T> + ?Sized,
{
    let mut written = 0;
    for class in partition.classes() {
        for member in class {
            sink.set(&upper_curie(&member.cache_key()), class.clone())?;
            written += 1;
        }
    }
    tracing::debug!(
        keys = written,
        classes = partition.class_count(),
        "dumped synonym classes"
    );
    Ok(written)
}

/// Cached synonyms of `member`, or just `member` itself when nothing is
/// cached for it.
pub fn synonyms_for<T, C>(cache: &C, member: &T) -> Result<BTreeSet<T>, CacheError>
where
    T: Synonymous,
    C: SynonymCache<T> + ?Sized,
{
    match cache.get(&upper_curie(&member.cache_key()))? {
        Some(class) => Ok(class),
        None => Ok(BTreeSet::from([member.clone()])),
    }
}

// ============================================================================
// In-memory cache
// ============================================================================

#[derive(Debug, Clone)]
pub struct MemoryCache<T> {
    entries: HashMap<String, BTreeSet<T>>,
}

impl<T> Default for MemoryCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> MemoryCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }
}

impl<T: Clone> SynonymCache<T> for MemoryCache<T> {
    fn get(&self, key: &str) -> Result<Option<BTreeSet<T>>, CacheError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: BTreeSet<T>) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

// ============================================================================
// JSON file cache
// ============================================================================

/// Cache held in memory and persisted as one JSON object on `flush`.
#[derive(Debug)]
pub struct JsonFileCache<T: Ord> {
    path: PathBuf,
    entries: BTreeMap<String, BTreeSet<T>>,
    dirty: bool,
}

impl<T> JsonFileCache<T>
where
    T: Ord + Clone + Serialize + DeserializeOwned,
{
    /// Open the cache at `path`, loading it when the file already exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every distinct class held by the cache, once each.
    ///
    /// Merging these back into a [`Partition`] before new groups arrive lets
    /// a later run extend the classes of an earlier one.
    pub fn classes(&self) -> Vec<BTreeSet<T>> {
        let distinct: BTreeSet<&BTreeSet<T>> = self.entries.values().collect();
        distinct.into_iter().cloned().collect()
    }

    /// Persist pending writes. Writes go to a sibling temp file first and are
    /// renamed into place.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.entries)?)?;
        fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), keys = self.entries.len(), "flushed synonym cache");
        Ok(())
    }
}

impl<T> SynonymCache<T> for JsonFileCache<T>
where
    T: Ord + Clone + Serialize + DeserializeOwned,
{
    fn get(&self, key: &str) -> Result<Option<BTreeSet<T>>, CacheError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: BTreeSet<T>) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }
}
