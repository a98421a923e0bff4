//! Curie helpers and partition member types.
//!
//! A curie is `PREFIX:localid`. Cache keys are "upper curies": the prefix is
//! upper-cased and the local part is left alone, so `hgnc:1100` and
//! `HGNC:1100` land on the same cache entry.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Prefix of a curie (text before the first `:`), if it has one.
pub fn curie_prefix(id: &str) -> Option<&str> {
    id.split_once(':').map(|(prefix, _)| prefix)
}

/// Local part of a curie (text after the first `:`). Identifiers without a
/// prefix are returned whole.
pub fn curie_local(id: &str) -> &str {
    id.split_once(':').map(|(_, local)| local).unwrap_or(id)
}

/// Canonical cache key form of an identifier.
pub fn upper_curie(id: &str) -> String {
    match id.split_once(':') {
        Some((prefix, local)) => format!("{}:{}", prefix.to_uppercase(), local),
        None => id.to_uppercase(),
    }
}

pub fn make_curie(prefix: &str, local: &str) -> String {
    format!("{prefix}:{local}")
}

// ============================================================================
// Partition members
// ============================================================================

/// Anything that can live in an equivalence class.
///
/// `prefix` drives the unique-prefix check during merges and `cache_key` is
/// the raw key a class is dumped under (before upper-curie normalization).
pub trait Synonymous: Eq + Hash + Ord + Clone {
    fn prefix(&self) -> Option<String>;
    fn cache_key(&self) -> String;
}

impl Synonymous for String {
    fn prefix(&self) -> Option<String> {
        curie_prefix(self).map(str::to_string)
    }

    fn cache_key(&self) -> String {
        self.clone()
    }
}

macro_rules! impl_synonymous_for_int {
    ($($t:ty),*) => {
        $(
            impl Synonymous for $t {
                fn prefix(&self) -> Option<String> {
                    None
                }

                fn cache_key(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_synonymous_for_int!(u32, u64, i32, i64, usize);

/// An identifier with an optional display label.
///
/// Identity (equality, ordering, hashing) is the identifier alone; the label
/// rides along so it survives into the synonym cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledId {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl LabeledId {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            label: None,
        }
    }

    pub fn with_label(identifier: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            label: Some(label.into()),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        curie_prefix(&self.identifier)
    }
}

impl PartialEq for LabeledId {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for LabeledId {}

impl Hash for LabeledId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl PartialOrd for LabeledId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LabeledId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identifier.cmp(&other.identifier)
    }
}

impl fmt::Display for LabeledId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({label})", self.identifier),
            None => f.write_str(&self.identifier),
        }
    }
}

impl From<&str> for LabeledId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Synonymous for LabeledId {
    fn prefix(&self) -> Option<String> {
        curie_prefix(&self.identifier).map(str::to_string)
    }

    fn cache_key(&self) -> String {
        self.identifier.clone()
    }
}
