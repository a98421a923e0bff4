//! Concord glom: identifier equivalence classes.
//!
//! Crawlers report groups of identifiers that name the same entity in
//! different naming systems (`MONDO:0005148`, `DOID:9352`, `UMLS:C0011860`,
//! ...). [`Partition::merge`] folds those groups into equivalence classes,
//! refusing any merge that would put two identifiers with the same *unique
//! prefix* into one class. Finished classes are written to a
//! [`SynonymCache`] with [`dump`], keyed by every member.
//!
//! ```
//! use concord_glom::{merge, Partition};
//!
//! let mut classes: Partition<u32> = Partition::new();
//! merge(&mut classes, [[1, 2], [2, 3], [4, 5]], &[]);
//! assert_eq!(classes.len(), 5);
//! assert_eq!(classes.class_of(&1), classes.class_of(&3));
//! ```
//!
//! A partition is single-writer. Workers that crawl disjoint sources build
//! their own partitions and fold them together with [`Partition::absorb`].

pub mod cache;
pub mod curie;
pub mod partition;

pub use cache::{dump, synonyms_for, CacheError, JsonFileCache, MemoryCache, SynonymCache};
pub use curie::{curie_local, curie_prefix, make_curie, upper_curie, LabeledId, Synonymous};
pub use partition::{MergeReport, Partition};

/// Free-function form of [`Partition::merge`].
pub fn merge<T, G, I>(partition: &mut Partition<T>, groups: G, unique_prefixes: &[&str]) -> MergeReport
where
    T: Synonymous,
    G: IntoIterator<Item = I>,
    I: IntoIterator<Item = T>,
{
    partition.merge(groups, unique_prefixes)
}
