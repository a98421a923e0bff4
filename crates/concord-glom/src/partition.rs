//! Union-find partition of identifiers into equivalence classes.
//!
//! Classes live in an arena of slots. Every member is indexed to the slot it
//! was first placed in; slots are unioned by size and resolved to their root
//! with path compression on mutable access. Only root slots hold members.

use crate::curie::Synonymous;
use ahash::AHashMap;
use std::collections::BTreeSet;

/// Outcome counts of one or more merge calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Groups folded into the partition.
    pub accepted: usize,
    /// Groups dropped for violating a unique prefix.
    pub rejected: usize,
    /// Groups with no members.
    pub empty: usize,
}

impl MergeReport {
    pub fn absorb(&mut self, other: MergeReport) {
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.empty += other.empty;
    }

    pub fn total(&self) -> usize {
        self.accepted + self.rejected + self.empty
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupOutcome {
    Accepted,
    Rejected,
    Empty,
}

/// Dynamic partition of members into equivalence classes.
#[derive(Debug, Clone)]
pub struct Partition<T: Synonymous> {
    /// member -> slot it was placed in (may be a non-root)
    index: AHashMap<T, usize>,
    /// slot -> parent slot; roots point at themselves
    parent: Vec<usize>,
    /// slot -> members; empty for every non-root slot
    members: Vec<BTreeSet<T>>,
}

impl<T: Synonymous> Default for Partition<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Synonymous> Partition<T> {
    pub fn new() -> Self {
        Self {
            index: AHashMap::new(),
            parent: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Number of indexed members (cache keys), not classes.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, member: &T) -> bool {
        self.index.contains_key(member)
    }

    pub fn class_count(&self) -> usize {
        self.root_slots().count()
    }

    /// The class containing `member`, if it has been seen.
    pub fn class_of(&self, member: &T) -> Option<&BTreeSet<T>> {
        let slot = *self.index.get(member)?;
        self.members.get(self.root_of(slot))
    }

    /// Every distinct class once, in creation order of their root slots.
    pub fn classes(&self) -> impl Iterator<Item = &BTreeSet<T>> + '_ {
        self.root_slots().map(move |slot| &self.members[slot])
    }

    /// Fold a batch of equivalence groups into the partition.
    ///
    /// A group that would put two members sharing one of `unique_prefixes`
    /// into the same class is dropped whole; the partition is left exactly as
    /// it was. Prefixes compare ASCII case-insensitively.
    pub fn merge<G, I>(&mut self, groups: G, unique_prefixes: &[&str]) -> MergeReport
    where
        G: IntoIterator<Item = I>,
        I: IntoIterator<Item = T>,
    {
        let mut report = MergeReport::default();
        for group in groups {
            match self.merge_group(group, unique_prefixes) {
                GroupOutcome::Accepted => report.accepted += 1,
                GroupOutcome::Rejected => report.rejected += 1,
                GroupOutcome::Empty => report.empty += 1,
            }
        }
        if report.rejected > 0 {
            tracing::warn!(
                rejected = report.rejected,
                accepted = report.accepted,
                "dropped equivalence groups violating unique prefixes"
            );
        }
        report
    }

    /// Merge another partition's classes into this one, e.g. when combining
    /// shards built by separate workers.
    pub fn absorb(&mut self, other: Partition<T>, unique_prefixes: &[&str]) -> MergeReport {
        let Partition {
            parent, members, ..
        } = other;
        let groups = members
            .into_iter()
            .enumerate()
            .filter(|(slot, class)| parent[*slot] == *slot && !class.is_empty())
            .map(|(_, class)| class);
        self.merge(groups, unique_prefixes)
    }

    fn merge_group<I>(&mut self, group: I, unique_prefixes: &[&str]) -> GroupOutcome
    where
        I: IntoIterator<Item = T>,
    {
        let incoming: BTreeSet<T> = group.into_iter().collect();
        if incoming.is_empty() {
            return GroupOutcome::Empty;
        }

        let mut roots: Vec<usize> = Vec::new();
        let mut fresh: Vec<T> = Vec::new();
        for member in incoming {
            match self.index.get(&member).copied() {
                Some(slot) => {
                    let root = self.find(slot);
                    if !roots.contains(&root) {
                        roots.push(root);
                    }
                }
                None => fresh.push(member),
            }
        }

        if let Some(prefix) = self.violated_prefix(&roots, &fresh, unique_prefixes) {
            tracing::debug!(
                prefix = %prefix,
                classes = roots.len(),
                new_members = fresh.len(),
                "rejecting group"
            );
            return GroupOutcome::Rejected;
        }

        let target = match roots
            .iter()
            .copied()
            .max_by_key(|&root| (self.members[root].len(), std::cmp::Reverse(root)))
        {
            Some(root) => root,
            None => self.new_slot(),
        };

        for &root in &roots {
            if root == target {
                continue;
            }
            self.parent[root] = target;
            let moved = std::mem::take(&mut self.members[root]);
            self.members[target].extend(moved);
        }

        for member in fresh {
            self.index.insert(member.clone(), target);
            self.members[target].insert(member);
        }

        GroupOutcome::Accepted
    }

    /// First unique prefix carried by more than one member of the tentative
    /// union of `roots` and `fresh`.
    fn violated_prefix(
        &self,
        roots: &[usize],
        fresh: &[T],
        unique_prefixes: &[&str],
    ) -> Option<String> {
        if unique_prefixes.is_empty() {
            return None;
        }
        let tentative = roots
            .iter()
            .flat_map(|&root| self.members[root].iter())
            .chain(fresh.iter());

        let mut counts = vec![0usize; unique_prefixes.len()];
        for member in tentative {
            let Some(prefix) = member.prefix() else {
                continue;
            };
            for (i, unique) in unique_prefixes.iter().enumerate() {
                if prefix.eq_ignore_ascii_case(unique) {
                    counts[i] += 1;
                    if counts[i] > 1 {
                        return Some(unique.to_string());
                    }
                }
            }
        }
        None
    }

    fn new_slot(&mut self) -> usize {
        let slot = self.parent.len();
        self.parent.push(slot);
        self.members.push(BTreeSet::new());
        slot
    }

    fn root_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.parent.len()).filter(move |&slot| self.parent[slot] == slot)
    }

    fn root_of(&self, mut slot: usize) -> usize {
        while self.parent[slot] != slot {
            slot = self.parent[slot];
        }
        slot
    }

    fn find(&mut self, slot: usize) -> usize {
        let root = self.root_of(slot);
        let mut current = slot;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }
}
