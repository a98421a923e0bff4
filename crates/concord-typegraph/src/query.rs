//! Typed path queries over the transition graph.
//!
//! A query is a sequence of concept patterns. It matches every simple path
//! of type nodes `t0 -> t1 -> ... -> tn` where `ti` carries the concept of
//! pattern `i` (or anything, for `*`) and each hop has at least one enabled
//! transition. One [`PathRow`] comes back per matched path, holding every
//! enabled parallel edge of each hop.

use crate::error::QueryError;
use crate::store::{EdgeProps, GraphStore, NodeId, NodeKind};
use concord_model::concept_key;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConceptPattern {
    Named(String),
    Any,
}

impl fmt::Display for ConceptPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConceptPattern::Named(name) => f.write_str(name),
            ConceptPattern::Any => f.write_str("*"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionQuery {
    patterns: Vec<ConceptPattern>,
}

impl TransitionQuery {
    pub fn new(patterns: Vec<ConceptPattern>) -> Self {
        Self { patterns }
    }

    /// Query over named concepts only.
    pub fn concepts<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(
            names
                .iter()
                .map(|name| ConceptPattern::Named(concept_key(name.as_ref())))
                .collect(),
        )
    }

    /// `hops`-long query with fixed ends and wildcards in between.
    pub fn between(start: &str, end: &str, hops: usize) -> Self {
        let mut patterns = vec![ConceptPattern::Named(concept_key(start))];
        patterns.extend((1..hops).map(|_| ConceptPattern::Any));
        patterns.push(ConceptPattern::Named(concept_key(end)));
        Self::new(patterns)
    }

    pub fn patterns(&self) -> &[ConceptPattern] {
        &self.patterns
    }

    pub fn hops(&self) -> usize {
        self.patterns.len().saturating_sub(1)
    }
}

impl fmt::Display for TransitionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.patterns.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(","))
    }
}

/// Parses `disease,gene,*,pathway`. Segments are trimmed; `*` is a
/// wildcard. Concept names are not checked until the query runs.
impl FromStr for TransitionQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut patterns = Vec::new();
        for (i, part) in s.split(',').enumerate() {
            let part = part.trim();
            match part {
                "" => return Err(QueryError::EmptyPattern(i)),
                "*" => patterns.push(ConceptPattern::Any),
                name => patterns.push(ConceptPattern::Named(concept_key(name))),
            }
        }
        if patterns.len() < 2 {
            return Err(QueryError::TooShort(patterns.len()));
        }
        Ok(Self::new(patterns))
    }
}

// ============================================================================
// Result rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeNodeProps {
    pub name: String,
    pub labels: Vec<String>,
}

/// One `(source, edge, target)` hop of a matched path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub source: TypeNodeProps,
    pub edge: EdgeProps,
    pub target: TypeNodeProps,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRow {
    pub triples: Vec<Triple>,
}

// ============================================================================
// Matching
// ============================================================================

/// Enumerate the rows of `query` against `store`.
///
/// A named concept no type node carries yet matches nothing. Whether the
/// name exists at all is the caller's business: the store has no model.
///
/// Start nodes are visited in creation order and neighbours in edge
/// insertion order, so the row order is stable for a given store.
pub fn match_paths<S: GraphStore + ?Sized>(
    store: &S,
    query: &TransitionQuery,
) -> Result<Vec<PathRow>, QueryError> {
    let patterns = query.patterns();
    if patterns.len() < 2 {
        return Err(QueryError::TooShort(patterns.len()));
    }
    for pattern in patterns {
        if let ConceptPattern::Named(name) = pattern {
            if store.find_node(NodeKind::Concept, name).is_none() {
                tracing::debug!(concept = %name, "no type carries concept");
                return Ok(Vec::new());
            }
        }
    }

    let mut rows = Vec::new();
    let mut path: Vec<NodeId> = Vec::with_capacity(patterns.len());
    for start in store.nodes_of_kind(NodeKind::Type) {
        if !matches(store, start, &patterns[0]) {
            continue;
        }
        path.push(start);
        extend(store, patterns, &mut path, &mut rows);
        path.pop();
    }
    tracing::debug!(query = %query, rows = rows.len(), "matched transition paths");
    Ok(rows)
}

fn extend<S: GraphStore + ?Sized>(
    store: &S,
    patterns: &[ConceptPattern],
    path: &mut Vec<NodeId>,
    rows: &mut Vec<PathRow>,
) {
    if path.len() == patterns.len() {
        rows.push(build_row(store, path));
        return;
    }
    let Some(&last) = path.last() else {
        return;
    };
    let pattern = &patterns[path.len()];
    for next in enabled_targets(store, last) {
        if path.contains(&next) || !matches(store, next, pattern) {
            continue;
        }
        path.push(next);
        extend(store, patterns, path, rows);
        path.pop();
    }
}

/// Distinct targets reachable over enabled transitions, first edge first.
fn enabled_targets<S: GraphStore + ?Sized>(store: &S, node: NodeId) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = Vec::new();
    for (_, edge) in store.outgoing(node) {
        if edge.transition().is_some_and(|props| props.enabled) && !out.contains(&edge.target) {
            out.push(edge.target);
        }
    }
    out
}

fn matches<S: GraphStore + ?Sized>(store: &S, node: NodeId, pattern: &ConceptPattern) -> bool {
    let Some(record) = store.node(node) else {
        return false;
    };
    match pattern {
        ConceptPattern::Any => true,
        ConceptPattern::Named(concept) => record.labels.contains(concept),
    }
}

fn build_row<S: GraphStore + ?Sized>(store: &S, path: &[NodeId]) -> PathRow {
    let mut triples = Vec::new();
    for pair in path.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let (Some(source), Some(target)) = (props(store, from), props(store, to)) else {
            continue;
        };
        for (_, edge) in store.outgoing(from) {
            if edge.target != to {
                continue;
            }
            if let Some(transition) = edge.transition().filter(|t| t.enabled) {
                triples.push(Triple {
                    source: source.clone(),
                    edge: transition.clone(),
                    target: target.clone(),
                });
            }
        }
    }
    PathRow { triples }
}

fn props<S: GraphStore + ?Sized>(store: &S, node: NodeId) -> Option<TypeNodeProps> {
    store.node(node).map(|record| TypeNodeProps {
        name: record.name.clone(),
        labels: record.labels.iter().cloned().collect(),
    })
}
