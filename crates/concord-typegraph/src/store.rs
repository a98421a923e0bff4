//! Graph store abstraction and the in-memory implementation.
//!
//! The store knows nothing about concepts or programs: it holds labeled
//! nodes and edges, supports create-or-fetch by `(kind, name)` and outgoing
//! edge iteration, and runs typed path queries.

use crate::error::{QueryError, TypeGraphError};
use crate::query::{self, PathRow, TransitionQuery};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

pub type NodeId = u32;
pub type EdgeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Concept,
    Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub kind: NodeKind,
    pub name: String,
    pub labels: BTreeSet<String>,
}

/// Properties of a type-to-type transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeProps {
    pub rel_name: String,
    pub predicate: String,
    pub op: String,
    pub enabled: bool,
    pub is_synonym: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeLabel {
    /// Type node -> owning concept node.
    IsA,
    /// Type node -> type node.
    Transition(EdgeProps),
    /// Concept node -> concept node, projected from transitions.
    Translation { predicate: String, op: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: NodeId,
    pub target: NodeId,
    pub label: EdgeLabel,
}

impl EdgeRecord {
    pub fn transition(&self) -> Option<&EdgeProps> {
        match &self.label {
            EdgeLabel::Transition(props) => Some(props),
            _ => None,
        }
    }
}

/// Backing graph store.
///
/// Implementations serialize their own writes; callers hold `&mut` for
/// mutation. `match_paths` has a default implementation on top of the other
/// primitives; stores with a native query engine can override it.
pub trait GraphStore {
    fn find_node(&self, kind: NodeKind, name: &str) -> Option<NodeId>;
    fn create_node(&mut self, kind: NodeKind, name: &str) -> NodeId;
    fn node(&self, id: NodeId) -> Option<&NodeRecord>;
    /// Returns `true` when the label was not present yet.
    fn add_label(&mut self, id: NodeId, label: &str) -> bool;
    fn create_edge(&mut self, source: NodeId, target: NodeId, label: EdgeLabel) -> EdgeId;
    /// Outgoing edges of `id` in insertion order.
    fn outgoing(&self, id: NodeId) -> Vec<(EdgeId, &EdgeRecord)>;
    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId>;
    fn delete_all(&mut self);

    fn match_paths(&self, query: &TransitionQuery) -> Result<Vec<PathRow>, QueryError> {
        query::match_paths(self, query)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryGraphStore {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    /// (kind, name) -> node
    node_index: HashMap<(NodeKind, String), NodeId>,
    /// source -> edge ids
    forward_index: HashMap<NodeId, Vec<EdgeId>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&EdgeRecord> {
        self.edges.get(id as usize)
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TypeGraphError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeGraphError> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), TypeGraphError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|source| TypeGraphError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, TypeGraphError> {
        let bytes = fs::read(path).map_err(|source| TypeGraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }
}

impl GraphStore for MemoryGraphStore {
    fn find_node(&self, kind: NodeKind, name: &str) -> Option<NodeId> {
        self.node_index.get(&(kind, name.to_string())).copied()
    }

    fn create_node(&mut self, kind: NodeKind, name: &str) -> NodeId {
        if let Some(id) = self.find_node(kind, name) {
            return id;
        }
        let id = self.nodes.len() as NodeId;
        self.nodes.push(NodeRecord {
            kind,
            name: name.to_string(),
            labels: BTreeSet::new(),
        });
        self.node_index.insert((kind, name.to_string()), id);
        id
    }

    fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id as usize)
    }

    fn add_label(&mut self, id: NodeId, label: &str) -> bool {
        match self.nodes.get_mut(id as usize) {
            Some(node) => node.labels.insert(label.to_string()),
            None => false,
        }
    }

    fn create_edge(&mut self, source: NodeId, target: NodeId, label: EdgeLabel) -> EdgeId {
        let id = self.edges.len() as EdgeId;
        self.forward_index.entry(source).or_default().push(id);
        self.edges.push(EdgeRecord {
            source,
            target,
            label,
        });
        id
    }

    fn outgoing(&self, id: NodeId) -> Vec<(EdgeId, &EdgeRecord)> {
        self.forward_index
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|&edge| self.edges.get(edge as usize).map(|rec| (edge, rec)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.kind == kind)
            .map(|(id, _)| id as NodeId)
            .collect()
    }

    fn delete_all(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_node_is_idempotent_per_kind() {
        let mut store = MemoryGraphStore::new();
        let a = store.create_node(NodeKind::Type, "gene");
        let b = store.create_node(NodeKind::Type, "gene");
        let c = store.create_node(NodeKind::Concept, "gene");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.nodes_of_kind(NodeKind::Concept), vec![c]);
    }

    #[test]
    fn test_outgoing_in_insertion_order() {
        let mut store = MemoryGraphStore::new();
        let a = store.create_node(NodeKind::Type, "A");
        let b = store.create_node(NodeKind::Type, "B");
        let c = store.create_node(NodeKind::Concept, "C");
        let e1 = store.create_edge(a, c, EdgeLabel::IsA);
        let e2 = store.create_edge(
            a,
            b,
            EdgeLabel::Translation {
                predicate: "p".into(),
                op: "o".into(),
            },
        );
        let ids: Vec<EdgeId> = store.outgoing(a).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![e1, e2]);
        assert!(store.outgoing(b).is_empty());
    }

    #[test]
    fn test_labels_and_delete_all() {
        let mut store = MemoryGraphStore::new();
        let a = store.create_node(NodeKind::Type, "HGNC");
        assert!(store.add_label(a, "gene"));
        assert!(!store.add_label(a, "gene"));
        assert!(!store.add_label(99, "gene"));

        store.delete_all();
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.find_node(NodeKind::Type, "HGNC"), None);
    }

    #[test]
    fn test_snapshot_bytes_roundtrip() {
        let mut store = MemoryGraphStore::new();
        let a = store.create_node(NodeKind::Type, "HGNC");
        let b = store.create_node(NodeKind::Type, "UniProtKB");
        store.create_edge(
            a,
            b,
            EdgeLabel::Transition(EdgeProps {
                rel_name: "translation".into(),
                predicate: "gene_to_gene_product".into(),
                op: "hgnc.get_uniprot".into(),
                enabled: true,
                is_synonym: false,
            }),
        );

        let restored = MemoryGraphStore::from_bytes(&store.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.find_node(NodeKind::Type, "UniProtKB"), Some(b));
        assert_eq!(restored.edges(), store.edges());
        assert_eq!(restored.outgoing(a).len(), 1);
    }
}
