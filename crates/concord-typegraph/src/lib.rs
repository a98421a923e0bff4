//! TypeGraph: which services convert one kind of identifier into another.
//!
//! Nodes are identifier types (`HGNC`, `UniProtKB`, `MONDO`, ...), each
//! linked `is_a` to the concept that owns its prefix. Transition edges carry
//! the predicate a conversion realizes and the operation that performs it.
//! Every enabled, non-synonym transition is also projected onto the concept
//! layer, so `gene -> gene_product` is known as soon as some
//! `HGNC -> UniProtKB` operation is.
//!
//! ```text
//!   (gene) <-is_a- [HGNC] --hgnc.get_uniprot--> [UniProtKB] -is_a-> (gene_product)
//!     |                                                                  ^
//!     +-------------- gene_to_gene_product / hgnc.get_uniprot -----------+
//! ```
//!
//! Queries are typed ([`TransitionQuery`]); the rows they produce are folded
//! into [`Program`]s by [`reduce_rows`], which is independent of any store.

pub mod error;
pub mod execute;
pub mod program;
pub mod query;
pub mod registry;
pub mod store;

pub use error::{ExecutionError, QueryError, ServiceError, TypeGraphError};
pub use execute::ProgramExecutor;
pub use program::{reduce_row, reduce_rows, OpLink, Program, Step};
pub use query::{match_paths, ConceptPattern, PathRow, TransitionQuery, Triple, TypeNodeProps};
pub use registry::{Operation, ServiceRegistry};
pub use store::{
    EdgeId, EdgeLabel, EdgeProps, EdgeRecord, GraphStore, MemoryGraphStore, NodeId, NodeKind,
    NodeRecord,
};

use concord_model::ConceptModel;
use std::sync::Arc;

/// Predicate of an edge with no known semantic relation; such edges are
/// stored but disabled.
pub const PREDICATE_UNKNOWN: &str = "UNKNOWN";
/// Predicate of an edge that only re-expresses an identifier.
pub const PREDICATE_SYNONYM: &str = "SYNONYM";

pub struct TypeGraph<S: GraphStore = MemoryGraphStore> {
    store: S,
    model: Arc<ConceptModel>,
}

impl TypeGraph<MemoryGraphStore> {
    pub fn new(model: Arc<ConceptModel>) -> Self {
        Self::with_store(MemoryGraphStore::new(), model)
    }
}

impl<S: GraphStore> TypeGraph<S> {
    pub fn with_store(store: S, model: Arc<ConceptModel>) -> Self {
        Self { store, model }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn model(&self) -> &ConceptModel {
        &self.model
    }

    /// Node for type `name`, created on first use.
    ///
    /// A new node is linked `is_a` to the concept owning `name` as a prefix
    /// and labeled with that concept. A type no concept owns is a broken
    /// model and fails.
    pub fn find_or_create(&mut self, name: &str) -> Result<NodeId, TypeGraphError> {
        if let Some(id) = self.store.find_node(NodeKind::Type, name) {
            return Ok(id);
        }
        let concept = self
            .model
            .concept_for_prefix(name)
            .map(|c| c.name.clone())
            .ok_or_else(|| TypeGraphError::MissingConcept(name.to_string()))?;

        let node = self.store.create_node(NodeKind::Type, name);
        let concept_node = self.store.create_node(NodeKind::Concept, &concept);
        self.store.create_edge(node, concept_node, EdgeLabel::IsA);
        self.store.add_label(node, &concept);
        tracing::debug!(type_name = %name, concept = %concept, "created type node");
        Ok(node)
    }

    /// Record that operation `op` converts type `a` into type `b`.
    ///
    /// Idempotent on `(a, b, op)`. Re-adding an `op` with a different
    /// predicate fails: one operation realizes exactly one predicate.
    pub fn add_edge(
        &mut self,
        a: &str,
        b: &str,
        rel_name: &str,
        predicate: &str,
        op: &str,
    ) -> Result<EdgeId, TypeGraphError> {
        let source = self.find_or_create(a)?;
        let target = self.find_or_create(b)?;

        if let Some((id, existing)) = self.find_transition(source, target, op) {
            if existing.predicate != predicate {
                return Err(TypeGraphError::ConflictingPredicate {
                    op: op.to_string(),
                    existing: existing.predicate.clone(),
                    requested: predicate.to_string(),
                });
            }
            tracing::debug!(from = %a, to = %b, op = %op, "transition already present");
            return Ok(id);
        }

        let enabled = predicate != PREDICATE_UNKNOWN;
        let is_synonym = predicate == PREDICATE_SYNONYM;
        let id = self.store.create_edge(
            source,
            target,
            EdgeLabel::Transition(EdgeProps {
                rel_name: rel_name.to_string(),
                predicate: predicate.to_string(),
                op: op.to_string(),
                enabled,
                is_synonym,
            }),
        );

        if enabled && !is_synonym {
            self.ensure_translation(source, target, predicate, op)?;
        }
        Ok(id)
    }

    /// Run `query` and fold its rows into programs.
    ///
    /// A query the store rejects is logged and yields no programs.
    pub fn get_transitions(&self, query: &TransitionQuery) -> Vec<Program> {
        match self.try_get_transitions(query) {
            Ok(programs) => programs,
            Err(err) => {
                tracing::error!(query = %query, error = %err, "transition query failed");
                Vec::new()
            }
        }
    }

    /// Like [`get_transitions`](Self::get_transitions), but a concept the
    /// model does not know is an error. Known concepts without type nodes
    /// simply match nothing.
    pub fn try_get_transitions(&self, query: &TransitionQuery) -> Result<Vec<Program>, QueryError> {
        for pattern in query.patterns() {
            if let ConceptPattern::Named(name) = pattern {
                if self.model.get(name).is_none() {
                    return Err(QueryError::UnknownConcept(name.clone()));
                }
            }
        }
        let rows = self.store.match_paths(query)?;
        Ok(reduce_rows(rows))
    }

    /// [`get_transitions`](Self::get_transitions) for a textual query such as
    /// `"disease,gene,genetic_condition"`.
    pub fn get_transitions_text(&self, query: &str) -> Vec<Program> {
        match query.parse::<TransitionQuery>() {
            Ok(query) => self.get_transitions(&query),
            Err(err) => {
                tracing::error!(query = %query, error = %err, "malformed transition query");
                Vec::new()
            }
        }
    }

    /// Drop every node and edge.
    pub fn delete_all(&mut self) {
        self.store.delete_all();
        tracing::info!("type graph cleared");
    }

    /// `(predicate, op)` of each concept-level translation `from -> to`.
    pub fn concept_translations(&self, from: &str, to: &str) -> Vec<(String, String)> {
        let (Some(source), Some(target)) = (
            self.store.find_node(NodeKind::Concept, from),
            self.store.find_node(NodeKind::Concept, to),
        ) else {
            return Vec::new();
        };
        self.store
            .outgoing(source)
            .into_iter()
            .filter(|(_, edge)| edge.target == target)
            .filter_map(|(_, edge)| match &edge.label {
                EdgeLabel::Translation { predicate, op } => Some((predicate.clone(), op.clone())),
                _ => None,
            })
            .collect()
    }

    /// Transitions leaving type `name`, with the target type of each.
    pub fn transitions_from(&self, name: &str) -> Vec<(String, EdgeProps)> {
        let Some(source) = self.store.find_node(NodeKind::Type, name) else {
            return Vec::new();
        };
        self.store
            .outgoing(source)
            .into_iter()
            .filter_map(|(_, edge)| {
                let props = edge.transition()?;
                let target = self.store.node(edge.target)?;
                Some((target.name.clone(), props.clone()))
            })
            .collect()
    }

    fn find_transition(&self, source: NodeId, target: NodeId, op: &str) -> Option<(EdgeId, EdgeProps)> {
        self.store
            .outgoing(source)
            .into_iter()
            .find_map(|(id, edge)| {
                let props = edge.transition()?;
                (edge.target == target && props.op == op).then(|| (id, props.clone()))
            })
    }

    fn concept_of(&self, type_node: NodeId) -> Result<NodeId, TypeGraphError> {
        self.store
            .outgoing(type_node)
            .into_iter()
            .find(|(_, edge)| edge.label == EdgeLabel::IsA)
            .map(|(_, edge)| edge.target)
            .ok_or_else(|| {
                let name = self
                    .store
                    .node(type_node)
                    .map(|n| n.name.clone())
                    .unwrap_or_default();
                TypeGraphError::MissingConcept(name)
            })
    }

    fn ensure_translation(
        &mut self,
        source: NodeId,
        target: NodeId,
        predicate: &str,
        op: &str,
    ) -> Result<(), TypeGraphError> {
        let from = self.concept_of(source)?;
        let to = self.concept_of(target)?;
        let exists = self.store.outgoing(from).into_iter().any(|(_, edge)| {
            edge.target == to
                && matches!(
                    &edge.label,
                    EdgeLabel::Translation { predicate: p, op: o } if p == predicate && o == op
                )
        });
        if !exists {
            self.store.create_edge(
                from,
                to,
                EdgeLabel::Translation {
                    predicate: predicate.to_string(),
                    op: op.to_string(),
                },
            );
        }
        Ok(())
    }
}
