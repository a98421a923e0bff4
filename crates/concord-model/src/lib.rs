//! Concord concept model.
//!
//! A [`ConceptModel`] holds the concept hierarchy (`classes`: gene, disease,
//! ...) and the relationship vocabulary (`slots`). Concepts claim identifier
//! prefixes, which is how a raw curie is placed in a concept. Models are
//! built by a named [`ModelLoader`] looked up in an explicit
//! [`LoaderRegistry`]; there is no process-wide model.

pub mod concept;
pub mod error;
pub mod loader;

pub use concept::{
    concept_key, mint_identifier, Concept, Relationship, MAPPING_PRIORITY, UNMAPPED_NAMESPACE,
    UNMAPPED_RELATION,
};
pub use error::ModelError;
pub use loader::{deep_merge, BiolinkLoader, LoaderRegistry, ModelLoader, ModelSource, BIOLINK_MODEL};

use concord_glom::curie_prefix;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct ConceptModel {
    name: String,
    concepts: Vec<Concept>,
    concept_index: HashMap<String, usize>,
    /// upper-cased prefix -> concept name
    by_prefix: HashMap<String, String>,
    relationships: Vec<Relationship>,
    relationship_index: HashMap<String, usize>,
    /// mapping -> relationship slot
    by_mapping: HashMap<String, usize>,
    /// minted identifier -> relationship slot
    by_identifier: HashMap<String, usize>,
}

impl ConceptModel {
    /// An empty model; populate it with `add_item`/`add_relationship`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build the model registered as `name` in `registry`.
    pub fn load(name: &str, registry: &LoaderRegistry) -> Result<Self, ModelError> {
        let loader = registry
            .get(name)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))?;
        let mut model = Self::new(name);
        loader.load(&mut model)?;
        Ok(model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ------------------------------------------------------------------------
    // Concepts
    // ------------------------------------------------------------------------

    /// Register a concept and index its prefixes.
    ///
    /// The name and parent are normalized with [`concept_key`], so a concept
    /// built by hand is found the same way as a loaded one. A prefix already
    /// claimed by another concept is re-pointed at this one.
    pub fn add_item(&mut self, mut concept: Concept) {
        concept.name = concept_key(&concept.name);
        concept.is_a = concept.is_a.as_deref().map(concept_key);
        for prefix in &concept.id_prefixes {
            let key = prefix.to_uppercase();
            if let Some(previous) = self.by_prefix.get(&key) {
                if previous != &concept.name {
                    tracing::debug!(
                        prefix = %prefix,
                        previous = %previous,
                        concept = %concept.name,
                        "prefix re-assigned to another concept"
                    );
                }
            }
            self.by_prefix.insert(key, concept.name.clone());
        }

        match self.concept_index.get(&concept.name) {
            Some(&slot) => self.concepts[slot] = concept,
            None => {
                self.concept_index
                    .insert(concept.name.clone(), self.concepts.len());
                self.concepts.push(concept);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Concept> {
        let slot = *self.concept_index.get(&concept_key(name))?;
        self.concepts.get(slot)
    }

    /// All concepts in registration order.
    pub fn items(&self) -> &[Concept] {
        &self.concepts
    }

    /// Concept that owns `prefix`, if any.
    pub fn concept_for_prefix(&self, prefix: &str) -> Option<&Concept> {
        let name = self.by_prefix.get(&prefix.to_uppercase())?;
        self.get(name)
    }

    /// Distinct concepts of `ids` in first-seen order. Identifiers without a
    /// mapped prefix are skipped.
    pub fn get_concepts_by_prefix<S: AsRef<str>>(&self, ids: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for concept in ids.iter().filter_map(|id| self.concept_of_id(id.as_ref())) {
            if seen.insert(concept.name.as_str()) {
                out.push(concept.name.clone());
            }
        }
        out
    }

    /// The one concept best supported by `ids`: the concept most of the
    /// identifiers map to, ties broken by concept name.
    pub fn get_single_concept_by_prefixes<S: AsRef<str>>(&self, ids: &[S]) -> Option<String> {
        let mut support: BTreeMap<&str, usize> = BTreeMap::new();
        for concept in ids.iter().filter_map(|id| self.concept_of_id(id.as_ref())) {
            *support.entry(concept.name.as_str()).or_default() += 1;
        }
        let mut ranked: Vec<(&str, usize)> = support.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        if ranked.len() > 1 {
            tracing::debug!(candidates = ?ranked, "multiple concepts for identifiers");
        }
        ranked.first().map(|(name, _)| name.to_string())
    }

    /// Concepts that are no other concept's parent.
    pub fn get_leaves(&self) -> Vec<&Concept> {
        let parents = self.parent_names();
        self.concepts
            .iter()
            .filter(|c| !parents.contains(c.name.as_str()))
            .collect()
    }

    /// Parents that have no parent of their own.
    pub fn get_roots(&self) -> Vec<&Concept> {
        let parents = self.parent_names();
        self.concepts
            .iter()
            .filter(|c| c.is_a.is_none() && parents.contains(c.name.as_str()))
            .collect()
    }

    /// The `is_a` chain above `name`, nearest first.
    pub fn ancestors(&self, name: &str) -> Vec<&Concept> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.get(name);
        visited.insert(concept_key(name));
        while let Some(parent) = current
            .and_then(|c| c.is_a.as_deref())
            .and_then(|p| self.get(p))
        {
            if !visited.insert(parent.name.clone()) {
                tracing::warn!(concept = %parent.name, "cycle in concept hierarchy");
                break;
            }
            out.push(parent);
            current = Some(parent);
        }
        out
    }

    /// Whether `name` is `ancestor` or sits below it.
    pub fn is_a(&self, name: &str, ancestor: &str) -> bool {
        let ancestor = concept_key(ancestor);
        concept_key(name) == ancestor || self.ancestors(name).iter().any(|c| c.name == ancestor)
    }

    fn concept_of_id(&self, id: &str) -> Option<&Concept> {
        curie_prefix(id).and_then(|prefix| self.concept_for_prefix(prefix))
    }

    fn parent_names(&self) -> HashSet<&str> {
        self.concepts
            .iter()
            .filter_map(|c| c.is_a.as_deref())
            .collect()
    }

    // ------------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------------

    /// Register a relationship and index it by every distinct mapping.
    ///
    /// Mappings and minted identifiers are globally unique: one already
    /// claimed by a registered relationship is an error and nothing is
    /// registered.
    pub fn add_relationship(&mut self, relationship: Relationship) -> Result<(), ModelError> {
        let mut mappings: Vec<&String> = Vec::new();
        for mapping in &relationship.mappings {
            if mappings.contains(&mapping) {
                continue;
            }
            if let Some(&slot) = self
                .by_mapping
                .get(mapping)
                .or_else(|| self.by_identifier.get(mapping))
            {
                return Err(ModelError::DuplicateMapping {
                    mapping: mapping.clone(),
                    existing: self.relationships[slot].name.clone(),
                    requested: relationship.name.clone(),
                });
            }
            mappings.push(mapping);
        }
        let identifier = &relationship.identifier;
        if let Some(&slot) = self
            .by_identifier
            .get(identifier)
            .or_else(|| self.by_mapping.get(identifier))
        {
            return Err(ModelError::DuplicateMapping {
                mapping: identifier.clone(),
                existing: self.relationships[slot].name.clone(),
                requested: relationship.name.clone(),
            });
        }

        let slot = self.relationships.len();
        for mapping in mappings {
            self.by_mapping.insert(mapping.clone(), slot);
        }
        self.by_identifier
            .insert(relationship.identifier.clone(), slot);
        self.relationship_index
            .insert(relationship.name.clone(), slot);
        self.relationships.push(relationship);
        Ok(())
    }

    pub fn get_relationship(&self, name: &str) -> Option<&Relationship> {
        let slot = *self.relationship_index.get(name)?;
        self.relationships.get(slot)
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// The registered form of `relationship`, matched by minted identifier
    /// or any of its mappings; the unmapped sentinel when nothing matches.
    pub fn standardize_relationship(&self, relationship: &Relationship) -> Relationship {
        let candidates = std::iter::once(&relationship.identifier).chain(&relationship.mappings);
        for key in candidates {
            let slot = self
                .by_identifier
                .get(key)
                .or_else(|| self.by_mapping.get(key));
            if let Some(&slot) = slot {
                return self.relationships[slot].clone();
            }
        }
        tracing::debug!(relationship = %relationship.name, "unmapped relationship");
        Relationship::unmapped()
    }
}
