//! Concepts (classes) and relationships (slots).

use concord_glom::curie_prefix;
use serde::{Deserialize, Serialize};

/// Mapping prefixes in the order they are preferred when minting a
/// relationship identifier.
pub const MAPPING_PRIORITY: [&str; 6] = ["BIOLINK", "RO", "SIO", "BFO", "GENO", "SEMMEDDB"];

/// Namespace of the sentinel returned for relationships nobody registered.
pub const UNMAPPED_NAMESPACE: &str = "CONCORD";
pub const UNMAPPED_RELATION: &str = "Unmapped_Relation";

/// Canonical form of a concept name: trimmed, inner whitespace as `_`.
pub fn concept_key(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// A semantic category such as `disease` or `gene`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub name: String,
    pub is_a: Option<String>,
    pub id_prefixes: Vec<String>,
    pub description: Option<String>,
}

impl Concept {
    pub fn new(name: &str, is_a: Option<&str>, id_prefixes: Vec<String>) -> Self {
        Self {
            name: concept_key(name),
            is_a: is_a.map(concept_key),
            id_prefixes,
            description: None,
        }
    }
}

/// A named predicate, e.g. `gene associated with condition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    pub is_a: Option<String>,
    pub mappings: Vec<String>,
    /// Canonical identifier, minted from `mappings` on construction.
    pub identifier: String,
}

impl Relationship {
    pub fn new(name: &str, is_a: Option<&str>, mappings: Vec<String>) -> Self {
        let identifier = mint_identifier(name, &mappings);
        Self {
            name: name.to_string(),
            is_a: is_a.map(str::to_string),
            mappings,
            identifier,
        }
    }

    /// Sentinel for relationships that resolve to nothing registered.
    pub fn unmapped() -> Self {
        Self {
            name: UNMAPPED_RELATION.to_string(),
            is_a: None,
            mappings: Vec::new(),
            identifier: format!("{UNMAPPED_NAMESPACE}:{UNMAPPED_RELATION}"),
        }
    }

    pub fn is_unmapped(&self) -> bool {
        self.name == UNMAPPED_RELATION && self.identifier.starts_with(UNMAPPED_NAMESPACE)
    }
}

/// Pick the canonical identifier of a relationship.
///
/// The first mapping whose prefix appears earliest in [`MAPPING_PRIORITY`]
/// wins; otherwise the first mapping; otherwise `BIOLINK:<name>` with spaces
/// replaced by underscores.
pub fn mint_identifier(name: &str, mappings: &[String]) -> String {
    for preferred in MAPPING_PRIORITY {
        let hit = mappings.iter().find(|mapping| {
            curie_prefix(mapping).is_some_and(|prefix| prefix.eq_ignore_ascii_case(preferred))
        });
        if let Some(mapping) = hit {
            return mapping.clone();
        }
    }
    match mappings.first() {
        Some(first) => first.clone(),
        None => format!("BIOLINK:{}", name.trim().replace(' ', "_")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maps(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mint_prefers_priority_order() {
        let mappings = maps(&["SEMMEDDB:CAUSES", "RO:0003303", "SIO:000001"]);
        assert_eq!(mint_identifier("causes", &mappings), "RO:0003303");

        let mappings = maps(&["GENO:0000840", "biolink:causes"]);
        assert_eq!(mint_identifier("causes", &mappings), "biolink:causes");
    }

    #[test]
    fn test_mint_falls_back_to_first_then_name() {
        let mappings = maps(&["UMLS:C123", "MESH:D1"]);
        assert_eq!(mint_identifier("treats", &mappings), "UMLS:C123");
        assert_eq!(
            mint_identifier("gene associated with condition", &[]),
            "BIOLINK:gene_associated_with_condition"
        );
    }

    #[test]
    fn test_concept_names_are_normalized() {
        let c = Concept::new("genetic  condition", Some("disease"), vec![]);
        assert_eq!(c.name, "genetic_condition");
        assert_eq!(c.is_a.as_deref(), Some("disease"));
    }

    #[test]
    fn test_unmapped_sentinel() {
        let r = Relationship::unmapped();
        assert!(r.is_unmapped());
        assert_eq!(r.identifier, "CONCORD:Unmapped_Relation");
        assert!(!Relationship::new("treats", None, vec![]).is_unmapped());
    }
}
