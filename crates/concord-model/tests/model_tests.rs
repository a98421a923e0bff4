//! Concept model tests against a trimmed biolink document.

use concord_model::*;
use std::path::PathBuf;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/biolink-mini.yaml")
}

fn biolink() -> ConceptModel {
    let registry = LoaderRegistry::with_biolink(ModelSource::Path(fixture()), None);
    ConceptModel::load(BIOLINK_MODEL, &registry).expect("fixture loads")
}

fn names(concepts: Vec<&Concept>) -> Vec<String> {
    let mut out: Vec<String> = concepts.into_iter().map(|c| c.name.clone()).collect();
    out.sort();
    out
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_biolink_fixture() {
    let model = biolink();
    assert_eq!(model.name(), BIOLINK_MODEL);
    assert_eq!(model.items().len(), 14);
    assert_eq!(model.relationships().len(), 8);

    let gene = model.get("gene").unwrap();
    assert_eq!(gene.is_a.as_deref(), Some("gene_or_gene_product"));
    assert_eq!(gene.id_prefixes, vec!["HGNC", "NCBIGene", "ENSEMBL"]);
    assert_eq!(model.get("genetic condition").unwrap().name, "genetic_condition");
}

#[test]
fn test_unknown_model_name_fails() {
    let registry = LoaderRegistry::with_biolink(ModelSource::Path(fixture()), None);
    let err = ConceptModel::load("gene-ontology", &registry).unwrap_err();
    assert!(matches!(err, ModelError::UnknownModel(ref name) if name == "gene-ontology"));
}

#[test]
fn test_missing_base_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let registry = LoaderRegistry::with_biolink(
        ModelSource::Path(dir.path().join("absent.yaml")),
        None,
    );
    let err = ConceptModel::load(BIOLINK_MODEL, &registry).unwrap_err();
    assert!(matches!(err, ModelError::Io { .. }));
}

#[test]
fn test_overlay_is_deep_merged() {
    let overlay = r#"
classes:
  disease:
    id_prefixes: [KEGG.DISEASE]
  cell:
    is_a: anatomical entity
    id_prefixes: [CL]
slots:
  expressed in:
    mappings: [RO:0002206]
"#;
    let registry = LoaderRegistry::with_biolink(
        ModelSource::Path(fixture()),
        Some(ModelSource::Inline(overlay.to_string())),
    );
    let model = ConceptModel::load(BIOLINK_MODEL, &registry).unwrap();

    let disease = model.get("disease").unwrap();
    assert_eq!(disease.id_prefixes.first().map(String::as_str), Some("MONDO"));
    assert_eq!(disease.id_prefixes.last().map(String::as_str), Some("KEGG.DISEASE"));
    assert_eq!(disease.is_a.as_deref(), Some("disease_or_phenotypic_feature"));
    assert_eq!(model.concept_for_prefix("CL").unwrap().name, "cell");
    assert!(model.get_relationship("expressed in").is_some());
}

#[test]
fn test_non_mapping_document_is_invalid() {
    let registry = LoaderRegistry::with_biolink(ModelSource::Inline("- a\n- b\n".to_string()), None);
    let err = ConceptModel::load(BIOLINK_MODEL, &registry).unwrap_err();
    assert!(matches!(err, ModelError::InvalidDocument(_)));
}

// ============================================================================
// Prefix lookups
// ============================================================================

#[test]
fn test_get_concepts_by_prefix_skips_unmapped() {
    let model = biolink();
    let concepts = model.get_concepts_by_prefix(&[
        "HGNC:1100",
        "NOPE:1",
        "MONDO:0005148",
        "NCBIGene:672",
        "no-prefix",
    ]);
    assert_eq!(concepts, vec!["gene".to_string(), "disease".to_string()]);
    assert!(model.get_concepts_by_prefix::<&str>(&[]).is_empty());
}

#[test]
fn test_prefix_lookup_ignores_case() {
    let model = biolink();
    assert_eq!(model.concept_for_prefix("uniprotkb").unwrap().name, "gene_product");
    assert_eq!(model.get_concepts_by_prefix(&["chebi:15377"]), vec!["chemical_substance"]);
}

#[test]
fn test_single_concept_picks_most_supported() {
    let model = biolink();
    let ids = ["HGNC:1", "NCBIGene:2", "ENSEMBL:3", "UniProtKB:P1"];
    assert_eq!(
        model.get_single_concept_by_prefixes(&ids).as_deref(),
        Some("gene")
    );
    // Equal support falls back to name order.
    let ids = ["UniProtKB:P1", "HGNC:1"];
    assert_eq!(
        model.get_single_concept_by_prefixes(&ids).as_deref(),
        Some("gene")
    );
    assert_eq!(model.get_single_concept_by_prefixes(&["FOO:1"]), None);
}

#[test]
fn test_hand_built_concept_is_normalized() {
    let mut model = ConceptModel::new("test");
    model.add_item(Concept {
        name: "genetic condition".to_string(),
        is_a: Some("disease  or phenotypic feature".to_string()),
        id_prefixes: vec!["OMIM".to_string()],
        description: None,
    });

    let concept = model.concept_for_prefix("OMIM").unwrap();
    assert_eq!(concept.name, "genetic_condition");
    assert_eq!(concept.is_a.as_deref(), Some("disease_or_phenotypic_feature"));
    assert_eq!(model.get_concepts_by_prefix(&["OMIM:1"]), vec!["genetic_condition"]);
    assert!(model.get("genetic condition").is_some());
}

#[test]
fn test_last_prefix_claim_wins() {
    let mut model = biolink();
    model.add_item(Concept::new("protein", Some("gene product"), vec!["UniProtKB".to_string()]));
    assert_eq!(model.concept_for_prefix("UniProtKB").unwrap().name, "protein");
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn test_leaves_and_roots() {
    let model = biolink();
    assert_eq!(names(model.get_roots()), vec!["named_thing"]);
    assert_eq!(
        names(model.get_leaves()),
        vec![
            "anatomical_entity",
            "chemical_substance",
            "gene",
            "gene_product",
            "genetic_condition",
            "pathway",
            "phenotypic_feature",
        ]
    );

    let parents: Vec<String> = model.items().iter().filter_map(|c| c.is_a.clone()).collect();
    for leaf in model.get_leaves() {
        assert!(!parents.contains(&leaf.name));
    }
    for root in model.get_roots() {
        assert!(root.is_a.is_none());
    }
}

#[test]
fn test_ancestors_and_is_a() {
    let model = biolink();
    assert_eq!(
        model
            .ancestors("genetic_condition")
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>(),
        vec![
            "disease",
            "disease_or_phenotypic_feature",
            "biological_entity",
            "named_thing"
        ]
    );
    assert!(model.is_a("genetic condition", "disease"));
    assert!(model.is_a("gene", "gene"));
    assert!(!model.is_a("disease", "genetic_condition"));
}

#[test]
fn test_ancestors_survive_cycles() {
    let mut model = ConceptModel::new("cyclic");
    model.add_item(Concept::new("a", Some("b"), vec![]));
    model.add_item(Concept::new("b", Some("a"), vec![]));
    assert_eq!(model.ancestors("a").len(), 1);
}

// ============================================================================
// Relationships
// ============================================================================

#[test]
fn test_duplicate_mapping_fails() {
    let mut model = ConceptModel::new("test");
    model
        .add_relationship(Relationship::new("treats", None, vec!["RO:0002606".to_string()]))
        .unwrap();
    let err = model
        .add_relationship(Relationship::new(
            "is treated by",
            None,
            vec!["SEMMEDDB:TREATS".to_string(), "RO:0002606".to_string()],
        ))
        .unwrap_err();
    match err {
        ModelError::DuplicateMapping {
            mapping,
            existing,
            requested,
        } => {
            assert_eq!(mapping, "RO:0002606");
            assert_eq!(existing, "treats");
            assert_eq!(requested, "is treated by");
        }
        other => panic!("unexpected error: {other}"),
    }
    // Nothing from the failed registration leaked into the index.
    let stray = Relationship::new("stray", None, vec!["SEMMEDDB:TREATS".to_string()]);
    assert!(model.standardize_relationship(&stray).is_unmapped());
}

#[test]
fn test_minted_identifier_collision_fails() {
    let mut model = ConceptModel::new("test");
    model
        .add_relationship(Relationship::new("related to", None, Vec::new()))
        .unwrap();
    model
        .add_relationship(Relationship::new("treats", None, vec!["RO:0002606".to_string()]))
        .unwrap();

    // Synthesized `BIOLINK:related_to` is taken by the first relationship.
    let err = model
        .add_relationship(Relationship::new("related to ", None, Vec::new()))
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::DuplicateMapping { ref mapping, ref existing, .. }
            if mapping == "BIOLINK:related_to" && existing == "related to"
    ));

    // A mapping-free identifier that collides with another's mapping.
    let mut minted = Relationship::new("cures", None, Vec::new());
    minted.identifier = "RO:0002606".to_string();
    let err = model.add_relationship(minted).unwrap_err();
    assert!(matches!(
        err,
        ModelError::DuplicateMapping { ref existing, .. } if existing == "treats"
    ));

    assert_eq!(model.relationships().len(), 2);
    assert_eq!(
        model.get_relationship("related to").unwrap().identifier,
        "BIOLINK:related_to"
    );
}

#[test]
fn test_repeated_mapping_within_one_relationship_is_fine() {
    let mut model = ConceptModel::new("test");
    model
        .add_relationship(Relationship::new(
            "treats",
            None,
            vec!["RO:0002606".to_string(), "RO:0002606".to_string()],
        ))
        .unwrap();
    assert_eq!(model.relationships().len(), 1);
}

#[test]
fn test_minted_identifiers_in_fixture() {
    let model = biolink();
    let id = |name: &str| model.get_relationship(name).unwrap().identifier.clone();
    assert_eq!(id("treats"), "RO:0002606");
    assert_eq!(id("participates in"), "RO:0000056");
    assert_eq!(id("has phenotype"), "RO:0002200");
    assert_eq!(id("affects expression of"), "SEMMEDDB:AFFECTS");
    assert_eq!(id("related to"), "BIOLINK:related_to");
}

#[test]
fn test_standardize_relationship() {
    let model = biolink();

    // Same mapping under a different local name resolves to the registered one.
    let raw = Relationship::new("semmed treats", None, vec!["SEMMEDDB:TREATS".to_string()]);
    let standard = model.standardize_relationship(&raw);
    assert_eq!(standard.name, "treats");
    assert_eq!(standard.identifier, "RO:0002606");

    let raw = Relationship::new("gene to gene product", None, vec![]);
    assert_eq!(model.standardize_relationship(&raw).name, "gene to gene product");

    let raw = Relationship::new("frobnicates", None, vec!["XYZ:1".to_string()]);
    let standard = model.standardize_relationship(&raw);
    assert!(standard.is_unmapped());
    assert_eq!(standard.name, UNMAPPED_RELATION);
}
