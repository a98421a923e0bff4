//! Reduction of matched path rows into conversion programs.

use crate::query::{PathRow, Triple};
use serde::{Deserialize, Serialize};

/// One operation available at a step: the predicate it realizes and the
/// operation that performs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpLink {
    pub link: String,
    pub op: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub node_type: String,
    pub ops: Vec<OpLink>,
    /// `None` on the terminal step.
    pub next_type: Option<String>,
}

impl Step {
    pub fn is_terminal(&self) -> bool {
        self.next_type.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub steps: Vec<Step>,
}

impl Program {
    /// Number of type nodes visited, terminal included.
    pub fn node_count(&self) -> usize {
        self.steps.len()
    }

    pub fn transition_count(&self) -> usize {
        self.steps.iter().filter(|step| !step.is_terminal()).count()
    }

    pub fn node_types(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.node_type.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// One program per row; rows without triples are dropped.
pub fn reduce_rows<I>(rows: I) -> Vec<Program>
where
    I: IntoIterator<Item = PathRow>,
{
    rows.into_iter()
        .filter_map(|row| reduce_row(&row))
        .collect()
}

/// Fold a row's triples into steps.
///
/// Consecutive triples leaving the same type append to the open step rather
/// than starting a new one. The final target becomes a terminal step.
pub fn reduce_row(row: &PathRow) -> Option<Program> {
    let last = row.triples.last()?;
    let mut steps: Vec<Step> = Vec::new();
    for triple in &row.triples {
        let link = op_link(triple);
        match steps.last_mut() {
            Some(step) if step.node_type == triple.source.name => {
                if step.next_type.as_deref() != Some(triple.target.name.as_str()) {
                    tracing::debug!(
                        node_type = %step.node_type,
                        op = %link.op,
                        target = %triple.target.name,
                        "fan-out op leads to a different type than its step"
                    );
                }
                step.ops.push(link);
            }
            _ => steps.push(Step {
                node_type: triple.source.name.clone(),
                ops: vec![link],
                next_type: Some(triple.target.name.clone()),
            }),
        }
    }
    steps.push(Step {
        node_type: last.target.name.clone(),
        ops: Vec::new(),
        next_type: None,
    });
    Some(Program { steps })
}

fn op_link(triple: &Triple) -> OpLink {
    OpLink {
        link: triple.edge.predicate.clone(),
        op: triple.edge.op.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::TypeNodeProps;
    use crate::store::EdgeProps;

    fn node(name: &str) -> TypeNodeProps {
        TypeNodeProps {
            name: name.to_string(),
            labels: Vec::new(),
        }
    }

    fn triple(from: &str, predicate: &str, op: &str, to: &str) -> Triple {
        Triple {
            source: node(from),
            edge: EdgeProps {
                rel_name: "translation".to_string(),
                predicate: predicate.to_string(),
                op: op.to_string(),
                enabled: true,
                is_synonym: false,
            },
            target: node(to),
        }
    }

    #[test]
    fn test_zero_rows_yield_no_programs() {
        assert!(reduce_rows(Vec::new()).is_empty());
        assert!(reduce_rows(vec![PathRow::default()]).is_empty());
    }

    #[test]
    fn test_linear_row() {
        let row = PathRow {
            triples: vec![
                triple("MONDO", "gene_associated_with_condition", "biolink.disease_get_gene", "HGNC"),
                triple("HGNC", "gene_associated_with_condition", "biolink.gene_get_disease", "OMIM"),
            ],
        };
        let programs = reduce_rows(vec![row]);
        assert_eq!(programs.len(), 1);

        let p = &programs[0];
        assert_eq!(p.node_types(), vec!["MONDO", "HGNC", "OMIM"]);
        assert_eq!(p.node_count(), 3);
        assert_eq!(p.transition_count(), 2);
        assert_eq!(p.steps[0].next_type.as_deref(), Some("HGNC"));
        assert!(p.steps[2].is_terminal());
        assert!(p.steps[2].ops.is_empty());
    }

    #[test]
    fn test_fan_out_appends_ops_to_one_step() {
        let row = PathRow {
            triples: vec![
                triple("MONDO", "gene_associated_with_condition", "biolink.disease_get_gene", "HGNC"),
                triple("MONDO", "gene_associated_with_condition", "pharos.disease_get_gene", "HGNC"),
                triple("HGNC", "gene_to_gene_product", "hgnc.get_uniprot", "UniProtKB"),
            ],
        };
        let program = reduce_row(&row).unwrap();
        assert_eq!(program.node_count(), 3);
        assert_eq!(
            program.steps[0].ops,
            vec![
                OpLink {
                    link: "gene_associated_with_condition".into(),
                    op: "biolink.disease_get_gene".into()
                },
                OpLink {
                    link: "gene_associated_with_condition".into(),
                    op: "pharos.disease_get_gene".into()
                },
            ]
        );
        assert_eq!(program.steps[1].ops.len(), 1);
    }

    #[test]
    fn test_identical_rows_stay_separate_programs() {
        let row = PathRow {
            triples: vec![triple("HGNC", "p", "op", "UniProtKB")],
        };
        let programs = reduce_rows(vec![row.clone(), row]);
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0], programs[1]);
    }
}
