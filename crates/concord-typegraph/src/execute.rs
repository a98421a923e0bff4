//! Running a program's operations over concrete identifiers.

use crate::error::ExecutionError;
use crate::program::Program;
use crate::registry::{Operation, ServiceRegistry};
use concord_glom::{synonyms_for, LabeledId, SynonymCache};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Walks a [`Program`] step by step.
///
/// Before each step the current identifiers are normalized into that step's
/// type through the synonym cache (when one is given). A failing operation
/// is logged and skipped; the walk continues with whatever the other
/// operations produced.
pub struct ProgramExecutor<'a> {
    registry: &'a ServiceRegistry,
    synonyms: Option<&'a dyn SynonymCache<LabeledId>>,
}

impl<'a> ProgramExecutor<'a> {
    pub fn new(registry: &'a ServiceRegistry) -> Self {
        Self {
            registry,
            synonyms: None,
        }
    }

    pub fn with_synonyms(mut self, cache: &'a dyn SynonymCache<LabeledId>) -> Self {
        self.synonyms = Some(cache);
        self
    }

    /// Identifiers reached at the terminal step, starting from `start`.
    ///
    /// Every operation of the program must be registered; this is checked
    /// before anything is called.
    pub fn execute(
        &self,
        program: &Program,
        start: impl IntoIterator<Item = LabeledId>,
    ) -> Result<Vec<LabeledId>, ExecutionError> {
        let resolved = self.resolve(program)?;
        let mut current: BTreeSet<LabeledId> = start.into_iter().collect();

        for (step, ops) in program.steps.iter().zip(resolved) {
            current = self.normalize(current, &step.node_type)?;
            if step.is_terminal() || current.is_empty() {
                break;
            }

            let mut reached = BTreeSet::new();
            for id in &current {
                for (name, op) in &ops {
                    match op.call(id) {
                        Ok(out) => reached.extend(out),
                        Err(err) => tracing::warn!(
                            op = %name,
                            input = %id.identifier,
                            error = %err,
                            "operation failed; continuing"
                        ),
                    }
                }
            }
            tracing::debug!(
                node_type = %step.node_type,
                inputs = current.len(),
                outputs = reached.len(),
                "executed step"
            );
            current = reached;
        }
        Ok(current.into_iter().collect())
    }

    fn resolve(
        &self,
        program: &Program,
    ) -> Result<Vec<Vec<(String, Arc<dyn Operation>)>>, ExecutionError> {
        program
            .steps
            .iter()
            .map(|step| {
                step.ops
                    .iter()
                    .map(|link| {
                        self.registry
                            .get(&link.op)
                            .map(|op| (link.op.clone(), op))
                            .ok_or_else(|| ExecutionError::UnknownOperation(link.op.clone()))
                    })
                    .collect()
            })
            .collect()
    }

    /// Swap each identifier for its synonym in `node_type`, if it has one.
    fn normalize(
        &self,
        ids: BTreeSet<LabeledId>,
        node_type: &str,
    ) -> Result<BTreeSet<LabeledId>, ExecutionError> {
        let Some(cache) = self.synonyms else {
            return Ok(ids);
        };
        let mut out = BTreeSet::new();
        for id in ids {
            let synonyms = synonyms_for(cache, &id)?;
            let preferred = synonyms
                .into_iter()
                .find(|syn| syn.prefix().is_some_and(|p| p.eq_ignore_ascii_case(node_type)));
            out.insert(preferred.unwrap_or(id));
        }
        Ok(out)
    }
}
