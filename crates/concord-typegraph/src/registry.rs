//! Explicit registry of the operations named on transition edges.

use crate::error::ServiceError;
use concord_glom::LabeledId;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A conversion service: one identifier in, the identifiers it maps to out.
pub trait Operation: Send + Sync {
    fn call(&self, input: &LabeledId) -> Result<Vec<LabeledId>, ServiceError>;
}

impl<F> Operation for F
where
    F: Fn(&LabeledId) -> Result<Vec<LabeledId>, ServiceError> + Send + Sync,
{
    fn call(&self, input: &LabeledId) -> Result<Vec<LabeledId>, ServiceError> {
        self(input)
    }
}

/// Operation name (as stored in an edge's `op`) -> implementation.
///
/// Built once at startup and handed to whoever executes programs.
#[derive(Default, Clone)]
pub struct ServiceRegistry {
    operations: BTreeMap<String, Arc<dyn Operation>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `operation` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, operation: impl Operation + 'static) {
        let name = name.into();
        if self
            .operations
            .insert(name.clone(), Arc::new(operation))
            .is_some()
        {
            tracing::debug!(op = %name, "replaced registered operation");
        }
    }

    /// Register a closure; its signature is inferred from this bound.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, operation: F)
    where
        F: Fn(&LabeledId) -> Result<Vec<LabeledId>, ServiceError> + Send + Sync + 'static,
    {
        self.register(name, operation);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.operations.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .finish()
    }
}
