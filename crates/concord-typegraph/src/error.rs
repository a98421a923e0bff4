use concord_glom::CacheError;
use std::path::PathBuf;

/// Errors building or persisting the type graph. These indicate a broken
/// concept mapping or store and are not meant to be retried away.
#[derive(Debug, thiserror::Error)]
pub enum TypeGraphError {
    #[error("no concept owns type `{0}`")]
    MissingConcept(String),
    #[error("operation `{op}` already links these types with predicate `{existing}`, not `{requested}`")]
    ConflictingPredicate {
        op: String,
        existing: String,
        requested: String,
    },
    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] bincode::Error),
    #[error("snapshot IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A path query the store could not run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query needs at least two concept patterns, got {0}")]
    TooShort(usize),
    #[error("empty pattern at position {0}")]
    EmptyPattern(usize),
    #[error("unknown concept `{0}` in query")]
    UnknownConcept(String),
}

/// Failure reported by a registered operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("operation failed: {0}")]
    Failed(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("no service registered for operation `{0}`")]
    UnknownOperation(String),
    #[error("synonym lookup failed: {0}")]
    Cache(#[from] CacheError),
}
