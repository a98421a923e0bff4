use std::path::PathBuf;

/// Errors raised while building a concept model. All of them mean the model
/// itself is broken; none are expected at query time.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("unknown concept model `{0}`")]
    UnknownModel(String),
    #[error("mapping `{mapping}` of relationship `{requested}` is already claimed by `{existing}`")]
    DuplicateMapping {
        mapping: String,
        existing: String,
        requested: String,
    },
    #[error("failed to read model document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid model document: {0}")]
    InvalidDocument(String),
}
