//! `concord.yaml`: where the model, caches and snapshots live.

use anyhow::{Context, Result};
use concord_model::{LoaderRegistry, ModelSource, BIOLINK_MODEL};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcordConfig {
    pub model: ModelConfig,
    pub glom: GlomConfig,
    /// JSON synonym cache written by `concord glom`
    pub cache_path: PathBuf,
    /// bincode TypeGraph snapshot
    pub graph_path: PathBuf,
    /// trace, debug, info, warn or error
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Loader name in the registry
    pub name: String,
    pub base: PathBuf,
    /// Deep-merged over `base`
    pub overlay: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlomConfig {
    /// At most one identifier per class may carry one of these prefixes.
    pub unique_prefixes: Vec<String>,
}

impl Default for ConcordConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            glom: GlomConfig::default(),
            cache_path: PathBuf::from("./synonyms.json"),
            graph_path: PathBuf::from("./typegraph.bin"),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: BIOLINK_MODEL.to_string(),
            base: PathBuf::from("./biolink-model.yaml"),
            overlay: None,
        }
    }
}

impl ConcordConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// `path` when given, otherwise `./concord.yaml` if present, otherwise
    /// the defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new("concord.yaml");
                if local.exists() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn unique_prefixes(&self) -> Vec<&str> {
        self.glom.unique_prefixes.iter().map(String::as_str).collect()
    }

    pub fn loader_registry(&self) -> LoaderRegistry {
        LoaderRegistry::with_biolink(
            ModelSource::Path(self.model.base.clone()),
            self.model.overlay.clone().map(ModelSource::Path),
        )
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown log level `{}`", self.log_level))
    }
}
