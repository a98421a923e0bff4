//! Model loaders and the registry that names them.
//!
//! The built-in `biolink-model` loader reads a base YAML document plus an
//! optional overlay, deep-merges them and registers the `classes` and
//! `slots` it finds.

use crate::concept::{Concept, Relationship};
use crate::error::ModelError;
use crate::ConceptModel;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub const BIOLINK_MODEL: &str = "biolink-model";

/// Populates a [`ConceptModel`].
pub trait ModelLoader {
    fn load(&self, model: &mut ConceptModel) -> Result<(), ModelError>;
}

/// Loader name -> loader.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: HashMap<String, Box<dyn ModelLoader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the biolink loader registered under [`BIOLINK_MODEL`].
    pub fn with_biolink(base: ModelSource, overlay: Option<ModelSource>) -> Self {
        let mut registry = Self::new();
        registry.register(BIOLINK_MODEL, BiolinkLoader::new(base, overlay));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, loader: impl ModelLoader + 'static) {
        self.loaders.insert(name.into(), Box::new(loader));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ModelLoader> {
        self.loaders.get(name).map(|loader| loader.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Where a model document comes from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    Path(PathBuf),
    Inline(String),
}

impl ModelSource {
    pub fn read(&self) -> Result<String, ModelError> {
        match self {
            ModelSource::Path(path) => fs::read_to_string(path).map_err(|source| ModelError::Io {
                path: path.clone(),
                source,
            }),
            ModelSource::Inline(text) => Ok(text.clone()),
        }
    }
}

/// Merge `overlay` into `base`: mappings key by key (recursively), sequences
/// concatenated, anything else replaced by the overlay.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (Value::Sequence(base), Value::Sequence(overlay)) => base.extend(overlay),
        (base, overlay) => *base = overlay,
    }
}

// ============================================================================
// biolink-model
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct ClassDef {
    #[serde(default)]
    is_a: Option<String>,
    #[serde(default)]
    id_prefixes: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SlotDef {
    #[serde(default)]
    is_a: Option<String>,
    #[serde(default)]
    mappings: Vec<String>,
}

pub struct BiolinkLoader {
    base: ModelSource,
    overlay: Option<ModelSource>,
}

impl BiolinkLoader {
    pub fn new(base: ModelSource, overlay: Option<ModelSource>) -> Self {
        Self { base, overlay }
    }

    /// The merged document, before registration.
    pub fn document(&self) -> Result<Value, ModelError> {
        let mut doc: Value = serde_yaml::from_str(&self.base.read()?)?;
        if let Some(overlay) = &self.overlay {
            let overlay: Value = serde_yaml::from_str(&overlay.read()?)?;
            deep_merge(&mut doc, overlay);
        }
        Ok(doc)
    }
}

impl ModelLoader for BiolinkLoader {
    fn load(&self, model: &mut ConceptModel) -> Result<(), ModelError> {
        let doc = self.document()?;
        let Value::Mapping(doc) = doc else {
            return Err(ModelError::InvalidDocument(
                "top level must be a mapping".to_string(),
            ));
        };

        for (name, value) in section(&doc, "classes")? {
            let def: ClassDef = definition(value)?;
            let mut concept = Concept::new(name, def.is_a.as_deref(), def.id_prefixes);
            concept.description = def.description;
            model.add_item(concept);
        }

        for (name, value) in section(&doc, "slots")? {
            let def: SlotDef = definition(value)?;
            model.add_relationship(Relationship::new(name, def.is_a.as_deref(), def.mappings))?;
        }

        tracing::info!(
            model = %model.name(),
            concepts = model.items().len(),
            relationships = model.relationships().len(),
            "loaded concept model"
        );
        Ok(())
    }
}

/// Entries of a top-level section in document order. A missing section is
/// empty.
fn section<'a>(doc: &'a Mapping, key: &str) -> Result<Vec<(&'a str, &'a Value)>, ModelError> {
    let Some(value) = doc.get(key) else {
        return Ok(Vec::new());
    };
    let Value::Mapping(entries) = value else {
        return Err(ModelError::InvalidDocument(format!(
            "`{key}` must be a mapping"
        )));
    };
    entries
        .iter()
        .map(|(name, value)| {
            name.as_str()
                .map(|name| (name, value))
                .ok_or_else(|| ModelError::InvalidDocument(format!("non-string key in `{key}`")))
        })
        .collect()
}

fn definition<T: Default + for<'de> Deserialize<'de>>(value: &Value) -> Result<T, ModelError> {
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_value(value.clone())?)
}
