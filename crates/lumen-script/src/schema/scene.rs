//! Scene and entity signal definition schema

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One definition file: a list of scenes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub scenes: Vec<SceneDef>,
}

/// A scene and the entities authored in it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDef {
    /// Scene name; relative names in bindings resolve against it
    pub name: String,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

/// Initial signals for one entity
///
/// A signal name may appear in `values` or `bindings`, not both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity name within the scene
    pub name: String,
    /// Constant signals
    #[serde(default)]
    pub values: IndexMap<String, f64>,
    /// Bound signals as expression text
    #[serde(default)]
    pub bindings: IndexMap<String, String>,
}

impl EntityDef {
    /// Create an entity definition with no signals
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a constant signal
    pub fn with_value(mut self, signal: impl Into<String>, value: f64) -> Self {
        self.values.insert(signal.into(), value);
        self
    }

    /// Add a bound signal
    pub fn with_binding(mut self, signal: impl Into<String>, expr: impl Into<String>) -> Self {
        self.bindings.insert(signal.into(), expr.into());
        self
    }
}
