//! RON definition loader

use crate::error::{Error, Result};
use crate::schema::{EntityDef, SceneFile};
use indexmap::IndexMap;
use lumen_core::{EntityId, Name, ReadSignals, SignalRef, WriteLock};
use std::fs;
use std::path::{Path, PathBuf};

/// Loaded signal definitions, keyed by fully-qualified entity name
#[derive(Debug, Default)]
pub struct SignalDefs {
    entities: IndexMap<Name, EntityDef>,
}

/// Outcome of applying definitions to a world
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ApplyReport {
    /// Every defined entity, in definition order
    pub entities: Vec<EntityId>,
    /// Bindings whose text failed to parse; they are stored and read as `0.0`
    pub invalid_bindings: Vec<SignalRef>,
}

impl SignalDefs {
    /// Create empty definitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the definition for an entity
    pub fn get(&self, name: &Name) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &EntityDef)> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Spawn every defined entity and write its initial signals
    ///
    /// Entities that already exist under the same name are reused. Values are
    /// written before bindings, and bindings are parsed with the entity's own
    /// name as scope.
    pub fn apply(&self, lock: &mut WriteLock<'_>) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        for (name, def) in &self.entities {
            let existing = lock.entities().get_by_name(name).map(|entity| entity.id);
            let id = match existing {
                Some(id) => id,
                None => lock.spawn(name.clone())?,
            };
            report.entities.push(id);

            for (signal, value) in &def.values {
                SignalRef::new(name.clone(), signal.as_str()).set_value(lock, *value);
            }
            for (signal, text) in &def.bindings {
                let signal = SignalRef::new(name.clone(), signal.as_str());
                let expr = signal.set_binding(lock, text, name);
                if let Some(error) = expr.error() {
                    tracing::warn!(%signal, expr = %text, %error, "stored invalid signal binding");
                    report.invalid_bindings.push(signal);
                }
            }
        }

        tracing::debug!(
            entities = report.entities.len(),
            invalid = report.invalid_bindings.len(),
            "applied signal definitions"
        );
        Ok(report)
    }

    fn insert(&mut self, scene: &str, def: EntityDef) -> Result<()> {
        if scene.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "entity {:?} has an empty scene name",
                def.name
            )));
        }
        let name = Name::new(scene, def.name.as_str());
        if Name::parse(&name.to_string(), &Name::default()).as_ref() != Some(&name) {
            return Err(Error::InvalidSchema(format!("invalid entity name {name:?}")));
        }

        for signal in def.values.keys().chain(def.bindings.keys()) {
            let parsed = SignalRef::parse(&format!("{name}/{signal}"), &name);
            if parsed.as_ref().map(SignalRef::signal_name) != Some(signal.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "invalid signal name {signal:?} on {name}"
                )));
            }
        }
        if let Some(signal) = def.values.keys().find(|s| def.bindings.contains_key(*s)) {
            return Err(Error::InvalidSchema(format!(
                "signal {name}/{signal} has both a value and a binding"
            )));
        }

        if self.entities.contains_key(&name) {
            return Err(Error::DuplicateDefinition(name.to_string()));
        }
        self.entities.insert(name, def);
        Ok(())
    }
}

/// Loader for RON signal definition files
pub struct Loader {
    defs: SignalDefs,
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            defs: SignalDefs::new(),
        }
    }

    /// Load scenes from a RON string
    pub fn load_str(&mut self, content: &str) -> Result<()> {
        let file: SceneFile = ron::from_str(content)?;
        for scene in file.scenes {
            for entity in scene.entities {
                self.defs.insert(&scene.name, entity)?;
            }
        }
        Ok(())
    }

    /// Load a single RON file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading signal definitions");
        self.load_str(&content)
    }

    /// Load all RON files from a directory, recursing into subdirectories
    ///
    /// Entries are visited in path order so duplicate detection is stable.
    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut entries = fs::read_dir(path)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<std::io::Result<Vec<PathBuf>>>()?;
        entries.sort();

        for file_path in entries {
            if file_path.is_dir() {
                self.load_directory(&file_path)?;
            } else if file_path.extension().is_some_and(|e| e == "ron") {
                self.load_file(&file_path)?;
            }
        }

        Ok(())
    }

    /// Finish loading and return the definitions
    pub fn finish(self) -> SignalDefs {
        self.defs
    }

    /// Get the current definitions (for inspection during loading)
    pub fn defs(&self) -> &SignalDefs {
        &self.defs
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
