//! Identity types for entities and scoped entity names

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an entity instance at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create a new entity ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// A scene-qualified entity name
///
/// Written as `scene:entity` in authored text. A name without a scene part is
/// relative and picks up the scene of the scope it is parsed against.
///
/// When used as a scope only the `scene` field matters, so scopes are usually
/// built with [`Name::scope`] and an empty entity part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name {
    /// Scene the entity belongs to
    pub scene: String,
    /// Entity name within the scene
    pub entity: String,
}

impl Name {
    /// Create a fully-qualified name
    pub fn new(scene: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            entity: entity.into(),
        }
    }

    /// Create a scope that only carries a scene
    pub fn scope(scene: impl Into<String>) -> Self {
        Self::new(scene, "")
    }

    /// Parse `scene:entity` or `entity` relative to `scope`
    ///
    /// Each part must start with `[A-Za-z_]` and continue with
    /// `[A-Za-z0-9_.]`, so that `scene:entity/signal` always lexes as a
    /// signal path inside an expression. Returns `None` for empty text, an
    /// empty entity part, an explicit empty scene (`:entity`), or more than
    /// one `:` separator.
    pub fn parse(text: &str, scope: &Name) -> Option<Name> {
        let text = text.trim();
        let name = match text.split_once(':') {
            Some((scene, _)) if scene.is_empty() => return None,
            Some((scene, entity)) => Name::new(scene, entity),
            None => Name::new(scope.scene.as_str(), text),
        };
        name.is_valid().then_some(name)
    }

    /// Check if this name has an entity part
    pub fn is_empty(&self) -> bool {
        self.entity.is_empty()
    }

    /// True when the name can be written inside a signal path
    ///
    /// The scene may be empty; the entity may not.
    pub fn is_valid(&self) -> bool {
        is_name_part(&self.entity) && (self.scene.is_empty() || is_name_part(&self.scene))
    }
}

fn is_name_part(part: &str) -> bool {
    let mut chars = part.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.'))
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scene.is_empty() {
            write!(f, "{}", self.entity)
        } else {
            write!(f, "{}:{}", self.scene, self.entity)
        }
    }
}
