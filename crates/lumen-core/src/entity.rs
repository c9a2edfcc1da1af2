//! Entity types and the name-indexed entity store

use crate::{EntityId, Error, Name, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lazily-validated reference to an entity by its scoped name
///
/// An `EntityRef` never holds a live pointer. It is resolved against an
/// [`EntityStore`] at the moment it is read, so it can be created before the
/// entity it names is spawned and keeps working after a respawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRef(Name);

impl EntityRef {
    /// Create a reference to a fully-qualified name
    pub fn new(name: Name) -> Self {
        Self(name)
    }

    /// Resolve an entity path relative to an authoring scope
    ///
    /// Accepts `entity` (scene taken from `scope`) and `scene:entity`.
    /// Whether the entity exists is not checked here.
    pub fn resolve(path: &str, scope: &Name) -> Option<Self> {
        Name::parse(path, scope).map(Self)
    }

    /// The name this reference points at
    pub fn name(&self) -> &Name {
        &self.0
    }

    /// Look up the live entity, if it currently exists
    pub fn get<'a>(&self, store: &'a EntityStore) -> Option<&'a Entity> {
        store.get_by_name(&self.0)
    }
}

impl From<Name> for EntityRef {
    fn from(name: Name) -> Self {
        Self(name)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A live entity instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier for this entity
    pub id: EntityId,
    /// Scoped name, unique within the store
    pub name: Name,
}

impl Entity {
    /// Create a new entity
    pub fn new(id: EntityId, name: Name) -> Self {
        Self { id, name }
    }
}

/// Storage for all live entities
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    /// All entities by ID
    entities: IndexMap<EntityId, Entity>,
    /// Index: name -> entity ID
    by_name: IndexMap<Name, EntityId>,
    /// Next entity ID to assign
    next_id: u64,
}

impl EntityStore {
    /// Create a new empty entity store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new named entity
    ///
    /// Fails if the name is not [valid](Name::is_valid) or already taken.
    pub fn create(&mut self, name: Name) -> Result<&mut Entity> {
        if !name.is_valid() {
            return Err(Error::InvalidName(name.to_string()));
        }
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateName(name.to_string()));
        }

        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.by_name.insert(name.clone(), id);
        Ok(self.entities.entry(id).or_insert(Entity::new(id, name)))
    }

    /// Get an entity by ID
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get an entity by its scoped name
    pub fn get_by_name(&self, name: &Name) -> Option<&Entity> {
        self.by_name.get(name).and_then(|id| self.entities.get(id))
    }

    /// Check whether an entity with this name is alive
    pub fn contains_name(&self, name: &Name) -> bool {
        self.by_name.contains_key(name)
    }

    /// Remove an entity
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.shift_remove(&id)?;
        self.by_name.shift_remove(&entity.name);
        Some(entity)
    }

    /// Get all entities
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Get the number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
