//! World state and the lock capabilities that grant access to it
//!
//! All entities and signals live in one [`World`]. Code never touches them
//! directly; it acquires a [`ReadLock`] or [`WriteLock`] and passes that
//! capability into every signal operation:
//!
//! - reads (`get_signal`, `evaluate`, `get_binding`) accept anything that
//!   implements [`ReadSignals`], so they work under either lock
//! - writes (`set_value`, `set_binding`, `clear_value`) require
//!   `&mut WriteLock`, so a read lock is rejected at compile time
//!
//! A single read of a bound signal, including every signal it reads in turn,
//! runs against the one lock it was given and never re-acquires it.

use crate::{Entity, EntityId, EntityRef, EntityStore, Error, Name, Result, SignalStore};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Read access to entity names and signal data
pub trait ReadSignals {
    /// All live entities
    fn entities(&self) -> &EntityStore;

    /// All stored signals
    fn signals(&self) -> &SignalStore;

    /// Check whether the referenced entity is alive
    fn entity_exists(&self, entity: &EntityRef) -> bool {
        self.entities().contains_name(entity.name())
    }
}

/// Data guarded by a [`World`]
#[derive(Debug, Default)]
struct WorldState {
    entities: EntityStore,
    signals: SignalStore,
}

/// Owner of all entity and signal data
///
/// Any number of [`ReadLock`]s may be held at once across threads; a
/// [`WriteLock`] is exclusive.
#[derive(Debug, Default)]
pub struct World {
    state: RwLock<WorldState>,
}

impl World {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire shared read access, blocking while a writer holds the world
    pub fn read(&self) -> ReadLock<'_> {
        ReadLock {
            guard: self.state.read().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Acquire exclusive write access
    pub fn write(&self) -> WriteLock<'_> {
        WriteLock {
            guard: self.state.write().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Shared read capability for a [`World`]
pub struct ReadLock<'w> {
    guard: RwLockReadGuard<'w, WorldState>,
}

impl ReadSignals for ReadLock<'_> {
    fn entities(&self) -> &EntityStore {
        &self.guard.entities
    }

    fn signals(&self) -> &SignalStore {
        &self.guard.signals
    }
}

/// Exclusive write capability for a [`World`]
pub struct WriteLock<'w> {
    guard: RwLockWriteGuard<'w, WorldState>,
}

impl WriteLock<'_> {
    pub(crate) fn signals_mut(&mut self) -> &mut SignalStore {
        &mut self.guard.signals
    }

    /// Create a named entity
    pub fn spawn(&mut self, name: Name) -> Result<EntityId> {
        let id = self.guard.entities.create(name)?.id;
        tracing::debug!(%id, "spawned entity");
        Ok(id)
    }

    /// Destroy an entity together with every signal stored under its name
    pub fn destroy(&mut self, id: EntityId) -> Result<Entity> {
        let entity = self
            .guard
            .entities
            .remove(id)
            .ok_or_else(|| Error::EntityNotFound(id.to_string()))?;
        let dropped = self.guard.signals.remove_entity(&entity.name);
        tracing::debug!(%id, name = %entity.name, dropped, "destroyed entity");
        Ok(entity)
    }
}

impl ReadSignals for WriteLock<'_> {
    fn entities(&self) -> &EntityStore {
        &self.guard.entities
    }

    fn signals(&self) -> &SignalStore {
        &self.guard.signals
    }
}
