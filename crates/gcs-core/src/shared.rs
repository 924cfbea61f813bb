//! Thread-safe access to a [`World`].
//!
//! [`SharedWorld`] is a cheaply clonable handle around a world behind a
//! readers-writer lock. Mutating calls (`register_*`, `set_component_data`,
//! `create_entity`) take the write lock; queries share the read lock. Every
//! call holds the lock only for the duration of the in-memory operation, so
//! there are no suspension points and nothing to cancel.
//!
//! Query results are returned by value since they cannot outlive the lock.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::data::ComponentData;
use crate::definition::{ComponentDefinition, SchemaSource};
use crate::entity::EntityId;
use crate::registry::ComponentInfo;
use crate::world::{World, WorldConfig};
use crate::EcsError;

/// A [`World`] shared between threads.
#[derive(Debug, Clone, Default)]
pub struct SharedWorld {
    inner: Arc<RwLock<World>>,
}

impl SharedWorld {
    /// Wrap an existing world.
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(RwLock::new(world)),
        }
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self::new(World::with_config(config))
    }

    /// Run `f` with shared access to the world.
    pub fn read<R>(&self, f: impl FnOnce(&World) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access to the world.
    pub fn write<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut self.inner.write())
    }

    // -- mutating -----------------------------------------------------------

    pub fn register_component(
        &self,
        name: &str,
        definition: ComponentDefinition,
    ) -> Result<ComponentInfo, EcsError> {
        self.inner.write().register_component(name, definition)
    }

    pub fn register_script_component<S: SchemaSource + ?Sized>(
        &self,
        name: &str,
        source: &S,
    ) -> Result<ComponentInfo, EcsError> {
        // Derived outside the lock.
        let definition = source.to_definition()?;
        self.register_component(name, definition)
    }

    pub fn create_entity(&self) -> EntityId {
        self.inner.write().create_entity()
    }

    pub fn register_entity(&self, entity: EntityId) -> Result<(), EcsError> {
        self.inner.write().register_entity(entity)
    }

    pub fn spawn(&self) -> EntityId {
        self.inner.write().spawn()
    }

    pub fn set_component_data(
        &self,
        entity: EntityId,
        component: &str,
        data: ComponentData,
    ) -> Result<(), EcsError> {
        self.inner.write().set_component_data(entity, component, data)
    }

    // -- read-only ----------------------------------------------------------

    pub fn has_component(&self, name: &str) -> bool {
        self.inner.read().has_component(name)
    }

    pub fn component_info(&self, name: &str) -> Option<ComponentInfo> {
        self.inner.read().component_info(name)
    }

    pub fn component_names(&self) -> Vec<String> {
        self.inner.read().component_names()
    }

    pub fn is_entity_registered(&self, entity: EntityId) -> bool {
        self.inner.read().is_entity_registered(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.inner.read().entity_count()
    }

    pub fn is_component_added_to_entity(&self, entity: EntityId, component: &str) -> bool {
        self.inner
            .read()
            .is_component_added_to_entity(entity, component)
    }

    pub fn get_components_of_entity(&self, entity: EntityId) -> Result<BTreeSet<String>, EcsError> {
        self.inner.read().get_components_of_entity(entity)
    }

    /// A copy of the stored `component` instance of `entity`.
    pub fn get_component_of_entity(
        &self,
        entity: EntityId,
        component: &str,
    ) -> Result<ComponentData, EcsError> {
        self.inner
            .read()
            .get_component_of_entity(entity, component)
            .cloned()
    }
}

impl From<World> for SharedWorld {
    fn from(world: World) -> Self {
        Self::new(world)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
