//! The [`World`] is the top-level container for the ECS. It owns the entity
//! set, the component registry, and all per-entity component data.
//!
//! Every mutation goes through the world and is validated before anything is
//! changed, so a failed call always leaves the world as it was.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::ComponentData;
use crate::definition::{ComponentDefinition, SchemaSource};
use crate::entity::{EntityId, EntityIdGenerator};
use crate::registry::{ComponentInfo, ComponentRegistry};
use crate::EcsError;

// ---------------------------------------------------------------------------
// WorldConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`World`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for entity identity generation. `None` seeds from OS entropy;
    /// a fixed seed makes [`World::create_entity`] reproducible.
    pub id_seed: Option<u64>,
    /// Accept int values for real fields, storing them as reals.
    pub widen_int_to_real: bool,
}

impl Default for WorldConfig {
    /// Entropy-seeded identities, int-to-real widening on.
    fn default() -> Self {
        Self {
            id_seed: None,
            widen_int_to_real: true,
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The aggregate store owning all schemas, entities and component data.
///
/// A (entity, component) entry only exists if both the entity and the
/// component name are registered.
pub struct World {
    config: WorldConfig,
    /// Entity identity generator.
    id_generator: EntityIdGenerator,
    /// Component schema registry.
    registry: ComponentRegistry,
    /// Registered entity -> component name -> stored instance.
    components_of_entity: HashMap<EntityId, BTreeMap<String, ComponentData>>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entity_count", &self.components_of_entity.len())
            .field("component_count", &self.registry.len())
            .finish()
    }
}

impl World {
    /// Create a new, empty world with the default configuration.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create a new, empty world.
    pub fn with_config(config: WorldConfig) -> Self {
        let id_generator = match config.id_seed {
            Some(seed) => EntityIdGenerator::seeded(seed),
            None => EntityIdGenerator::from_entropy(),
        };
        Self {
            config,
            id_generator,
            registry: ComponentRegistry::new(),
            components_of_entity: HashMap::new(),
        }
    }

    /// The configuration this world was created with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Read-only access to the component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // -- component registration ---------------------------------------------

    /// Register a component schema under `name`.
    ///
    /// Re-registering a name with an identical schema returns the existing
    /// handle; a different schema fails with
    /// [`EcsError::ComponentAlreadyRegistered`].
    pub fn register_component(
        &mut self,
        name: &str,
        definition: ComponentDefinition,
    ) -> Result<ComponentInfo, EcsError> {
        self.registry.register(name, definition)
    }

    /// Derive a schema from `source` (typically a reflected script property
    /// list) and register it under `name`.
    pub fn register_script_component<S: SchemaSource + ?Sized>(
        &mut self,
        name: &str,
        source: &S,
    ) -> Result<ComponentInfo, EcsError> {
        let definition = source.to_definition()?;
        self.register_component(name, definition)
    }

    /// Whether a component with this name is registered.
    pub fn has_component(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Names of all registered components, sorted.
    pub fn component_names(&self) -> Vec<String> {
        self.registry
            .registered_names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Handle of the component registered under `name`.
    pub fn component_info(&self, name: &str) -> Option<ComponentInfo> {
        self.registry.lookup_by_name(name)
    }

    /// Stored schema for a component handle.
    pub fn component_definition(&self, info: ComponentInfo) -> Option<&ComponentDefinition> {
        self.registry.get_definition(info)
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Allocate a fresh entity identity.
    ///
    /// The identity is not registered; pass it to
    /// [`register_entity`](Self::register_entity) before attaching data.
    pub fn create_entity(&mut self) -> EntityId {
        self.id_generator.generate()
    }

    /// Add `entity` to the set of known entities.
    pub fn register_entity(&mut self, entity: EntityId) -> Result<(), EcsError> {
        if self.components_of_entity.contains_key(&entity) {
            warn!(entity = %entity, "rejected duplicate entity registration");
            return Err(EcsError::EntityAlreadyRegistered { entity });
        }
        self.components_of_entity.insert(entity, BTreeMap::new());
        debug!(entity = %entity, "entity registered");
        Ok(())
    }

    /// Convenience for [`create_entity`](Self::create_entity) followed by
    /// [`register_entity`](Self::register_entity).
    pub fn spawn(&mut self) -> EntityId {
        // Retry on collision with an already registered id.
        loop {
            let entity = self.create_entity();
            if !self.is_entity_registered(entity) {
                self.components_of_entity.insert(entity, BTreeMap::new());
                debug!(entity = %entity, "entity spawned");
                return entity;
            }
        }
    }

    pub fn is_entity_registered(&self, entity: EntityId) -> bool {
        self.components_of_entity.contains_key(&entity)
    }

    /// Number of registered entities.
    pub fn entity_count(&self) -> usize {
        self.components_of_entity.len()
    }

    /// Parse an entity identity from its canonical text encoding.
    pub fn entity_id_from_text(text: &str) -> Result<EntityId, EcsError> {
        EntityId::from_text(text)
    }

    // -- component data -----------------------------------------------------

    /// Attach `data` to `entity` as its `component` instance.
    ///
    /// The whole stored instance is replaced; fields missing from `data` read
    /// as nil afterwards. Fails with [`EcsError::UnknownEntity`],
    /// [`EcsError::UnknownComponent`] or [`EcsError::SchemaViolation`], in
    /// which case nothing is changed.
    pub fn set_component_data(
        &mut self,
        entity: EntityId,
        component: &str,
        data: ComponentData,
    ) -> Result<(), EcsError> {
        if !self.components_of_entity.contains_key(&entity) {
            warn!(entity = %entity, component = %component, "component data rejected: unknown entity");
            return Err(EcsError::UnknownEntity { entity });
        }
        let Some(definition) = self.registry.definition_by_name(component) else {
            warn!(entity = %entity, component = %component, "component data rejected: unknown component");
            return Err(self.unknown_component(component));
        };

        let stored = data
            .conform(component, definition, self.config.widen_int_to_real)
            .inspect_err(|e| {
                warn!(entity = %entity, component = %component, error = %e, "component data rejected");
            })?;

        let Some(components) = self.components_of_entity.get_mut(&entity) else {
            return Err(EcsError::UnknownEntity { entity });
        };
        components.insert(component.to_owned(), stored);
        debug!(entity = %entity, component = %component, "component data set");
        Ok(())
    }

    /// Whether `entity` currently has `component` attached. Unknown entities
    /// and components simply report `false`.
    pub fn is_component_added_to_entity(&self, entity: EntityId, component: &str) -> bool {
        self.components_of_entity
            .get(&entity)
            .is_some_and(|c| c.contains_key(component))
    }

    /// Names of all components attached to `entity`.
    pub fn get_components_of_entity(&self, entity: EntityId) -> Result<BTreeSet<String>, EcsError> {
        self.components_of_entity
            .get(&entity)
            .map(|c| c.keys().cloned().collect())
            .ok_or(EcsError::UnknownEntity { entity })
    }

    /// The stored `component` instance of `entity`.
    pub fn get_component_of_entity(
        &self,
        entity: EntityId,
        component: &str,
    ) -> Result<&ComponentData, EcsError> {
        let components = self
            .components_of_entity
            .get(&entity)
            .ok_or(EcsError::UnknownEntity { entity })?;
        if !self.registry.contains(component) {
            return Err(self.unknown_component(component));
        }
        components
            .get(component)
            .ok_or_else(|| EcsError::ComponentNotInEntity {
                entity,
                component: component.to_owned(),
            })
    }

    /// Every stored instance of `component`, ordered by entity id.
    pub fn get_component_data(
        &self,
        component: &str,
    ) -> Result<Vec<(EntityId, &ComponentData)>, EcsError> {
        if !self.registry.contains(component) {
            return Err(self.unknown_component(component));
        }
        let mut instances: Vec<_> = self
            .components_of_entity
            .iter()
            .filter_map(|(entity, components)| components.get(component).map(|d| (*entity, d)))
            .collect();
        instances.sort_by_key(|(entity, _)| *entity);
        Ok(instances)
    }

    fn unknown_component(&self, name: &str) -> EcsError {
        EcsError::UnknownComponent {
            name: name.to_owned(),
            registered: self.registry.registered_names().join(", "),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{FieldDefinition, ScriptPropertyList};
    use crate::variant::{Value, VariantType};
    use crate::ErrorKind;

    fn seeded_world() -> World {
        World::with_config(WorldConfig {
            id_seed: Some(42),
            ..Default::default()
        })
    }

    fn health() -> ComponentDefinition {
        ComponentDefinition::new()
            .with_field("hp", VariantType::Int)
            .unwrap()
    }

    #[test]
    fn create_entity_does_not_register() {
        let mut world = seeded_world();
        let e = world.create_entity();
        assert!(!world.is_entity_registered(e));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn register_entity_twice_fails() {
        let mut world = seeded_world();
        let e = world.create_entity();
        world.register_entity(e).unwrap();
        let err = world.register_entity(e).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyRegistered);
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn seeded_worlds_create_same_entities() {
        let mut a = seeded_world();
        let mut b = seeded_world();
        assert_eq!(a.create_entity(), b.create_entity());
        assert_eq!(a.spawn(), b.spawn());
    }

    #[test]
    fn register_script_component_forwards_definition() {
        let mut world = seeded_world();
        let mut props = ScriptPropertyList::new();
        props.push("hp", 2);
        let from_script = world.register_script_component("health", &props).unwrap();
        // Same schema registered by hand is idempotent.
        let by_hand = world.register_component("health", health()).unwrap();
        assert_eq!(from_script, by_hand);
        assert_eq!(world.component_definition(by_hand), Some(&health()));
    }

    #[test]
    fn register_script_component_with_unsupported_tag_registers_nothing() {
        let mut world = seeded_world();
        let mut props = ScriptPropertyList::new();
        props.push("hp", 2);
        props.push("position", 5);
        let err = world.register_script_component("health", &props).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(world.component_names().is_empty());
        assert!(!world.has_component("health"));
    }

    #[test]
    fn register_script_component_from_field_slice() {
        let mut world = seeded_world();
        let fields = [
            FieldDefinition::new("x", VariantType::Real),
            FieldDefinition::new("y", VariantType::Real),
        ];
        let info = world.register_script_component("position", &fields[..]).unwrap();
        let def = world.component_definition(info).unwrap();
        assert_eq!(def.fields(), &fields[..]);
    }

    #[test]
    fn component_queries() {
        let mut world = seeded_world();
        assert!(!world.has_component("health"));
        let info = world.register_component("health", health()).unwrap();
        assert!(world.has_component("health"));
        assert_eq!(world.component_info("health"), Some(info));
        assert_eq!(world.component_names(), vec!["health".to_owned()]);
    }

    #[test]
    fn get_component_of_entity_errors() {
        let mut world = seeded_world();
        world.register_component("health", health()).unwrap();
        let e = world.spawn();
        let stranger = world.create_entity();

        assert_eq!(
            world.get_component_of_entity(stranger, "health").unwrap_err().kind(),
            ErrorKind::UnknownEntity
        );
        assert_eq!(
            world.get_component_of_entity(e, "mana").unwrap_err().kind(),
            ErrorKind::UnknownComponent
        );
        assert_eq!(
            world.get_component_of_entity(e, "health").unwrap_err().kind(),
            ErrorKind::NotFound
        );

        world
            .set_component_data(e, "health", ComponentData::new().with_field("hp", 10))
            .unwrap();
        assert_eq!(
            world.get_component_of_entity(e, "health").unwrap().get_field("hp"),
            &Value::Int(10)
        );
    }

    #[test]
    fn get_component_data_lists_all_instances() {
        let mut world = seeded_world();
        world.register_component("health", health()).unwrap();
        let mut entities: Vec<EntityId> = (0..5).map(|_| world.spawn()).collect();
        for (i, e) in entities.iter().enumerate() {
            let data = ComponentData::new().with_field("hp", i as i64);
            world.set_component_data(*e, "health", data).unwrap();
        }
        // One entity without the component.
        world.spawn();

        let all = world.get_component_data("health").unwrap();
        assert_eq!(all.len(), 5);
        entities.sort();
        let ids: Vec<EntityId> = all.iter().map(|(e, _)| *e).collect();
        assert_eq!(ids, entities);

        assert_eq!(
            world.get_component_data("mana").unwrap_err().kind(),
            ErrorKind::UnknownComponent
        );
    }

    #[test]
    fn unknown_component_lists_registered_names() {
        let mut world = seeded_world();
        world.register_component("health", health()).unwrap();
        world
            .register_component("tag", ComponentDefinition::new())
            .unwrap();
        let e = world.spawn();
        let err = world
            .set_component_data(e, "mana", ComponentData::new())
            .unwrap_err();
        match err {
            EcsError::UnknownComponent { name, registered } => {
                assert_eq!(name, "mana");
                assert_eq!(registered, "health, tag");
            }
            other => panic!("expected UnknownComponent, got {other:?}"),
        }
    }

    #[test]
    fn empty_component_attaches() {
        let mut world = seeded_world();
        world
            .register_component("tag", ComponentDefinition::new())
            .unwrap();
        let e = world.spawn();
        world.set_component_data(e, "tag", ComponentData::new()).unwrap();
        assert!(world.is_component_added_to_entity(e, "tag"));
    }

    #[test]
    fn config_loads_from_json() {
        let config: WorldConfig =
            serde_json::from_str(r#"{ "id_seed": 9, "widen_int_to_real": false }"#).unwrap();
        assert_eq!(config.id_seed, Some(9));
        assert!(!config.widen_int_to_real);

        let partial: WorldConfig = serde_json::from_str(r#"{ "id_seed": 1 }"#).unwrap();
        assert!(partial.widen_int_to_real);
    }

    #[test]
    fn widening_follows_config() {
        let position = ComponentDefinition::new()
            .with_field("x", VariantType::Real)
            .unwrap();

        let mut strict = World::with_config(WorldConfig {
            id_seed: Some(1),
            widen_int_to_real: false,
        });
        strict.register_component("position", position.clone()).unwrap();
        let e = strict.spawn();
        let err = strict
            .set_component_data(e, "position", ComponentData::new().with_field("x", 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaViolation);

        let mut lenient = seeded_world();
        lenient.register_component("position", position).unwrap();
        let e = lenient.spawn();
        lenient
            .set_component_data(e, "position", ComponentData::new().with_field("x", 1))
            .unwrap();
        assert_eq!(
            lenient.get_component_of_entity(e, "position").unwrap().get_field("x"),
            &Value::Real(1.0)
        );
    }
}
