//! GCS Core -- embeddable Entity Component System store with runtime schemas.
//!
//! This crate provides the storage half of an ECS for a host engine. The host
//! registers component schemas at runtime, creates entities, and attaches
//! dynamically-typed field values that are checked against the registered
//! schema on every write. There are no systems or bulk queries here; the host
//! drives its own update loop and uses point lookups.
//!
//! # Quick Start
//!
//! ```
//! use gcs_core::prelude::*;
//!
//! let mut world = World::new();
//!
//! let mut position = ComponentDefinition::new();
//! position.add_field("x", VariantType::Real)?;
//! position.add_field("y", VariantType::Real)?;
//! world.register_component("position", position)?;
//!
//! let entity = world.create_entity();
//! world.register_entity(entity)?;
//!
//! let data = ComponentData::new().with_field("x", 1.0).with_field("y", 2.0);
//! world.set_component_data(entity, "position", data)?;
//!
//! assert!(world.is_component_added_to_entity(entity, "position"));
//! assert_eq!(World::entity_id_from_text(&entity.to_text())?, entity);
//! # Ok::<(), gcs_core::EcsError>(())
//! ```

#![deny(unsafe_code)]

pub mod data;
pub mod definition;
pub mod entity;
pub mod registry;
pub mod shared;
pub mod variant;
pub mod world;

use variant::VariantType;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
///
/// Every failed operation leaves the world unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EcsError {
    /// A component name is already bound to a different schema.
    #[error("component '{name}' is already registered with a different schema")]
    ComponentAlreadyRegistered { name: String },

    /// The entity is already known to the world.
    #[error("entity {entity} is already registered")]
    EntityAlreadyRegistered { entity: entity::EntityId },

    /// The entity was never registered with the world.
    #[error("entity {entity} is not registered")]
    UnknownEntity { entity: entity::EntityId },

    /// A component name was referenced that has not been registered.
    #[error("component '{name}' not registered. Registered components: [{registered}]")]
    UnknownComponent { name: String, registered: String },

    /// The entity is registered but does not carry the component.
    #[error("entity {entity} does not have component '{component}'")]
    ComponentNotInEntity {
        entity: entity::EntityId,
        component: String,
    },

    /// Component data or a schema does not conform.
    #[error("component '{component}', field '{field}': {violation}")]
    SchemaViolation {
        component: String,
        field: String,
        violation: Violation,
    },

    /// Malformed entity identity text.
    #[error("invalid entity id '{input}': {details}")]
    InvalidFormat { input: String, details: String },

    /// A value could not be converted to the requested type.
    #[error("cannot convert {found} to {expected}")]
    TypeMismatch {
        expected: VariantType,
        found: VariantType,
    },

    /// A host value or type tag outside the supported set.
    #[error("unsupported value type: {tag}")]
    UnsupportedType { tag: String },

    /// Two different component registrations hashed to the same handle.
    #[error("component '{name}' hashes to the handle already held by '{owner}'")]
    HandleCollision { name: String, owner: String },

    /// A component or field name was empty.
    #[error("{what} name must not be empty")]
    EmptyName { what: &'static str },
}

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("field is not declared in the schema")]
    UnknownField,
    #[error("field is declared more than once")]
    DuplicateField,
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: VariantType,
        found: VariantType,
    },
}

/// Coarse classification of an [`EcsError`], for hosts that map errors onto
/// their own diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyRegistered,
    UnknownEntity,
    UnknownComponent,
    NotFound,
    SchemaViolation,
    InvalidFormat,
    TypeMismatch,
    InvalidName,
}

impl EcsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EcsError::ComponentAlreadyRegistered { .. }
            | EcsError::EntityAlreadyRegistered { .. }
            | EcsError::HandleCollision { .. } => ErrorKind::AlreadyRegistered,
            EcsError::UnknownEntity { .. } => ErrorKind::UnknownEntity,
            EcsError::UnknownComponent { .. } => ErrorKind::UnknownComponent,
            EcsError::ComponentNotInEntity { .. } => ErrorKind::NotFound,
            EcsError::SchemaViolation { .. } => ErrorKind::SchemaViolation,
            EcsError::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            EcsError::TypeMismatch { .. } | EcsError::UnsupportedType { .. } => {
                ErrorKind::TypeMismatch
            }
            EcsError::EmptyName { .. } => ErrorKind::InvalidName,
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::data::ComponentData;
    pub use crate::definition::{
        ComponentDefinition, FieldDefinition, SchemaSource, ScriptProperty, ScriptPropertyList,
    };
    pub use crate::entity::{EntityId, EntityIdGenerator};
    pub use crate::registry::{ComponentInfo, ComponentRegistry};
    pub use crate::shared::SharedWorld;
    pub use crate::variant::{Value, Variant, VariantType};
    pub use crate::world::{World, WorldConfig};
    pub use crate::{EcsError, ErrorKind, Violation};
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
